//! Shared test utilities for jobdex.

use std::fmt::Debug;

pub mod fixtures;

/// One row of a table-driven test.
#[derive(Debug, Clone)]
pub struct TestCase<I, E> {
    pub name: &'static str,
    pub input: I,
    pub expected: E,
}

impl<I, E> TestCase<I, E> {
    pub const fn new(name: &'static str, input: I, expected: E) -> Self {
        Self {
            name,
            input,
            expected,
        }
    }
}

/// Run every case through `check` and report all mismatches at once.
pub fn run_table_tests<I, E, F>(cases: Vec<TestCase<I, E>>, check: F) -> Result<(), String>
where
    I: Debug,
    E: Debug + PartialEq,
    F: Fn(I) -> E,
{
    let total = cases.len();
    let mut failures = Vec::new();
    for case in cases {
        let label = format!("{} ({:?})", case.name, case.input);
        let actual = check(case.input);
        if actual == case.expected {
            println!("[TABLE] ok   {label}");
        } else {
            println!("[TABLE] FAIL {label}");
            failures.push(format!(
                "{label}: expected {:?}, got {actual:?}",
                case.expected
            ));
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(format!(
            "{} of {total} cases failed:\n{}",
            failures.len(),
            failures.join("\n")
        ))
    }
}
