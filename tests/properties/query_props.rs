use proptest::prelude::*;

use jobdex::JobdexError;
use jobdex::query::Query;
use jobdex::query::parse::MAX_CRITERIA;

proptest! {
    #[test]
    fn test_parse_never_panics(raw in ".{0,200}") {
        match Query::parse(&raw) {
            Ok(query) => {
                prop_assert!(!query.is_empty());
                prop_assert!(query.len() <= MAX_CRITERIA);
                for criterion in query.criteria() {
                    prop_assert!(!criterion.term.is_empty());
                    prop_assert!(!criterion.term.contains(';'));
                    prop_assert_eq!(criterion.term.trim(), criterion.term.as_str());
                }
            }
            Err(err) => prop_assert!(matches!(err, JobdexError::EmptyQuery)),
        }
    }

    #[test]
    fn test_parse_keeps_first_terms(terms in prop::collection::vec("[A-Za-z][A-Za-z0-9+#]{0,8}", 1..6)) {
        let query = Query::parse(&terms.join(" ; ")).unwrap();
        let parsed: Vec<&str> = query.criteria().iter().map(|c| c.term.as_str()).collect();
        let expected: Vec<&str> = terms.iter().take(MAX_CRITERIA).map(String::as_str).collect();
        prop_assert_eq!(parsed, expected);
    }
}
