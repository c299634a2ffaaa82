//! jobdex - skill index builder, query engine and client.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use jobdex::app::AppContext;
use jobdex::cli::Cli;
use jobdex::cli::commands;
use jobdex::cli::output::{emit_json, robot_error};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    let outcome =
        AppContext::from_cli(&cli).and_then(|ctx| commands::run(&ctx, &cli.command));
    let Err(err) = outcome else {
        return ExitCode::SUCCESS;
    };

    if !cli.robot {
        eprintln!("Error: {err}");
    } else if emit_json(&robot_error(&err)).is_err() {
        println!(r#"{{"status":{{"error":{{"code":"{}"}}}}}}"#, err.code());
    }
    ExitCode::FAILURE
}

/// Default filter for each `-v` count; `RUST_LOG` wins when set.
const fn verbosity_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn,jobdex=info",
        1 => "info,jobdex=debug",
        2 => "debug,jobdex=trace",
        _ => "trace",
    }
}

fn init_tracing(cli: &Cli) {
    if cli.quiet {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity_directive(cli.verbose)));
    let json = cli
        .robot
        .then(|| fmt::layer().json().with_writer(std::io::stderr));
    let text = (!cli.robot).then(|| fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(text)
        .init();
}
