//! tapelease — pooled tape evaluation over a grid.

use std::process::ExitCode;

use tapelease_lib::{app, config, errors};

fn main() -> ExitCode {
    let config = config::AppConfig::parse();

    // Initialize tracing
    let level = if config.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match app::run(&config) {
        Ok(()) => ExitCode::from(errors::exit_codes::SUCCESS),
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(errors::exit_code(&err))
        }
    }
}
