//! Entry point for the `cartoon` binary.

use cartoon_lib::{app, config, errors};

fn main() {
    // Initialize tracing; stdout is reserved for the report.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    // Parse CLI args and run
    let config = config::AppConfig::parse();
    let code = match app::run(&config) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            errors::exit_code(&err)
        }
    };
    std::process::exit(code);
}
