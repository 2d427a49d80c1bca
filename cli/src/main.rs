//! masterless - stage puppet code on a host and converge it with `puppet apply`

use clap::Parser;
use tracing_subscriber::EnvFilter;

use masterless_cli::cli::Cli;
use masterless_cli::commands::{already_reported, error_code, exit_code};
use masterless_cli::output::json;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_level());

    let json_mode = cli.json;
    if let Err(e) = cli.run().await {
        let code = exit_code(&e);
        tracing::debug!(error = ?e, code, "command failed");
        if json_mode && already_reported(&e) {
            std::process::exit(code);
        }
        match json::format_error(&format!("{e:#}"), error_code(&e)) {
            Ok(body) if json_mode => println!("{body}"),
            _ => eprintln!("Error: {e:#}"),
        }
        std::process::exit(code);
    }
}

/// Diagnostics go to stderr so they never mix with streamed remote output.
/// `RUST_LOG` takes precedence over `-v`.
fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("masterless_cli={default_level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
