use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

/// Terminal host for the shop assistant widget.
///
/// Stdout is the chat surface; logs go to stderr, filtered by `RUST_LOG`
/// (default `info`).
#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match colorchat::app::load_settings() {
        Ok(settings) => colorchat::app::run_terminal(&settings).await,
        Err(error) => Err(error),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(error = %error, "chat widget stopped");
            ExitCode::FAILURE
        }
    }
}
