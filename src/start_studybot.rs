//! Startup helpers for the study assistant chat client.

use std::process::ExitCode;

use crate::client::ChatClient;
use crate::config::ClientConfig;
use crate::shell;

/// Run the terminal chat client (used by the `studybot` binary).
///
/// # Returns
/// `ExitCode::SUCCESS` when the user quits, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting studybot client v{}", env!("CARGO_PKG_VERSION"));

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {e}");
            return ExitCode::from(1);
        }
    };
    tracing::info!("Assistant API: {}", config.api_base_url);

    let client = match ChatClient::new(config) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("Failed to create client: {e}");
            return ExitCode::from(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = rt.block_on(shell::run(client)) {
        tracing::error!("Shell error: {e}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}
