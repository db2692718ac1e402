//! Startup helpers for the pantry agent server.

use std::process::ExitCode;

use crate::common::config::{AppConfig, LlmProvider};
use crate::server::{self, AppState};

/// Initialize tracing with an env filter defaulting to `info`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .try_init();
}

/// Run the server until Ctrl+C.
///
/// # Returns
/// `ExitCode::SUCCESS` on graceful shutdown, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    init_tracing();

    tracing::info!("Starting pantry agent v{}", env!("CARGO_PKG_VERSION"));

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {e}");
            return ExitCode::from(1);
        }
    };
    log_settings(&config);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    let result = rt.block_on(async {
        let state = AppState::new(&config)
            .await
            .map_err(|e| format!("Failed to create state: {e}"))?;
        server::serve(state, config.server.port, shutdown_signal())
            .await
            .map_err(|e| format!("Server error: {e}"))
    });

    if let Err(e) = result {
        tracing::error!("{e}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

fn log_settings(config: &AppConfig) {
    tracing::info!("Application name: {}", config.app_name);
    tracing::info!("Database: {}", config.storage.sqlite_path.display());
    match config.llm.provider {
        LlmProvider::Ollama => {
            let endpoint = config
                .llm
                .base_url
                .as_deref()
                .unwrap_or("http://localhost:11434");
            tracing::info!("Ollama endpoint: {endpoint}");
            tracing::info!("Model: {}", config.llm.model);
            tracing::info!("Temperature: {}", config.llm.temperature);
        }
        LlmProvider::Scripted => tracing::info!("Using scripted replies"),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
