//! NovaBridge binary.
//!
//! Runs a headless editor behind the NovaBridge control API and live
//! viewport stream until Ctrl-C.
//!
//! # Startup Sequence
//!
//! 1. Parse flags and initialize structured logging (tracing)
//! 2. Resolve configuration: flags, `NOVABRIDGE_*` environment, YAML file
//! 3. Build the in-memory editor rooted at the project directory
//! 4. Bind both listeners and start the editor thread
//! 5. Wait for Ctrl-C, then shut down in order

mod cli;
mod error;

use clap::Parser;
use novabridge_core::BridgeConfig;
use novabridge_host::MemoryEditor;
use novabridge_server::Bridge;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::error::BridgeError;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, startup, or shutdown fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.log_json);
    info!("novabridge starting");
    run(&cli).await?;
    Ok(())
}

fn init_logging(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

async fn run(cli: &Cli) -> Result<(), BridgeError> {
    let config = BridgeConfig::from_env(&cli.overrides())?;
    info!(
        host = config.host,
        port = config.port,
        stream_port = config.stream_port,
        auth = config.api_key.is_some(),
        project_dir = %config.project_dir.display(),
        config_file = ?config.config_file,
        "configuration loaded"
    );

    let editor = MemoryEditor::new(&config.project_dir);
    let editor = if cli.no_procedural {
        info!("procedural generation disabled");
        editor.without_procedural()
    } else {
        editor
    };

    let bridge = Bridge::start(&config, Box::new(editor)).await?;
    info!(
        http = %bridge.http_addr(),
        stream = %bridge.stream_addr(),
        "NovaBridge ready, press Ctrl-C to stop"
    );

    let signal = tokio::signal::ctrl_c().await;
    info!("shutdown requested");
    bridge.shutdown().await?;
    signal.map_err(|e| BridgeError::Signal {
        message: e.to_string(),
    })?;

    info!("novabridge shutdown complete");
    Ok(())
}
