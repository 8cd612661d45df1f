//! Command-line flags.
//!
//! Flags only override; environment variables and the YAML file are
//! layered underneath by [`BridgeConfig::from_env`](novabridge_core::BridgeConfig::from_env).

use std::path::PathBuf;

use clap::Parser;
use novabridge_core::config::CliOverrides;

/// Headless editor bridge: HTTP control API plus a live JPEG stream.
#[derive(Debug, Parser)]
#[command(name = "novabridge", version, about)]
pub struct Cli {
    /// HTTP control port.
    #[arg(long)]
    pub port: Option<u16>,

    /// WebSocket stream port.
    #[arg(long)]
    pub stream_port: Option<u16>,

    /// Required API key. Empty disables authentication.
    #[arg(long)]
    pub api_key: Option<String>,

    /// Bind address for both listeners.
    #[arg(long)]
    pub host: Option<String>,

    /// YAML configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Project directory of the headless editor.
    #[arg(long)]
    pub project_dir: Option<PathBuf>,

    /// Run without the procedural generation subsystem (`/nova/pcg/*`
    /// answers 501).
    #[arg(long)]
    pub no_procedural: bool,

    /// Emit logs as JSON lines.
    #[arg(long)]
    pub log_json: bool,
}

impl Cli {
    /// The layer of configuration that came from flags.
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            port: self.port,
            stream_port: self.stream_port,
            api_key: self.api_key.clone(),
            host: self.host.clone(),
            config: self.config.clone(),
            project_dir: self.project_dir.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn no_flags_override_nothing() {
        let cli = Cli::try_parse_from(["novabridge"]).unwrap();
        assert_eq!(cli.overrides(), CliOverrides::default());
        assert!(!cli.no_procedural);
    }

    #[test]
    fn flags_map_onto_overrides() {
        let cli = Cli::try_parse_from([
            "novabridge",
            "--port",
            "8080",
            "--stream-port",
            "8081",
            "--api-key",
            "secret",
            "--project-dir",
            "/tmp/Demo",
            "--no-procedural",
        ])
        .unwrap();
        let overrides = cli.overrides();
        assert_eq!(overrides.port, Some(8080));
        assert_eq!(overrides.stream_port, Some(8081));
        assert_eq!(overrides.api_key.as_deref(), Some("secret"));
        assert_eq!(overrides.project_dir, Some(PathBuf::from("/tmp/Demo")));
        assert!(cli.no_procedural);
    }

    #[test]
    fn out_of_range_port_is_rejected() {
        assert!(Cli::try_parse_from(["novabridge", "--port", "70000"]).is_err());
    }
}
