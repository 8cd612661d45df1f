//! Startup configuration for the NovaBridge control plane.
//!
//! Every setting is resolved once, at startup, from four layers in
//! priority order:
//!
//! 1. Command-line flags ([`CliOverrides`])
//! 2. Environment variables (`NOVABRIDGE_*`)
//! 3. An optional YAML file (`novabridge.yaml`, or the path given by
//!    `--config` / `NOVABRIDGE_CONFIG`)
//! 4. Built-in defaults
//!
//! An empty API key from any layer is ignored; when no layer supplies a
//! non-empty key, authentication is disabled.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

/// Default HTTP control port.
pub const DEFAULT_PORT: u16 = 30010;
/// Default WebSocket stream port.
pub const DEFAULT_STREAM_PORT: u16 = 30011;
/// Default bind address.
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Config file picked up from the working directory when present.
pub const DEFAULT_CONFIG_FILE: &str = "novabridge.yaml";

const ENV_PORT: &str = "NOVABRIDGE_PORT";
const ENV_STREAM_PORT: &str = "NOVABRIDGE_STREAM_PORT";
const ENV_API_KEY: &str = "NOVABRIDGE_API_KEY";
const ENV_HOST: &str = "NOVABRIDGE_HOST";
const ENV_CONFIG: &str = "NOVABRIDGE_CONFIG";
const ENV_PROJECT_DIR: &str = "NOVABRIDGE_PROJECT_DIR";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Values supplied on the command line. `None` means "not given".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrides {
    /// `--port`.
    pub port: Option<u16>,
    /// `--stream-port`.
    pub stream_port: Option<u16>,
    /// `--api-key`.
    pub api_key: Option<String>,
    /// `--host`.
    pub host: Option<String>,
    /// `--config`.
    pub config: Option<PathBuf>,
    /// `--project-dir`.
    pub project_dir: Option<PathBuf>,
}

/// Listener settings as they appear in the YAML file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ServerSection {
    /// Bind address.
    #[serde(default)]
    pub host: Option<String>,
    /// HTTP port.
    #[serde(default)]
    pub port: Option<u16>,
    /// Stream port.
    #[serde(default)]
    pub stream_port: Option<u16>,
    /// API key.
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Offscreen viewport capture defaults.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct CaptureDefaults {
    /// Initial capture width in pixels.
    #[serde(default = "default_capture_width")]
    pub width: u32,
    /// Initial capture height in pixels.
    #[serde(default = "default_capture_height")]
    pub height: u32,
    /// Initial horizontal field of view in degrees.
    #[serde(default = "default_capture_fov")]
    pub fov: f64,
}

impl Default for CaptureDefaults {
    fn default() -> Self {
        Self {
            width: default_capture_width(),
            height: default_capture_height(),
            fov: default_capture_fov(),
        }
    }
}

/// Live stream defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct StreamDefaults {
    /// Frames per second.
    #[serde(default = "default_stream_fps")]
    pub fps: u32,
    /// Frame width in pixels.
    #[serde(default = "default_stream_width")]
    pub width: u32,
    /// Frame height in pixels.
    #[serde(default = "default_stream_height")]
    pub height: u32,
    /// JPEG quality.
    #[serde(default = "default_stream_quality")]
    pub quality: u8,
}

impl Default for StreamDefaults {
    fn default() -> Self {
        Self {
            fps: default_stream_fps(),
            width: default_stream_width(),
            height: default_stream_height(),
            quality: default_stream_quality(),
        }
    }
}

/// Spawn rate-limit settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LimitsConfig {
    /// Spawns allowed per window.
    #[serde(default = "default_spawn_per_window")]
    pub spawn_per_window: u32,
    /// Window length in seconds.
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            spawn_per_window: default_spawn_per_window(),
            window_seconds: default_window_seconds(),
        }
    }
}

/// Contents of `novabridge.yaml`. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FileConfig {
    /// Listener settings.
    #[serde(default)]
    pub server: ServerSection,
    /// Project directory for the headless host.
    #[serde(default)]
    pub project_dir: Option<PathBuf>,
    /// Viewport capture defaults.
    #[serde(default)]
    pub capture: CaptureDefaults,
    /// Stream defaults.
    #[serde(default)]
    pub stream: StreamDefaults,
    /// Rate limits.
    #[serde(default)]
    pub limits: LimitsConfig,
}

impl FileConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }
}

/// Fully resolved runtime configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeConfig {
    /// Bind address for both listeners.
    pub host: String,
    /// HTTP control port.
    pub port: u16,
    /// WebSocket stream port.
    pub stream_port: u16,
    /// Required API key; `None` disables authentication.
    pub api_key: Option<String>,
    /// Project directory of the headless host.
    pub project_dir: PathBuf,
    /// YAML file the settings were read from, if any.
    pub config_file: Option<PathBuf>,
    /// Viewport capture defaults.
    pub capture: CaptureDefaults,
    /// Stream defaults.
    pub stream: StreamDefaults,
    /// Rate limits.
    pub limits: LimitsConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            stream_port: DEFAULT_STREAM_PORT,
            api_key: None,
            project_dir: PathBuf::from("."),
            config_file: None,
            capture: CaptureDefaults::default(),
            stream: StreamDefaults::default(),
            limits: LimitsConfig::default(),
        }
    }
}

impl BridgeConfig {
    /// Resolve configuration against the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when an explicitly named config file cannot
    /// be read or parsed.
    pub fn from_env(cli: &CliOverrides) -> Result<Self, ConfigError> {
        Self::resolve(cli, |key| std::env::var(key).ok())
    }

    /// Resolve configuration with an injectable environment lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when an explicitly named config file cannot
    /// be read or parsed.
    pub fn resolve<F>(cli: &CliOverrides, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let explicit = cli
            .config
            .clone()
            .or_else(|| env(ENV_CONFIG).filter(|v| !v.trim().is_empty()).map(PathBuf::from));
        let (file, config_file) = match explicit {
            Some(path) => (FileConfig::from_file(&path)?, Some(path)),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    (FileConfig::from_file(&fallback)?, Some(fallback))
                } else {
                    (FileConfig::default(), None)
                }
            }
        };

        let port = pick_port(
            "port",
            cli.port,
            env_port(&env, ENV_PORT),
            file.server.port,
            DEFAULT_PORT,
        );
        let stream_port = pick_port(
            "stream_port",
            cli.stream_port,
            env_port(&env, ENV_STREAM_PORT),
            file.server.stream_port,
            DEFAULT_STREAM_PORT,
        );

        let api_key = [cli.api_key.clone(), env(ENV_API_KEY), file.server.api_key.clone()]
            .into_iter()
            .flatten()
            .map(|key| key.trim().to_owned())
            .find(|key| !key.is_empty());

        let host = [cli.host.clone(), env(ENV_HOST), file.server.host.clone()]
            .into_iter()
            .flatten()
            .find(|h| !h.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_owned());

        let project_dir = cli
            .project_dir
            .clone()
            .or_else(|| env(ENV_PROJECT_DIR).filter(|v| !v.is_empty()).map(PathBuf::from))
            .or(file.project_dir)
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

        Ok(Self {
            host,
            port,
            stream_port,
            api_key,
            project_dir,
            config_file,
            capture: file.capture,
            stream: file.stream,
            limits: file.limits,
        })
    }

    /// Whether requests must present the API key.
    pub const fn auth_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    /// `host:port` of the HTTP listener.
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// `host:port` of the stream listener.
    pub fn stream_addr(&self) -> String {
        format!("{}:{}", self.host, self.stream_port)
    }
}

fn env_port<F>(env: &F, key: &str) -> Option<u16>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = env(key)?;
    match raw.trim().parse::<u16>() {
        Ok(port) => Some(port),
        Err(_) => {
            warn!(variable = key, value = raw, "ignoring unparseable port");
            None
        }
    }
}

fn pick_port(
    name: &str,
    cli: Option<u16>,
    env: Option<u16>,
    file: Option<u16>,
    default: u16,
) -> u16 {
    match cli.or(env).or(file) {
        Some(0) => {
            warn!(setting = name, fallback = default, "port 0 is not allowed, using default");
            default
        }
        Some(port) => port,
        None => default,
    }
}

const fn default_capture_width() -> u32 {
    1280
}

const fn default_capture_height() -> u32 {
    720
}

const fn default_capture_fov() -> f64 {
    90.0
}

const fn default_stream_fps() -> u32 {
    10
}

const fn default_stream_width() -> u32 {
    640
}

const fn default_stream_height() -> u32 {
    360
}

const fn default_stream_quality() -> u8 {
    50
}

const fn default_spawn_per_window() -> u32 {
    100
}

const fn default_window_seconds() -> u64 {
    60
}
