//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.termline/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::playback::{ScriptEntry, script_from_parallel};
use crate::core::state::Mode;
use crate::transport::{EventStreamConfig, StreamMethod};

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct TermlineConfig {
    #[serde(default)]
    pub terminal: TerminalSection,
    #[serde(default)]
    pub socket: SocketSection,
    #[serde(default)]
    pub event_stream: EventStreamSection,
    #[serde(default)]
    pub callback: CallbackSection,
    #[serde(default)]
    pub playback: PlaybackSection,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct TerminalSection {
    pub mode: Option<Mode>,
    pub initial_content: Option<String>,
    pub typing_delay_ms: Option<u64>,
    pub command_delay_ms: Option<u64>,
    pub websocket_delay_ms: Option<u64>,
    pub theme: Option<Theme>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SocketSection {
    pub url: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct EventStreamSection {
    pub url: Option<String>,
    pub method: Option<StreamMethod>,
    pub command_param: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CallbackSection {
    pub shell: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct PlaybackSection {
    #[serde(default)]
    pub initial_commands: Vec<String>,
    /// TOML has no null: commands beyond the end of this list run for real.
    #[serde(default)]
    pub initial_returns: Vec<String>,
    /// Explicit entries, played after the parallel lists.
    #[serde(default)]
    pub steps: Vec<ScriptEntry>,
}

/// Presentation only: colors and frame of the TUI host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Standard,
    Material,
    Desktop,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_TYPING_DELAY_MS: u64 = 100;
pub const DEFAULT_COMMAND_DELAY_MS: u64 = 500;
pub const DEFAULT_WEBSOCKET_DELAY_MS: u64 = 0;
pub const DEFAULT_SOCKET_URL: &str = "ws://localhost:12345/ws";
pub const DEFAULT_EVENT_STREAM_URL: &str = "http://localhost:12345/events";
pub const DEFAULT_COMMAND_PARAM: &str = "command";
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";
pub const DEFAULT_SHELL: &str = "sh";

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub mode: Mode,
    pub initial_content: String,
    pub typing_delay: Duration,
    pub command_delay: Duration,
    pub websocket_delay: Duration,
    pub theme: Theme,
    pub socket_url: String,
    pub event_stream: EventStreamConfig,
    pub shell: String,
    pub script: Vec<ScriptEntry>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        resolve(&TermlineConfig::default(), &CliOverrides::default())
    }
}

/// Values given on the command line. `None` = not specified.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub mode: Option<Mode>,
    /// Endpoint for the active mode (socket or event-stream URL).
    pub url: Option<String>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.termline/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".termline").join("config.toml"))
}

/// Load config from `~/.termline/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `TermlineConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<TermlineConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(TermlineConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(TermlineConfig::default());
    }

    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<TermlineConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: TermlineConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r#"# Termline Configuration
# All settings are optional; defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [terminal]
# mode = "standard"                  # "standard", "controlled", "socket", "event-stream"
# initial_content = "Welcome!"
# typing_delay_ms = 100              # per typed character during playback
# command_delay_ms = 500             # pause between scripted commands
# websocket_delay_ms = 0             # wait before opening the socket
# theme = "standard"                 # "standard", "material", "desktop"

# [socket]
# url = "ws://localhost:12345/ws"    # Or set TERMLINE_SOCKET_URL env var

# [event_stream]
# url = "http://localhost:12345/events"   # Or set TERMLINE_EVENT_STREAM_URL
# method = "get"                     # "get" or "post"
# command_param = "command"
# content_type = "application/json"  # POST body: JSON, or form for anything else

# [callback]
# shell = "sh"                       # controlled mode runs `<shell> -c <command>`

# [playback]
# initial_commands = ["whoami", "uname -a"]
# initial_returns = ["guest"]        # missing returns run the command for real

# [[playback.steps]]
# command = "echo hi"
# result = "hi"
"#;

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &TermlineConfig, cli: &CliOverrides) -> ResolvedConfig {
    // Mode: CLI → env → config → default
    let mode = cli
        .mode
        .or_else(|| std::env::var("TERMLINE_MODE").ok().and_then(|m| parse_mode(&m)))
        .or(config.terminal.mode)
        .unwrap_or_default();

    // CLI --url targets whichever endpoint the mode uses
    let cli_socket_url = cli.url.clone().filter(|_| mode == Mode::Socket);
    let cli_stream_url = cli.url.clone().filter(|_| mode == Mode::EventStream);

    // Socket URL: CLI → env → config → default
    let socket_url = cli_socket_url
        .or_else(|| std::env::var("TERMLINE_SOCKET_URL").ok())
        .or_else(|| config.socket.url.clone())
        .unwrap_or_else(|| DEFAULT_SOCKET_URL.to_string());

    // Event stream URL: CLI → env → config → default
    let event_stream_url = cli_stream_url
        .or_else(|| std::env::var("TERMLINE_EVENT_STREAM_URL").ok())
        .or_else(|| config.event_stream.url.clone())
        .unwrap_or_else(|| DEFAULT_EVENT_STREAM_URL.to_string());

    let returns: Vec<Option<String>> = config
        .playback
        .initial_returns
        .iter()
        .cloned()
        .map(Some)
        .collect();
    let mut script = script_from_parallel(&config.playback.initial_commands, &returns);
    script.extend(config.playback.steps.iter().cloned());

    let terminal = &config.terminal;
    ResolvedConfig {
        mode,
        initial_content: terminal.initial_content.clone().unwrap_or_default(),
        typing_delay: Duration::from_millis(
            terminal.typing_delay_ms.unwrap_or(DEFAULT_TYPING_DELAY_MS),
        ),
        command_delay: Duration::from_millis(
            terminal.command_delay_ms.unwrap_or(DEFAULT_COMMAND_DELAY_MS),
        ),
        websocket_delay: Duration::from_millis(
            terminal
                .websocket_delay_ms
                .unwrap_or(DEFAULT_WEBSOCKET_DELAY_MS),
        ),
        theme: terminal.theme.unwrap_or_default(),
        socket_url,
        event_stream: EventStreamConfig {
            url: event_stream_url,
            method: config.event_stream.method.unwrap_or_default(),
            command_param: config
                .event_stream
                .command_param
                .clone()
                .unwrap_or_else(|| DEFAULT_COMMAND_PARAM.to_string()),
            content_type: config
                .event_stream
                .content_type
                .clone()
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
        },
        shell: config
            .callback
            .shell
            .clone()
            .unwrap_or_else(|| DEFAULT_SHELL.to_string()),
        script,
    }
}

fn parse_mode(value: &str) -> Option<Mode> {
    use clap::ValueEnum;
    match Mode::from_str(value, true) {
        Ok(mode) => Some(mode),
        Err(_) => {
            warn!("Ignoring unknown TERMLINE_MODE {:?}", value);
            None
        }
    }
}
