//! Configuration shared by the sender and receiver binaries.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::TttError;
use crate::header::PROTOCOL_VERSION;
use crate::mac::MacAddr;
use crate::network::filter::CaptureFilter;
use crate::packet::DEFAULT_ETHER_TYPE;
use crate::session::{InitiatorConfig, ObserverConfig};

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TttConfig {
    /// Link-layer settings.
    pub link: LinkConfig,
    /// Sender-side settings.
    pub initiator: InitiatorSection,
    /// Receiver-side settings.
    pub observer: ObserverSection,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Link-layer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Network interface to open.
    pub interface: String,
    /// Hardware address of the game peer.
    pub peer: MacAddr,
    /// EtherType of game frames.
    pub ether_type: u16,
    /// Version byte written into requests.
    pub version: u8,
}

/// Sender configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitiatorSection {
    /// Reply deadline in milliseconds.
    pub reply_timeout_ms: u64,
    /// Tag requests with a round counter.
    pub tag_rounds: bool,
}

/// Receiver configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObserverSection {
    /// Capture filter expression, e.g. `ether dst 00:04:00:00:00:00`.
    /// When unset, frames addressed to `link.peer` are captured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    /// Frames to capture per poll.
    pub capture_count: usize,
    /// Capture window in milliseconds.
    pub capture_window_ms: u64,
    /// Pause between polls in milliseconds.
    pub poll_interval_ms: u64,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            interface: "eth0".into(),
            peer: MacAddr::PEER,
            ether_type: DEFAULT_ETHER_TYPE,
            version: PROTOCOL_VERSION,
        }
    }
}

impl Default for InitiatorSection {
    fn default() -> Self {
        Self {
            reply_timeout_ms: 1000,
            tag_rounds: true,
        }
    }
}

impl Default for ObserverSection {
    fn default() -> Self {
        Self {
            filter: None,
            capture_count: 2,
            capture_window_ms: 10_000,
            poll_interval_ms: 500,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl TttConfig {
    /// Load configuration from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_toml(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Settings for the initiator loop.
    pub fn initiator(&self) -> InitiatorConfig {
        InitiatorConfig {
            version: self.link.version,
            reply_timeout: Duration::from_millis(self.initiator.reply_timeout_ms),
            tag_rounds: self.initiator.tag_rounds,
        }
    }

    /// Capture filter for the observer: the configured expression, or
    /// frames addressed to the configured peer.
    pub fn observer_filter(&self) -> Result<CaptureFilter, TttError> {
        match &self.observer.filter {
            Some(expr) => expr.parse(),
            None => Ok(CaptureFilter::ether_dst(self.link.peer)),
        }
    }

    /// Settings for the observer loop. Fails on a bad filter expression.
    pub fn observer(&self) -> Result<ObserverConfig, TttError> {
        Ok(ObserverConfig {
            filter: self.observer_filter()?,
            capture_count: self.observer.capture_count,
            capture_window: Duration::from_millis(self.observer.capture_window_ms),
            poll_interval: Duration::from_millis(self.observer.poll_interval_ms),
            ether_type: self.link.ether_type,
        })
    }
}
