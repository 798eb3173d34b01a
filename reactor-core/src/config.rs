//! Reactor Configuration
//!
//! Configuration is deliberately small: the only tunable is how much the
//! engine reports about itself. Diagnostics never change behavior.
//!
//! The config is serializable so a host application can embed it in its
//! own settings file:
//!
//! ```rust,ignore
//! let config: ReactorConfig = serde_json::from_str(r#"{ "log_level": "compute" }"#)?;
//! let reactor = Reactor::with_config(config);
//! ```

use serde::{Deserialize, Serialize};

/// Verbosity of the engine's diagnostic output.
///
/// Levels are ordered: each level includes everything the levels below it
/// emit. Contained user failures are always reported, even at `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// No engine diagnostics.
    #[default]
    None,

    /// Log each time a computation runs.
    Compute,

    /// Log every computation action: invalidation, stopping, queueing and
    /// flush boundaries.
    All,
}

impl LogLevel {
    /// Whether diagnostics at `level` are emitted under this setting.
    pub fn includes(self, level: LogLevel) -> bool {
        level != LogLevel::None && self >= level
    }
}

/// Settings a [`Reactor`](crate::Reactor) is created with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactorConfig {
    /// Diagnostic verbosity.
    pub log_level: LogLevel,
}

impl ReactorConfig {
    /// Config with the given log level.
    pub fn with_log_level(log_level: LogLevel) -> Self {
        Self { log_level }
    }
}
