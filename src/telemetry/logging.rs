//! Logging configuration and initialization
//!
//! Console output is compact by default or JSON on request; a plain-text
//! file sink can be added alongside it.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

const DEFAULT_LOG_FILE: &str = "cheese_vision.log";

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Enable console output (default: true)
    pub console_enabled: bool,
    /// Enable file logging (default: false)
    pub file_enabled: bool,
    /// Path for the log file (default: `cheese_vision.log`)
    pub file_path: Option<PathBuf>,
    /// JSON console output (default: false)
    pub json_format: bool,
    /// Filter used when neither `CHEESE_LOG` nor `RUST_LOG` is set
    pub default_level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            console_enabled: true,
            file_enabled: false,
            file_path: None,
            json_format: false,
            default_level: "info".to_string(),
        }
    }
}

impl LogConfig {
    pub fn log_path(&self) -> PathBuf {
        self.file_path.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE))
    }

    /// `CHEESE_LOG_FORMAT=json` wins over the configured format
    fn json_console(&self, format_override: Option<&str>) -> bool {
        format_override.map_or(self.json_format, |format| format.eq_ignore_ascii_case("json"))
    }
}

/// Install the global subscriber.
///
/// Keep the returned guard alive for the whole program so the file sink is
/// flushed. Reads `CHEESE_LOG` (then `RUST_LOG`) for the filter and
/// `CHEESE_LOG_FORMAT` for the console format.
pub fn init_logging(config: &LogConfig) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = EnvFilter::try_from_env("CHEESE_LOG")
        .or_else(|_| EnvFilter::try_from_env("RUST_LOG"))
        .unwrap_or_else(|_| EnvFilter::new(&config.default_level));

    let format_override = std::env::var("CHEESE_LOG_FORMAT").ok();
    let use_json = config.json_console(format_override.as_deref());

    let (file_layer, file_guard) = if config.file_enabled {
        let file = std::fs::File::create(config.log_path())?;
        let (writer, guard) = tracing_appender::non_blocking(file);
        (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
    } else {
        (None, None)
    };
    let json_layer = (config.console_enabled && use_json).then(|| fmt::layer().json());
    let compact_layer = (config.console_enabled && !use_json).then(|| fmt::layer().compact());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(json_layer)
        .with(compact_layer)
        .try_init()?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        json_format = use_json,
        file_enabled = config.file_enabled,
        "Logging initialized"
    );
    if config.file_enabled {
        tracing::info!(path = %config.log_path().display(), "Logging to file");
    }

    Ok(file_guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_default() {
        let config = LogConfig::default();
        assert!(config.console_enabled);
        assert!(!config.file_enabled);
        assert!(!config.json_format);
        assert_eq!(config.default_level, "info");
        assert_eq!(config.log_path(), PathBuf::from("cheese_vision.log"));
    }

    #[test]
    fn test_log_config_partial_json() {
        let config: LogConfig = serde_json::from_str(r#"{ "json_format": true, "file_path": "/tmp/c.log" }"#).unwrap();
        assert!(config.json_format);
        assert!(config.console_enabled);
        assert_eq!(config.log_path(), PathBuf::from("/tmp/c.log"));
    }

    #[test]
    fn test_format_override() {
        let config = LogConfig::default();
        assert!(!config.json_console(None));
        assert!(config.json_console(Some("JSON")));
        assert!(!config.json_console(Some("pretty")));

        let json = LogConfig {
            json_format: true,
            ..LogConfig::default()
        };
        assert!(json.json_console(None));
        assert!(!json.json_console(Some("compact")));
    }
}
