//! Configuration management.

use serde::Deserialize;

use crate::error::ConfigError;

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    /// Authorization gateway configuration
    #[serde(default)]
    pub gateway: GatewaySettings,

    /// Telemetry configuration
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewaySettings {
    /// Cache rule decisions and scopes for the lifetime of a gateway
    /// (one request). Disable only for debugging.
    #[serde(default = "default_cache_decisions")]
    pub cache_decisions: bool,

    /// Journal every authorize call so missing-check assertions can run
    /// at the request boundary.
    #[serde(default = "default_journal_checks")]
    pub journal_checks: bool,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            cache_decisions: default_cache_decisions(),
            journal_checks: default_journal_checks(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    /// Log filter directive (overridden by `RUST_LOG`).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON-formatted logs instead of human-readable ones.
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

fn default_cache_decisions() -> bool {
    true
}

fn default_journal_checks() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    /// Load settings from an optional `passerelle.toml` next to the process
    /// and `PASSERELLE_*` environment variables (e.g.
    /// `PASSERELLE_GATEWAY__CACHE_DECISIONS=false`).
    pub fn load() -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("passerelle").required(false))
            .add_source(
                config::Environment::with_prefix("PASSERELLE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(settings.gateway.cache_decisions);
        assert!(settings.gateway.journal_checks);
        assert_eq!(settings.telemetry.log_level, "info");
        assert!(!settings.telemetry.json_logs);
    }

    #[test]
    fn test_deserialize_partial_overrides() {
        let settings: Settings = serde_json::from_str(
            r#"{"gateway": {"cache_decisions": false}, "telemetry": {"json_logs": true}}"#,
        )
        .unwrap();
        assert!(!settings.gateway.cache_decisions);
        assert!(settings.gateway.journal_checks);
        assert!(settings.telemetry.json_logs);
    }
}
