use std::sync::Arc;
use std::{env, fs};

use serde::Deserialize;

use crate::metrics::AppMetrics;

pub mod api;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod telemetry;

/// Environment variable overriding the configured collector endpoint.
pub const OTEL_ENDPOINT_VAR: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";

const DEFAULT_OTEL_ENDPOINT: &str = "http://localhost:4318";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub otel: OtelConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OtelConfig {
    pub endpoint: String,
    pub exporter: SpanExporterKind,
}

impl Default for OtelConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_OTEL_ENDPOINT.to_owned(),
            exporter: SpanExporterKind::Otlp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanExporterKind {
    Otlp,
    Stdout,
}

impl AppConfig {
    /// Reads `app.toml` when present, then applies the endpoint override
    /// from the environment. A missing file falls back to defaults; a
    /// file that fails to parse aborts startup.
    pub fn load() -> Self {
        let mut config = match fs::read_to_string("app.toml") {
            Ok(raw) => toml::from_str::<AppConfig>(&raw).expect("failed to parse app.toml"),
            Err(_) => AppConfig::default(),
        };
        config.apply_endpoint_override(env::var(OTEL_ENDPOINT_VAR).ok());
        config
    }

    /// A non-blank override replaces the configured endpoint. Trailing
    /// slashes are trimmed either way so the `/v1/traces` path can be
    /// appended verbatim.
    fn apply_endpoint_override(&mut self, override_endpoint: Option<String>) {
        if let Some(endpoint) = override_endpoint {
            if !endpoint.trim().is_empty() {
                self.otel.endpoint = endpoint;
            }
        }
        self.otel.endpoint = self.otel.endpoint.trim_end_matches('/').to_owned();
    }
}

#[derive(Debug, Clone)]
pub struct AppContext {
    pub metrics: Arc<AppMetrics>,
}

impl AppContext {
    pub fn new(metrics: Arc<AppMetrics>) -> Self {
        Self { metrics }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.otel.endpoint, "http://localhost:4318");
        assert_eq!(config.otel.exporter, SpanExporterKind::Otlp);
    }

    #[test]
    fn config_parses_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            [otel]
            endpoint = "http://collector:4318"
            exporter = "stdout"
            "#,
        )
        .unwrap();
        assert_eq!(config.otel.endpoint, "http://collector:4318");
        assert_eq!(config.otel.exporter, SpanExporterKind::Stdout);
    }

    #[test]
    fn config_missing_fields_fall_back() {
        let config: AppConfig = toml::from_str("[otel]\n").unwrap();
        assert_eq!(config.otel.endpoint, "http://localhost:4318");

        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.otel.exporter, SpanExporterKind::Otlp);
    }

    #[test]
    fn malformed_config_is_rejected() {
        assert!(toml::from_str::<AppConfig>("[otel]\nendpoint = 7").is_err());
        assert!(toml::from_str::<AppConfig>("[otel]\nexporter = \"carrier-pigeon\"").is_err());
    }

    #[test]
    fn endpoint_override_replaces_configured_endpoint() {
        let mut config = AppConfig::default();
        config.apply_endpoint_override(Some("http://collector:4318".to_owned()));
        assert_eq!(config.otel.endpoint, "http://collector:4318");
    }

    #[test]
    fn endpoint_override_trims_trailing_slashes() {
        let mut config = AppConfig::default();
        config.apply_endpoint_override(Some("http://collector:4318/".to_owned()));
        assert_eq!(config.otel.endpoint, "http://collector:4318");
    }

    #[test]
    fn blank_override_keeps_configured_endpoint() {
        let mut config = AppConfig::default();
        config.otel.endpoint = "http://collector:4318//".to_owned();
        config.apply_endpoint_override(Some("  ".to_owned()));
        assert_eq!(config.otel.endpoint, "http://collector:4318");
    }

    #[test]
    fn absent_override_still_normalizes_endpoint() {
        let mut config = AppConfig::default();
        config.otel.endpoint = "http://localhost:4318/".to_owned();
        config.apply_endpoint_override(None);
        assert_eq!(config.otel.endpoint, "http://localhost:4318");
    }
}
