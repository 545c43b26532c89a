//! Configuration for logging

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Service name attached to the startup event
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Service version (optional)
    #[serde(default)]
    pub service_version: Option<String>,

    /// Mirror log lines to stderr. Off by default: stdout carries the live transcript.
    #[serde(default)]
    pub enable_console: bool,

    /// Append log lines to this file (the session's `debug.log`)
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Log level filter (e.g., "info", "research_tracker=debug")
    /// Defaults to "info" if not set
    #[serde(default)]
    pub log_level: Option<String>,

    /// OTLP gRPC endpoint for span export (e.g., "http://localhost:4317")
    #[serde(default)]
    pub otlp_endpoint: Option<String>,

    /// Sent as `authorization: Bearer <token>` with every export
    #[serde(default, skip_serializing)]
    pub otlp_bearer_token: Option<String>,
}

/// Laminar's OTLP gRPC ingest, used when only `LMNR_PROJECT_API_KEY` is set.
pub const LAMINAR_OTLP_ENDPOINT: &str = "https://api.lmnr.ai:8443";

fn default_service_name() -> String {
    "research-agent".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            service_version: None,
            enable_console: false,
            log_file: None,
            log_level: None,
            otlp_endpoint: None,
            otlp_bearer_token: None,
        }
    }
}

impl ObservabilityConfig {
    /// Set service version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.service_version = Some(version.into());
        self
    }

    /// Enable or disable stderr output
    pub fn with_console(mut self, enable: bool) -> Self {
        self.enable_console = enable;
        self
    }

    /// Write logs to a file
    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    /// Export spans to an OTLP collector
    pub fn with_otlp_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.otlp_endpoint = Some(endpoint.into());
        self
    }

    /// Build from environment variables
    ///
    /// Reads:
    /// - `RESEARCH_AGENT_LOG` or `RUST_LOG` → log_level
    /// - `RESEARCH_AGENT_LOG_CONSOLE` (`1`/`true`) → enable_console
    /// - `OTEL_EXPORTER_OTLP_ENDPOINT` → otlp_endpoint
    /// - `LMNR_PROJECT_API_KEY` → otlp_bearer_token, with Laminar as the
    ///   default endpoint
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::from_env`] with an injectable variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let log_level = lookup("RESEARCH_AGENT_LOG").or_else(|| lookup("RUST_LOG"));
        let enable_console = lookup("RESEARCH_AGENT_LOG_CONSOLE")
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let otlp_bearer_token = lookup("LMNR_PROJECT_API_KEY")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        // Only export when asked to; otherwise file and console logging only.
        let otlp_endpoint = lookup("OTEL_EXPORTER_OTLP_ENDPOINT")
            .filter(|v| !v.trim().is_empty())
            .or_else(|| otlp_bearer_token.as_ref().map(|_| LAMINAR_OTLP_ENDPOINT.to_string()));

        Self {
            log_level,
            enable_console,
            otlp_endpoint,
            otlp_bearer_token,
            ..Default::default()
        }
    }
}
