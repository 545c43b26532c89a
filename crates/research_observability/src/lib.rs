//! Research Agent Observability - logging and span export shared by the workspace
//!
//! # Quick Start
//!
//! ```no_run
//! use research_observability::{init, ObservabilityConfig};
//!
//! let config = ObservabilityConfig::from_env()
//!     .with_log_file("logs/session_20260105_142233/debug.log");
//! init(config).expect("logging");
//!
//! tracing::info!("Session started");
//! ```
//!
//! # Environment Variables
//!
//! - `RESEARCH_AGENT_LOG` or `RUST_LOG` - Log level filter
//! - `RESEARCH_AGENT_LOG_CONSOLE` - Mirror log lines to stderr
//! - `OTEL_EXPORTER_OTLP_ENDPOINT` - Export spans to this OTLP collector
//! - `LMNR_PROJECT_API_KEY` - Export spans to Laminar (bearer token)

pub mod config;
pub mod error;
pub mod telemetry;
pub mod tracing;

pub use config::ObservabilityConfig;
pub use error::ObservabilityError;
pub use telemetry::{init, shutdown};
pub use crate::tracing::{record_duration, record_error};
