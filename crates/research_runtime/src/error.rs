//! Runtime error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("{0} not found. Set it in your environment or a .env file")]
    MissingCredential(&'static str),

    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Runtime process exited with {}: {stderr}", exit_label(.code))]
    ProcessFailed { code: Option<i32>, stderr: String },

    #[error("Malformed runtime output on line {line}: {message}")]
    Protocol { line: usize, message: String },

    #[error("Runtime not connected")]
    NotConnected,

    #[error("Script error: {0}")]
    Script(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {code}"),
        None => "a signal".to_string(),
    }
}
