use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResearchError {
    #[error("session error: {0}")]
    Session(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("unknown subagent: {0}")]
    UnknownAgent(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ResearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_error() {
        let err = ResearchError::Session("directory exists".to_string());
        assert_eq!(err.to_string(), "session error: directory exists");
    }

    #[test]
    fn test_config_error() {
        let err = ResearchError::Config("bad model tier".to_string());
        assert_eq!(err.to_string(), "config error: bad model tier");
    }

    #[test]
    fn test_unknown_agent_error() {
        let err = ResearchError::UnknownAgent("painter".to_string());
        assert_eq!(err.to_string(), "unknown subagent: painter");
    }

    #[test]
    fn test_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err = ResearchError::from(io_err);
        assert!(err.to_string().contains("read-only"));
    }

    #[test]
    fn test_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json");
        let err = ResearchError::from(json_err.unwrap_err());
        assert!(matches!(err, ResearchError::Json(_)));
    }
}
