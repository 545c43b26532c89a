//! Runtime configuration for the research agent

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{Result, RuntimeError};

/// Environment variable holding the model provider credential.
pub const API_KEY_VAR: &str = "ANTHROPIC_API_KEY";

/// How the runtime treats tool permission prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionMode {
    Default,
    AcceptEdits,
    #[default]
    BypassPermissions,
    Plan,
}

impl PermissionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionMode::Default => "default",
            PermissionMode::AcceptEdits => "acceptEdits",
            PermissionMode::BypassPermissions => "bypassPermissions",
            PermissionMode::Plan => "plan",
        }
    }
}

impl FromStr for PermissionMode {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "default" => Ok(PermissionMode::Default),
            "acceptedits" | "accept-edits" => Ok(PermissionMode::AcceptEdits),
            "bypasspermissions" | "bypass" => Ok(PermissionMode::BypassPermissions),
            "plan" => Ok(PermissionMode::Plan),
            _ => Err(()),
        }
    }
}

impl fmt::Display for PermissionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    /// Model for the lead agent
    pub model: String,
    /// Executable of the agent CLI
    pub claude_bin: PathBuf,
    /// Directory the runtime process starts in (None = current directory)
    pub working_dir: Option<PathBuf>,
    pub permission_mode: PermissionMode,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            model: "haiku".to_string(),
            claude_bin: PathBuf::from("claude"),
            working_dir: None,
            permission_mode: PermissionMode::default(),
        }
    }
}

impl RuntimeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_claude_bin(mut self, bin: impl Into<PathBuf>) -> Self {
        self.claude_bin = bin.into();
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_permission_mode(mut self, mode: PermissionMode) -> Self {
        self.permission_mode = mode;
        self
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(model) = lookup("RESEARCH_AGENT_MODEL").filter(|m| !m.trim().is_empty()) {
            config.model = model.trim().to_string();
        }

        if let Some(bin) = lookup("RESEARCH_AGENT_CLAUDE_BIN").filter(|b| !b.trim().is_empty()) {
            config.claude_bin = PathBuf::from(bin.trim());
        }

        if let Some(dir) = lookup("RESEARCH_AGENT_WORKDIR").filter(|d| !d.trim().is_empty()) {
            config.working_dir = Some(PathBuf::from(dir.trim()));
        }

        if let Some(mode) = lookup("RESEARCH_AGENT_PERMISSION_MODE") {
            if let Ok(mode) = mode.parse::<PermissionMode>() {
                config.permission_mode = mode;
            }
        }

        config
    }
}

/// Check that the provider credential is present before anything else runs.
pub fn require_api_key<F>(lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(API_KEY_VAR)
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .ok_or(RuntimeError::MissingCredential(API_KEY_VAR))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.model, "haiku");
        assert_eq!(config.claude_bin, PathBuf::from("claude"));
        assert_eq!(config.permission_mode, PermissionMode::BypassPermissions);
    }

    #[test]
    fn test_from_lookup() {
        let config = RuntimeConfig::from_lookup(|key| match key {
            "RESEARCH_AGENT_MODEL" => Some("sonnet".to_string()),
            "RESEARCH_AGENT_CLAUDE_BIN" => Some("/opt/claude/bin/claude".to_string()),
            "RESEARCH_AGENT_PERMISSION_MODE" => Some("plan".to_string()),
            _ => None,
        });
        assert_eq!(config.model, "sonnet");
        assert_eq!(config.claude_bin, PathBuf::from("/opt/claude/bin/claude"));
        assert_eq!(config.permission_mode, PermissionMode::Plan);
        assert!(config.working_dir.is_none());
    }

    #[test]
    fn test_permission_mode_parse() {
        assert_eq!("bypassPermissions".parse(), Ok(PermissionMode::BypassPermissions));
        assert_eq!("accept-edits".parse(), Ok(PermissionMode::AcceptEdits));
        assert!("yolo".parse::<PermissionMode>().is_err());
    }

    #[test]
    fn test_require_api_key() {
        let key = require_api_key(|_| Some("  sk-test  ".to_string())).unwrap();
        assert_eq!(key, "sk-test");

        assert!(matches!(
            require_api_key(|_| None),
            Err(RuntimeError::MissingCredential("ANTHROPIC_API_KEY"))
        ));
        assert!(matches!(
            require_api_key(|_| Some("   ".to_string())),
            Err(RuntimeError::MissingCredential(_))
        ));
    }
}
