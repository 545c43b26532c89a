//! Tracker configuration

/// Rendering knobs for the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Maximum characters of a tool input shown on a "starting" line
    pub input_preview_chars: usize,
    /// Maximum characters of a tool output shown on a "completed" line
    pub output_preview_chars: usize,
    /// Mirror transcript writes to stdout
    pub mirror_console: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            input_preview_chars: 200,
            output_preview_chars: 200,
            mirror_console: true,
        }
    }
}

impl TrackerConfig {
    pub fn with_preview_chars(mut self, chars: usize) -> Self {
        self.input_preview_chars = chars;
        self.output_preview_chars = chars;
        self
    }

    pub fn with_output_preview_chars(mut self, chars: usize) -> Self {
        self.output_preview_chars = chars;
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

        if let Some(val) = lookup("RESEARCH_AGENT_PREVIEW_CHARS").and_then(|v| v.parse::<usize>().ok()) {
            config = config.with_preview_chars(val);
        }

        if let Some(val) = lookup("RESEARCH_AGENT_OUTPUT_PREVIEW_CHARS").and_then(|v| v.parse::<usize>().ok()) {
            config = config.with_output_preview_chars(val);
        }

        if let Some(quiet) = lookup("RESEARCH_AGENT_QUIET") {
            if matches!(quiet.trim().to_lowercase().as_str(), "1" | "true" | "yes") {
                config.mirror_console = false;
            }
        }

        config
    }
}
