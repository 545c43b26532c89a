//! Agent identities and the statically declared subagent roster.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ResearchError;

/// Which logical actor produced a tool event.
///
/// Serialized as a bare string: `"lead"`, `"unknown"`, or the subagent name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AgentIdentity {
    Lead,
    Subagent(String),
    Unknown,
}

impl AgentIdentity {
    pub fn subagent(name: impl Into<String>) -> Self {
        AgentIdentity::Subagent(name.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            AgentIdentity::Lead => "lead",
            AgentIdentity::Subagent(name) => name,
            AgentIdentity::Unknown => "unknown",
        }
    }

    pub fn is_subagent(&self) -> bool {
        matches!(self, AgentIdentity::Subagent(_))
    }
}

impl From<String> for AgentIdentity {
    fn from(value: String) -> Self {
        match value.as_str() {
            "lead" => AgentIdentity::Lead,
            "unknown" => AgentIdentity::Unknown,
            _ => AgentIdentity::Subagent(value),
        }
    }
}

impl From<&str> for AgentIdentity {
    fn from(value: &str) -> Self {
        AgentIdentity::from(value.to_string())
    }
}

impl From<AgentIdentity> for String {
    fn from(value: AgentIdentity) -> Self {
        match value {
            AgentIdentity::Subagent(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for AgentIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How confident the tracker is about an [`AgentIdentity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Attribution {
    /// The runtime tagged the event with an agent.
    Explicit,
    /// Resolved through the delegation call that spawned the subagent.
    Delegated,
    /// Heuristic: the tool is permitted to exactly one subagent.
    ExclusiveTool,
    /// No subagent may use the tool, so the lead issued it.
    DefaultLead,
    /// Several subagents may use the tool and nothing else disambiguates.
    Ambiguous,
    /// A completion arrived with no recorded start.
    Unmatched,
}

impl Attribution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Attribution::Explicit => "explicit",
            Attribution::Delegated => "delegated",
            Attribution::ExclusiveTool => "exclusive-tool",
            Attribution::DefaultLead => "default-lead",
            Attribution::Ambiguous => "ambiguous",
            Attribution::Unmatched => "unmatched",
        }
    }

    /// True when a subagent was guessed from tool ownership alone.
    ///
    /// `DefaultLead` is not a guess: no subagent may use the tool.
    pub fn is_heuristic(&self) -> bool {
        matches!(self, Attribution::ExclusiveTool)
    }
}

impl fmt::Display for Attribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Model tier label handed to the runtime for a subagent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    #[default]
    Haiku,
    Sonnet,
    Opus,
    Inherit,
}

impl ModelTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelTier::Haiku => "haiku",
            ModelTier::Sonnet => "sonnet",
            ModelTier::Opus => "opus",
            ModelTier::Inherit => "inherit",
        }
    }
}

impl FromStr for ModelTier {
    type Err = ResearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "haiku" => Ok(ModelTier::Haiku),
            "sonnet" => Ok(ModelTier::Sonnet),
            "opus" => Ok(ModelTier::Opus),
            "inherit" => Ok(ModelTier::Inherit),
            other => Err(ResearchError::Config(format!("unknown model tier: {other}"))),
        }
    }
}

impl fmt::Display for ModelTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A subagent as declared to the runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubagentDefinition {
    pub name: String,
    /// Used by the runtime's own delegation policy.
    pub description: String,
    /// Ordered list of permitted tool names.
    pub tools: Vec<String>,
    pub prompt: String,
    pub model: ModelTier,
}

impl SubagentDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            tools: Vec::new(),
            prompt: String::new(),
            model: ModelTier::default(),
        }
    }

    pub fn with_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tools = tools.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_model(mut self, model: ModelTier) -> Self {
        self.model = model;
        self
    }

    pub fn permits(&self, tool: &str) -> bool {
        self.tools.iter().any(|t| t == tool)
    }

    pub fn identity(&self) -> AgentIdentity {
        AgentIdentity::subagent(&self.name)
    }
}

/// The fixed set of subagents for a session, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentRoster {
    agents: Vec<SubagentDefinition>,
}

impl AgentRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a subagent. A later definition with the same name replaces the earlier one.
    pub fn with_agent(mut self, agent: SubagentDefinition) -> Self {
        self.agents.retain(|a| a.name != agent.name);
        self.agents.push(agent);
        self
    }

    pub fn get(&self, name: &str) -> Option<&SubagentDefinition> {
        self.agents.iter().find(|a| a.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Subagents whose permitted tool set contains `tool`.
    pub fn owners_of(&self, tool: &str) -> Vec<&SubagentDefinition> {
        self.agents.iter().filter(|a| a.permits(tool)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SubagentDefinition> {
        self.agents.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.agents.iter().map(|a| a.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> AgentRoster {
        AgentRoster::new()
            .with_agent(SubagentDefinition::new("researcher", "web").with_tools(["WebSearch", "Write"]))
            .with_agent(
                SubagentDefinition::new("data-analyst", "charts")
                    .with_tools(["Glob", "Read", "Bash", "Write"]),
            )
    }

    #[test]
    fn test_identity_serializes_as_string() {
        let json = serde_json::to_string(&AgentIdentity::subagent("researcher")).unwrap();
        assert_eq!(json, r#""researcher""#);
        assert_eq!(serde_json::to_string(&AgentIdentity::Lead).unwrap(), r#""lead""#);
        assert_eq!(serde_json::to_string(&AgentIdentity::Unknown).unwrap(), r#""unknown""#);
    }

    #[test]
    fn test_identity_deserializes_reserved_names() {
        let lead: AgentIdentity = serde_json::from_str(r#""lead""#).unwrap();
        assert_eq!(lead, AgentIdentity::Lead);
        let sub: AgentIdentity = serde_json::from_str(r#""report-writer""#).unwrap();
        assert_eq!(sub, AgentIdentity::subagent("report-writer"));
    }

    #[test]
    fn test_attribution_heuristic_flags() {
        assert!(Attribution::ExclusiveTool.is_heuristic());
        assert!(!Attribution::DefaultLead.is_heuristic());
        assert!(!Attribution::Explicit.is_heuristic());
        assert!(!Attribution::Ambiguous.is_heuristic());
        let json = serde_json::to_string(&Attribution::ExclusiveTool).unwrap();
        assert_eq!(json, r#""exclusive-tool""#);
    }

    #[test]
    fn test_model_tier_parse() {
        assert_eq!("HAIKU".parse::<ModelTier>().unwrap(), ModelTier::Haiku);
        assert_eq!(" opus ".parse::<ModelTier>().unwrap(), ModelTier::Opus);
        assert!("gpt".parse::<ModelTier>().is_err());
    }

    #[test]
    fn test_owners_of() {
        let roster = roster();
        assert_eq!(roster.owners_of("WebSearch").len(), 1);
        assert_eq!(roster.owners_of("Write").len(), 2);
        assert!(roster.owners_of("Task").is_empty());
    }

    #[test]
    fn test_roster_replaces_duplicate_names() {
        let roster = roster().with_agent(SubagentDefinition::new("researcher", "v2"));
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.get("researcher").unwrap().description, "v2");
        assert_eq!(roster.names(), vec!["data-analyst", "researcher"]);
    }
}
