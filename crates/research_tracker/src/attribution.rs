//! Deciding which agent issued a tool call.

use std::collections::HashMap;

use research_core::{AgentIdentity, AgentRoster, Attribution, ToolInvocationEvent};
use serde_json::Value;
use tracing::debug;

/// Attributes tool events to agents using the roster and the delegation calls
/// seen so far.
#[derive(Debug)]
pub struct Attributor {
    roster: AgentRoster,
    /// Delegation tool-use id -> subagent it spawned.
    spawns: HashMap<String, AgentIdentity>,
}

impl Attributor {
    pub fn new(roster: AgentRoster) -> Self {
        Self {
            roster,
            spawns: HashMap::new(),
        }
    }

    pub fn roster(&self) -> &AgentRoster {
        &self.roster
    }

    /// Remember that delegation call `tool_use_id` spawned the subagent named
    /// in its `subagent_type` input. Returns that subagent.
    pub fn register_spawn(&mut self, tool_use_id: Option<&str>, input: &Value) -> Option<AgentIdentity> {
        let name = input.get("subagent_type").and_then(Value::as_str)?;
        let agent = AgentIdentity::subagent(name);
        if !self.roster.contains(name) {
            debug!(subagent = name, "Delegation to a subagent outside the roster");
        }
        if let Some(id) = tool_use_id {
            self.spawns.insert(id.to_string(), agent.clone());
        }
        Some(agent)
    }

    /// Forget a finished delegation call. Returns the subagent it spawned.
    pub fn release_spawn(&mut self, tool_use_id: &str) -> Option<AgentIdentity> {
        self.spawns.remove(tool_use_id)
    }

    pub fn open_spawns(&self) -> usize {
        self.spawns.len()
    }

    /// Resolve the issuing agent of `event`.
    ///
    /// Explicit tags win, then the parent delegation call, then the tool
    /// ownership in the roster.
    pub fn attribute(&self, event: &ToolInvocationEvent) -> (AgentIdentity, Attribution) {
        if let Some(agent) = &event.context.agent {
            return (agent.clone(), Attribution::Explicit);
        }

        if let Some(agent) = event.context.parent_tool_use_id.as_deref().and_then(|id| self.spawns.get(id)) {
            return (agent.clone(), Attribution::Delegated);
        }

        self.attribute_by_tool(&event.tool_name)
    }

    pub fn attribute_by_tool(&self, tool: &str) -> (AgentIdentity, Attribution) {
        let owners = self.roster.owners_of(tool);
        match owners.as_slice() {
            [] => (AgentIdentity::Lead, Attribution::DefaultLead),
            [only] => (only.identity(), Attribution::ExclusiveTool),
            _ => (AgentIdentity::Unknown, Attribution::Ambiguous),
        }
    }
}
