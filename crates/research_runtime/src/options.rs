//! What the runtime is told at connect time: lead prompt, tools, subagents, hooks.

use std::fmt;
use std::sync::Arc;

use research_core::{AgentRoster, HookPhase, ToolHook, ToolInvocationEvent, DELEGATION_TOOL};

use crate::config::PermissionMode;

/// Lifecycle point a hook is registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookEvent {
    PreToolUse,
    PostToolUse,
}

impl HookEvent {
    pub fn for_phase(phase: HookPhase) -> Self {
        match phase {
            HookPhase::Pre => HookEvent::PreToolUse,
            HookPhase::Post => HookEvent::PostToolUse,
        }
    }
}

/// Hooks applied to tools whose name matches `matcher`.
///
/// `None` matches every tool. A pattern matches a tool named exactly like one
/// of its `|`-separated alternatives.
#[derive(Clone)]
pub struct HookMatcher {
    pub matcher: Option<String>,
    pub hooks: Vec<Arc<dyn ToolHook>>,
}

impl HookMatcher {
    pub fn all(hook: Arc<dyn ToolHook>) -> Self {
        Self {
            matcher: None,
            hooks: vec![hook],
        }
    }

    pub fn for_tools(pattern: impl Into<String>, hook: Arc<dyn ToolHook>) -> Self {
        Self {
            matcher: Some(pattern.into()),
            hooks: vec![hook],
        }
    }

    pub fn matches(&self, tool: &str) -> bool {
        match &self.matcher {
            None => true,
            Some(pattern) => pattern.split('|').map(str::trim).any(|alt| alt == "*" || alt == tool),
        }
    }
}

impl fmt::Debug for HookMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookMatcher")
            .field("matcher", &self.matcher)
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    pub system_prompt: String,
    /// Model override; falls back to the runtime configuration when `None`
    pub model: Option<String>,
    /// Permission mode override; falls back to the runtime configuration when `None`
    pub permission_mode: Option<PermissionMode>,
    /// Tools the lead agent may call directly
    pub allowed_tools: Vec<String>,
    pub agents: AgentRoster,
    pub pre_tool_use: Vec<HookMatcher>,
    pub post_tool_use: Vec<HookMatcher>,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            system_prompt: String::new(),
            model: None,
            permission_mode: None,
            allowed_tools: vec![DELEGATION_TOOL.to_string()],
            agents: AgentRoster::new(),
            pre_tool_use: Vec::new(),
            post_tool_use: Vec::new(),
        }
    }
}

impl RuntimeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_permission_mode(mut self, mode: PermissionMode) -> Self {
        self.permission_mode = Some(mode);
        self
    }

    pub fn with_allowed_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_tools = tools.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_agents(mut self, agents: AgentRoster) -> Self {
        self.agents = agents;
        self
    }

    pub fn with_hook(mut self, event: HookEvent, matcher: HookMatcher) -> Self {
        match event {
            HookEvent::PreToolUse => self.pre_tool_use.push(matcher),
            HookEvent::PostToolUse => self.post_tool_use.push(matcher),
        }
        self
    }

    /// Register `hook` for both phases of every tool.
    pub fn with_tool_hook(self, hook: Arc<dyn ToolHook>) -> Self {
        self.with_hook(HookEvent::PreToolUse, HookMatcher::all(Arc::clone(&hook)))
            .with_hook(HookEvent::PostToolUse, HookMatcher::all(hook))
    }

    pub fn matchers(&self, event: HookEvent) -> &[HookMatcher] {
        match event {
            HookEvent::PreToolUse => &self.pre_tool_use,
            HookEvent::PostToolUse => &self.post_tool_use,
        }
    }

    /// Deliver `event` to every hook registered for its phase and tool.
    pub fn fire(&self, event: &ToolInvocationEvent) {
        for matcher in self.matchers(HookEvent::for_phase(event.phase)) {
            if !matcher.matches(&event.tool_name) {
                continue;
            }
            for hook in &matcher.hooks {
                hook.dispatch(event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<String>>,
    }

    impl ToolHook for Recorder {
        fn on_pre_tool_use(&self, event: &ToolInvocationEvent) {
            self.seen.lock().unwrap().push(format!("pre:{}", event.tool_name));
        }

        fn on_post_tool_use(&self, event: &ToolInvocationEvent) {
            self.seen.lock().unwrap().push(format!("post:{}", event.tool_name));
        }
    }

    #[test]
    fn test_matcher_patterns() {
        let hook: Arc<dyn ToolHook> = Arc::new(Recorder::default());
        assert!(HookMatcher::all(Arc::clone(&hook)).matches("Bash"));
        let some = HookMatcher::for_tools("Write | Bash", Arc::clone(&hook));
        assert!(some.matches("Bash"));
        assert!(some.matches("Write"));
        assert!(!some.matches("WebSearch"));
        assert!(HookMatcher::for_tools("*", hook).matches("Glob"));
    }

    #[test]
    fn test_fire_routes_by_phase_and_tool() {
        let recorder = Arc::new(Recorder::default());
        let options = RuntimeOptions::new()
            .with_hook(HookEvent::PreToolUse, HookMatcher::all(recorder.clone()))
            .with_hook(HookEvent::PostToolUse, HookMatcher::for_tools("Bash", recorder.clone()));

        options.fire(&ToolInvocationEvent::pre("Write", json!({})));
        options.fire(&ToolInvocationEvent::post("Write", json!({}), json!("ok")));
        options.fire(&ToolInvocationEvent::post("Bash", json!({}), json!("ok")));

        assert_eq!(*recorder.seen.lock().unwrap(), vec!["pre:Write", "post:Bash"]);
    }

    #[test]
    fn test_defaults_allow_only_delegation() {
        let options = RuntimeOptions::default();
        assert_eq!(options.allowed_tools, vec!["Task"]);
        assert_eq!(options.permission_mode, None);
        let options = options.with_permission_mode(PermissionMode::Plan);
        assert_eq!(options.permission_mode, Some(PermissionMode::Plan));
        assert!(options.pre_tool_use.is_empty());
    }
}
