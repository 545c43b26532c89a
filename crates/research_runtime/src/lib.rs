//! Agent runtime boundary for the research agent.
//!
//! The lead agent and its subagents run inside an external orchestration
//! runtime. This crate describes what the runtime is told ([`RuntimeOptions`])
//! and how its turn output is pulled ([`AgentRuntime`]), with two backends:
//! the `claude` CLI and a scripted replay.

pub mod claude_cli;
pub mod config;
pub mod error;
pub mod options;
pub mod runtime;
pub mod scripted;

pub use claude_cli::ClaudeCliRuntime;
pub use config::{require_api_key, PermissionMode, RuntimeConfig, API_KEY_VAR};
pub use error::{Result, RuntimeError};
pub use options::{HookEvent, HookMatcher, RuntimeOptions};
pub use runtime::{responses, AgentRuntime};
pub use scripted::{Script, ScriptStep, ScriptTurn, ScriptedRuntime, ScriptedTool};
