pub mod agent;
pub mod error;
pub mod event;
pub mod message;
pub mod record;
pub mod session;

pub use agent::{AgentIdentity, AgentRoster, Attribution, ModelTier, SubagentDefinition};
pub use error::{ResearchError, Result};
pub use event::{HookContext, HookPhase, ToolHook, ToolInvocationEvent};
pub use message::{ContentBlock, RuntimeMessage, TurnResult};
pub use record::{RecordStatus, ToolCallRecord};
pub use session::SessionId;

/// Name of the runtime tool the lead agent uses to hand work to a subagent.
pub const DELEGATION_TOOL: &str = "Task";
