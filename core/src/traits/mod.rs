pub mod provider;
pub mod tool;

pub use provider::{ChatMessage, ChatRequest, ChatResponse, Provider};
pub use tool::{Tool, ToolInvocation, ToolKind, ToolResult, ToolSpec};
