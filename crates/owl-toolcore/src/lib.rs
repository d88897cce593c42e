//! Tool abstractions shared by every owl toolkit and agent.

pub mod tool;
pub mod tool_context;
pub mod tool_registry;

pub use tool::{ParameterDefinition, Tool, ToolParameters, ToolResult};
pub use tool_context::ToolContext;
pub use tool_registry::ToolRegistry;
