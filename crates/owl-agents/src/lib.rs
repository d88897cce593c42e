//! Agents and the two-agent role-playing society.
//!
//! A [`ChatAgent`] wraps one LLM conversation and executes the tool calls the
//! model asks for. [`RolePlaying`] pairs a user agent that instructs with an
//! assistant agent that solves, and [`run_society`] drives them round by
//! round until the task is done or the round limit is hit.

pub mod chat_agent;
pub mod prompts;
pub mod role_playing;
pub mod society;

pub use chat_agent::{AgentResponse, ChatAgent, SharedLogger, StepInfo};
pub use role_playing::{RolePlaying, RolePlayingBuilder, RoundResponse};
pub use society::{run_society, SocietyResult};
