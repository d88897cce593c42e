//! Core types and structures for owl
//!
//! This crate provides the foundational types shared by the agent, tool and
//! application crates: role names, the round-by-round transcript of a
//! role-playing run and the aggregated token counters.

use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// Constants
// ============================================================================

/// Default number of user/assistant rounds before a society run is cut off
pub const DEFAULT_ROUND_LIMIT: usize = 15;

/// Marker the user agent emits once it considers the task solved
pub const TASK_DONE: &str = "TASK_DONE";

/// Maximum number of tool-call iterations a single agent step may perform
pub const MAX_TOOL_ITERATIONS: usize = 10;

/// Maximum number of retries for LLM-backed pipeline stages
pub const MAX_RETRIES: u32 = 3;

// ============================================================================
// Roles
// ============================================================================

/// Role an agent plays inside a society
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleType {
    User,
    Assistant,
}

impl RoleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleType::User => "user",
            RoleType::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for RoleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Transcript Types
// ============================================================================

/// Helper function to deserialize string or null values
pub fn deserialize_string_or_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        _ => Ok(String::new()),
    }
}

/// One executed tool call, as recorded in the transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub tool_name: String,
    pub args: serde_json::Value,
    pub result: String,
    pub tool_call_id: String,
}

/// One completed user/assistant exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    #[serde(deserialize_with = "deserialize_string_or_null", default)]
    pub user: String,
    #[serde(deserialize_with = "deserialize_string_or_null", default)]
    pub assistant: String,
    #[serde(default)]
    pub tool_calls: Vec<ToolCallRecord>,
}

/// Append-only transcript of a society run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatHistory {
    rounds: Vec<RoundRecord>,
}

impl ChatHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, round: RoundRecord) {
        self.rounds.push(round);
    }

    pub fn rounds(&self) -> &[RoundRecord] {
        &self.rounds
    }

    pub fn last(&self) -> Option<&RoundRecord> {
        self.rounds.last()
    }

    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }
}

/// Token totals accumulated over a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub completion_token_count: u64,
    pub prompt_token_count: u64,
}

impl TokenInfo {
    pub fn total(&self) -> u64 {
        self.completion_token_count + self.prompt_token_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_role_type_display() {
        assert_eq!(RoleType::User.to_string(), "user");
        assert_eq!(RoleType::Assistant.as_str(), "assistant");
    }

    #[test]
    fn test_chat_history_serializes_as_list() {
        let mut history = ChatHistory::new();
        history.push(RoundRecord {
            user: "Instruction: search".to_string(),
            assistant: "Solution: done".to_string(),
            tool_calls: vec![],
        });

        let json = serde_json::to_value(&history).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["user"], "Instruction: search");
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_round_record_null_content() {
        let round: RoundRecord =
            serde_json::from_str(r#"{"user": null, "assistant": "ok"}"#).unwrap();
        assert_eq!(round.user, "");
        assert_eq!(round.assistant, "ok");
        assert!(round.tool_calls.is_empty());
    }

    #[test]
    fn test_token_info_total() {
        let info = TokenInfo {
            completion_token_count: 10,
            prompt_token_count: 32,
        };
        assert_eq!(info.total(), 42);
    }
}
