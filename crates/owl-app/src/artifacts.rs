//! Files written after a society run: the raw chat history and a readable summary.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use owl_agents::SocietyResult;

/// File-name friendly form of `text`, at most `max_len` characters
pub fn slugify(text: &str, max_len: usize) -> String {
    let mut slug = String::new();
    for c in text.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.ends_with('_') && !slug.is_empty() {
            slug.push('_');
        }
        if slug.chars().count() >= max_len {
            break;
        }
    }
    let slug = slug.trim_end_matches('_').to_string();
    if slug.is_empty() {
        "task".to_string()
    } else {
        slug
    }
}

/// Markdown summary of a run
pub fn render_summary(task: &str, result: &SocietyResult) -> String {
    let mut md = vec![
        "# OWL run".to_string(),
        format!("\n_Generated {}_", Local::now().format("%Y-%m-%d %H:%M:%S")),
        format!("\n## Task\n\n{}", task),
        format!("\n## Answer\n\n{}", result.answer),
        "\n## Token usage\n".to_string(),
        format!("- Prompt tokens: {}", result.token_info.prompt_token_count),
        format!("- Completion tokens: {}", result.token_info.completion_token_count),
        format!("- Total: {}", result.token_info.total()),
        format!("\n## Rounds ({})", result.chat_history.len()),
    ];

    for (i, round) in result.chat_history.rounds().iter().enumerate() {
        md.push(format!("\n### Round {}\n", i + 1));
        md.push(format!("**User:**\n\n{}\n", round.user));
        md.push(format!("**Assistant:**\n\n{}", round.assistant));
        if !round.tool_calls.is_empty() {
            md.push("\nTool calls:".to_string());
            for call in &round.tool_calls {
                md.push(format!("- `{}` {}", call.tool_name, call.args));
            }
        }
    }

    let mut out = md.join("\n");
    out.push('\n');
    out
}

/// Write `<stem>_chat_history.json` and `<stem>_summary.md` into `dir`
pub fn save_run_artifacts(dir: &Path, stem: &str, task: &str, result: &SocietyResult) -> Result<(PathBuf, PathBuf)> {
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let history_path = dir.join(format!("{}_chat_history.json", stem));
    let json = serde_json::to_string_pretty(&result.chat_history)?;
    std::fs::write(&history_path, json)
        .with_context(|| format!("Failed to write {}", history_path.display()))?;

    let summary_path = dir.join(format!("{}_summary.md", stem));
    std::fs::write(&summary_path, render_summary(task, result))
        .with_context(|| format!("Failed to write {}", summary_path.display()))?;

    log::info!("run artifacts written to {}", dir.display());
    Ok((history_path, summary_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use owl_types::{ChatHistory, RoundRecord, TokenInfo, ToolCallRecord};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample() -> SocietyResult {
        let mut chat_history = ChatHistory::new();
        chat_history.push(RoundRecord {
            user: "Instruction: find the capital".to_string(),
            assistant: "Solution: Paris".to_string(),
            tool_calls: vec![ToolCallRecord {
                tool_name: "search_wiki".to_string(),
                args: json!({"entity": "France"}),
                result: "France is a country".to_string(),
                tool_call_id: "call_1".to_string(),
            }],
        });
        SocietyResult {
            answer: "Solution: Paris".to_string(),
            chat_history,
            token_info: TokenInfo {
                completion_token_count: 12,
                prompt_token_count: 30,
            },
        }
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("What is the capital of France?", 40), "what_is_the_capital_of_france");
        assert_eq!(slugify("  ???  ", 40), "task");
        assert_eq!(slugify("abc def ghi", 5), "abc_d");
    }

    #[test]
    fn test_render_summary() {
        let md = render_summary("Capital of France", &sample());
        assert!(md.contains("## Task\n\nCapital of France"));
        assert!(md.contains("- Total: 42"));
        assert!(md.contains("### Round 1"));
        assert!(md.contains("- `search_wiki` {\"entity\":\"France\"}"));
    }

    #[test]
    fn test_save_run_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let (history, summary) = save_run_artifacts(&dir.path().join("runs"), "capital", "t", &sample()).unwrap();
        let saved: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(history).unwrap()).unwrap();
        assert_eq!(saved[0]["assistant"], "Solution: Paris");
        assert_eq!(saved[0]["tool_calls"][0]["tool_name"], "search_wiki");
        assert!(summary.ends_with("capital_summary.md"));
    }
}
