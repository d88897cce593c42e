use anyhow::Result;
use chrono::Local;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

#[derive(Serialize)]
struct ToolCallInfo {
    id: String,
    name: String,
    arguments: String,
}

#[derive(Serialize)]
struct LogEntry {
    timestamp: String, // ISO‑8601 Local time
    role: String,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    round: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    agent_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ToolCallInfo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

/// Append-only JSONL log of a conversation run.
pub struct ConversationLogger {
    file_path: PathBuf,
    file: Option<tokio::fs::File>,
}

impl ConversationLogger {
    /// Create a new logger under `<dir>/logs`; the file name carries the local start time.
    pub async fn new(dir: &Path, prefix: &str) -> Result<Self> {
        let logs_dir = dir.join("logs");
        fs::create_dir_all(&logs_dir).await?;

        let filename = format!("{}-{}.jsonl", prefix, Local::now().format("%Y-%m-%d-%H%M%S"));
        let file_path = logs_dir.join(filename);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file_path)
            .await?;
        Ok(Self {
            file_path,
            file: Some(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Append a plain message entry.
    pub async fn log(&mut self, role: &str, content: &str, round: Option<usize>, agent_name: Option<&str>) {
        let entry = LogEntry {
            timestamp: Local::now().to_rfc3339(),
            role: role.to_string(),
            content: content.to_string(),
            round,
            agent_name: agent_name.map(|s| s.to_string()),
            tool_calls: None,
            tool_call_id: None,
            name: None,
        };
        self.write_entry(&entry).await;
    }

    /// Log an assistant message together with the tool calls it requested
    pub async fn log_with_tool_calls(
        &mut self,
        content: &str,
        round: Option<usize>,
        agent_name: Option<&str>,
        tool_calls: Vec<(String, String, String)>, // (id, name, arguments)
    ) {
        let tool_call_info = tool_calls
            .into_iter()
            .map(|(id, name, arguments)| ToolCallInfo { id, name, arguments })
            .collect();

        let entry = LogEntry {
            timestamp: Local::now().to_rfc3339(),
            role: "assistant".to_string(),
            content: content.to_string(),
            round,
            agent_name: agent_name.map(|s| s.to_string()),
            tool_calls: Some(tool_call_info),
            tool_call_id: None,
            name: None,
        };
        self.write_entry(&entry).await;
    }

    /// Log a tool result
    pub async fn log_tool_result(
        &mut self,
        content: &str,
        tool_call_id: &str,
        tool_name: &str,
        round: Option<usize>,
    ) {
        let entry = LogEntry {
            timestamp: Local::now().to_rfc3339(),
            role: "tool".to_string(),
            content: content.to_string(),
            round,
            agent_name: None,
            tool_calls: None,
            tool_call_id: Some(tool_call_id.to_string()),
            name: Some(tool_name.to_string()),
        };
        self.write_entry(&entry).await;
    }

    async fn write_entry(&mut self, entry: &LogEntry) {
        let Some(file) = &mut self.file else {
            return;
        };
        match serde_json::to_string(entry) {
            Ok(json) => {
                if let Err(e) = file.write_all(json.as_bytes()).await {
                    log::warn!("[Logging error] {}", e);
                } else if let Err(e) = file.write_all(b"\n").await {
                    log::warn!("[Logging error] {}", e);
                } else {
                    let _ = file.flush().await;
                }
            }
            Err(e) => log::warn!("[Logging error] {}", e),
        }
    }

    /// Close the logger. Called on graceful shutdown.
    pub async fn shutdown(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = file.sync_all().await;
        }
    }
}
