use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use owl_toolcore::{param, ParameterDefinition, Tool, ToolContext, ToolParameters, ToolRegistry, ToolResult};

use crate::{excel, http};

const MAX_DOCUMENT_CHARS: usize = 100_000;

const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "markdown", "json", "jsonl", "csv", "tsv", "log", "xml", "yaml", "yml", "toml",
    "ini", "py", "rs", "js", "ts", "sh",
];

/// Register the document toolkit
pub fn register_document_tools(registry: &mut ToolRegistry) {
    registry.register_with_categories(ExtractDocumentTool, vec!["document".to_string()]);
}

async fn fetch_url(url: &str) -> Result<String> {
    let response = http::client().get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        bail!("HTTP error {} fetching {}", status, url);
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_lowercase())
        .unwrap_or_else(|| "text/plain".to_string());

    if content_type.contains("html") {
        let body = response.text().await?;
        Ok(http::html_to_text(&body))
    } else if content_type.contains("json") {
        let body: serde_json::Value = response.json().await?;
        Ok(serde_json::to_string_pretty(&body)?)
    } else if content_type.starts_with("text/") || content_type.contains("xml") {
        Ok(response.text().await?)
    } else {
        bail!("Unsupported content type '{}' at {}", content_type, url)
    }
}

fn read_local(path: &Path) -> Result<String> {
    if !path.exists() {
        bail!("File not found: {}", path.display());
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "html" | "htm" => {
            let html = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Ok(http::html_to_text(&html))
        }
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => excel::render_workbook(path),
        ext if TEXT_EXTENSIONS.contains(&ext) || ext.is_empty() => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        other => {
            // Unknown extension: accept it only when it is valid UTF-8 text
            let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
            String::from_utf8(bytes)
                .map_err(|_| anyhow::anyhow!("Unsupported document format: '.{}'", other))
        }
    }
}

/// Extract readable content from a URL or a local file
pub async fn extract_document(document_path: &str, context: &ToolContext) -> Result<String> {
    let trimmed = document_path.trim();
    let content = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        fetch_url(trimmed).await?
    } else {
        let path = context.resolve_path(trimmed);
        tokio::task::spawn_blocking(move || read_local(&path)).await??
    };
    Ok(http::limit_chars(content, MAX_DOCUMENT_CHARS))
}

/// Web page or local document contents as text
pub struct ExtractDocumentTool;

#[async_trait]
impl Tool for ExtractDocumentTool {
    fn name(&self) -> &str {
        "extract_document_content"
    }

    fn description(&self) -> &str {
        "Extract the content of a given document (or URL) and return the processed text. Supports web pages, text, markdown, JSON, CSV, HTML and spreadsheet files."
    }

    fn parameters(&self) -> HashMap<String, ParameterDefinition> {
        HashMap::from([param!(
            "document_path",
            "string",
            "The path of the document to be processed, either a local path or a URL.",
            required
        )])
    }

    async fn execute(&self, params: ToolParameters, context: &ToolContext) -> ToolResult {
        let document_path = match params.get_required::<String>("document_path") {
            Ok(path) => path,
            Err(e) => return ToolResult::error(e.to_string()),
        };
        log::debug!("extracting document {}", document_path);

        match extract_document(&document_path, context).await {
            Ok(content) => ToolResult::success(content),
            Err(e) => ToolResult::error(format!("Failed to extract document content: {:#}", e)),
        }
    }
}
