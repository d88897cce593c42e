use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use owl_toolcore::{param, ParameterDefinition, Tool, ToolContext, ToolParameters, ToolRegistry, ToolResult};

/// Register the file write toolkit, writing below `output_dir`
pub fn register_file_write_tools(registry: &mut ToolRegistry, output_dir: &Path) {
    registry.register_with_categories(WriteToFileTool::new(output_dir), vec!["file".to_string()]);
}

/// Writes files confined to an output directory
pub struct WriteToFileTool {
    output_dir: PathBuf,
}

impl WriteToFileTool {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Map `filename` into the output dir, refusing anything that could leave it
    pub fn target_path(&self, filename: &str) -> Result<PathBuf> {
        let relative = Path::new(filename.trim());
        if filename.trim().is_empty() {
            bail!("Filename must not be empty");
        }
        for component in relative.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                Component::ParentDir => bail!("Path '{}' escapes the output directory", filename),
                Component::RootDir | Component::Prefix(_) => {
                    bail!("Absolute paths are not allowed: '{}'", filename)
                }
            }
        }
        Ok(self.output_dir.join(relative))
    }

    fn prepare_content(path: &Path, content: String) -> String {
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if is_json {
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(&content) {
                if let Ok(pretty) = serde_json::to_string_pretty(&value) {
                    return pretty;
                }
            }
        }
        content
    }

    async fn write(&self, filename: &str, content: String) -> Result<PathBuf> {
        let path = self.target_path(filename)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        let content = Self::prepare_content(&path, content);
        tokio::fs::write(&path, content)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }
}

#[async_trait]
impl Tool for WriteToFileTool {
    fn name(&self) -> &str {
        "write_to_file"
    }

    fn description(&self) -> &str {
        "Write the given content to a file in the output directory. Creates missing directories; JSON content is pretty-printed."
    }

    fn parameters(&self) -> HashMap<String, ParameterDefinition> {
        HashMap::from([
            param!("filename", "string", "The name of the file, relative to the output directory.", required),
            param!("content", "string", "The content to write to the file.", required),
        ])
    }

    async fn execute(&self, params: ToolParameters, _context: &ToolContext) -> ToolResult {
        let filename = match params.get_required::<String>("filename") {
            Ok(filename) => filename,
            Err(e) => return ToolResult::error(e.to_string()),
        };
        let content = match params.get_required::<String>("content") {
            Ok(content) => content,
            Err(e) => return ToolResult::error(e.to_string()),
        };

        match self.write(&filename, content).await {
            Ok(path) => ToolResult::success(format!("Content successfully written to file: {}", path.display())),
            Err(e) => ToolResult::error(format!("{:#}", e)),
        }
    }
}
