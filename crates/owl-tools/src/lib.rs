//! Concrete toolkits exposed to owl agents.
//!
//! Each toolkit module provides its tools plus a `register_*` helper that adds
//! them to a [`ToolRegistry`] under the toolkit's category.

use std::path::Path;

use anyhow::{bail, Result};
use owl_toolcore::ToolRegistry;

pub mod code_execution;
pub mod document;
pub mod excel;
pub mod file_write;
mod http;
pub mod search;
pub mod sec;

pub use code_execution::{register_code_execution_tools, ExecuteCodeTool};
pub use document::{register_document_tools, ExtractDocumentTool};
pub use excel::{register_excel_tools, ExtractExcelTool};
pub use file_write::{register_file_write_tools, WriteToFileTool};
pub use http::html_to_text;
pub use search::{register_search_tools, DuckDuckGoSearchTool, GoogleSearchTool, WikipediaSearchTool};
pub use sec::{register_sec_tools, FilingForm, SecFilingTool};

/// Toolkit names accepted by [`build_registry`]
pub const TOOLKIT_NAMES: &[&str] = &["search", "document", "excel", "code", "file_write", "sec"];

/// Toolkits enabled when none are requested explicitly
pub const DEFAULT_TOOLKITS: &[&str] = &["search", "document", "excel", "code", "file_write"];

/// Build a registry holding the named toolkits
///
/// `output_dir` is where `write_to_file` places its files.
pub fn build_registry<S: AsRef<str>>(toolkits: &[S], output_dir: &Path) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    for name in toolkits {
        match name.as_ref().trim() {
            "search" => register_search_tools(&mut registry),
            "document" => register_document_tools(&mut registry),
            "excel" => register_excel_tools(&mut registry),
            "code" | "code_execution" => register_code_execution_tools(&mut registry),
            "file_write" | "file" => register_file_write_tools(&mut registry, output_dir),
            "sec" => register_sec_tools(&mut registry),
            "" => {}
            other => bail!(
                "Unknown toolkit '{}'. Available toolkits: {}",
                other,
                TOOLKIT_NAMES.join(", ")
            ),
        }
    }
    Ok(registry)
}

/// Registry with every toolkit enabled
pub fn full_registry(output_dir: &Path) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    register_search_tools(&mut registry);
    register_document_tools(&mut registry);
    register_excel_tools(&mut registry);
    register_code_execution_tools(&mut registry);
    register_file_write_tools(&mut registry, output_dir);
    register_sec_tools(&mut registry);
    registry
}
