use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use calamine::{open_workbook_auto, Data, Reader};
use owl_toolcore::{param, ParameterDefinition, Tool, ToolContext, ToolParameters, ToolRegistry, ToolResult};

/// Register the spreadsheet toolkit
pub fn register_excel_tools(registry: &mut ToolRegistry) {
    registry.register_with_categories(ExtractExcelTool, vec!["document".to_string()]);
}

/// A named table of cell strings
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(|r| r.len()).max().unwrap_or(0)
    }
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}

fn escape_cell(cell: &str) -> String {
    cell.replace('|', "\\|").replace(['\r', '\n'], " ")
}

/// Render rows as a Markdown table; the first row is the header
pub fn rows_to_markdown(rows: &[Vec<String>]) -> String {
    let columns = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    if rows.is_empty() || columns == 0 {
        return "(empty sheet)".to_string();
    }

    let render_row = |row: &Vec<String>| {
        let cells: Vec<String> = (0..columns)
            .map(|i| escape_cell(row.get(i).map(String::as_str).unwrap_or("")))
            .collect();
        format!("| {} |", cells.join(" | "))
    };

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(render_row(&rows[0]));
    lines.push(format!("|{}", " --- |".repeat(columns)));
    lines.extend(rows[1..].iter().map(render_row));
    lines.join("\n")
}

/// Load every sheet of a spreadsheet or CSV file
pub fn load_sheets(path: &Path) -> Result<Vec<Sheet>> {
    if !path.exists() {
        bail!("File not found: {}", path.display());
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "csv" | "tsv" => {
            let delimiter = if extension == "tsv" { b'\t' } else { b',' };
            let mut reader = csv::ReaderBuilder::new()
                .has_headers(false)
                .flexible(true)
                .delimiter(delimiter)
                .from_path(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            let mut rows = Vec::new();
            for record in reader.records() {
                let record = record.with_context(|| format!("Failed to parse {}", path.display()))?;
                rows.push(record.iter().map(|c| c.to_string()).collect());
            }
            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("Sheet1")
                .to_string();
            Ok(vec![Sheet { name, rows }])
        }
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => {
            let mut workbook = open_workbook_auto(path)
                .with_context(|| format!("Failed to open workbook {}", path.display()))?;
            let mut sheets = Vec::new();
            for name in workbook.sheet_names() {
                let range = workbook
                    .worksheet_range(&name)
                    .with_context(|| format!("Failed to read sheet '{}'", name))?;
                let rows = range.rows().map(|row| row.iter().map(cell_to_string).collect()).collect();
                sheets.push(Sheet { name, rows });
            }
            Ok(sheets)
        }
        other => bail!("Unsupported spreadsheet format: '{}'", other),
    }
}

/// Describe every sheet as a Markdown table with its dimensions
pub fn render_workbook(path: &Path) -> Result<String> {
    let sheets = load_sheets(path)?;
    let sections: Vec<String> = sheets
        .iter()
        .map(|sheet| {
            format!(
                "Sheet Name: {}\nRows: {}, Columns: {}\n\n{}\n",
                sheet.name,
                sheet.rows.len(),
                sheet.column_count(),
                rows_to_markdown(&sheet.rows)
            )
        })
        .collect();
    Ok(sections.join("\n----\n\n"))
}

/// Spreadsheet contents as Markdown
pub struct ExtractExcelTool;

#[async_trait]
impl Tool for ExtractExcelTool {
    fn name(&self) -> &str {
        "extract_excel_content"
    }

    fn description(&self) -> &str {
        "Extract detailed cell information from an Excel (.xlsx/.xls/.ods) or CSV file, including all sheets rendered as Markdown tables."
    }

    fn parameters(&self) -> HashMap<String, ParameterDefinition> {
        HashMap::from([param!("document_path", "string", "The path of the spreadsheet file.", required)])
    }

    async fn execute(&self, params: ToolParameters, context: &ToolContext) -> ToolResult {
        let document_path = match params.get_required::<String>("document_path") {
            Ok(path) => path,
            Err(e) => return ToolResult::error(e.to_string()),
        };
        let path = context.resolve_path(&document_path);

        let rendered = tokio::task::spawn_blocking(move || render_workbook(&path)).await;
        match rendered {
            Ok(Ok(content)) => ToolResult::success(content),
            Ok(Err(e)) => ToolResult::error(format!("Failed to process spreadsheet: {:#}", e)),
            Err(e) => ToolResult::error(format!("Spreadsheet task failed: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_pads_ragged_rows() {
        let rows = vec![
            vec!["name".to_string(), "qty".to_string()],
            vec!["apple".to_string()],
            vec!["a|b".to_string(), "2".to_string()],
        ];
        let md = rows_to_markdown(&rows);
        assert_eq!(
            md,
            "| name | qty |\n| --- | --- |\n| apple |  |\n| a\\|b | 2 |"
        );
    }

    #[test]
    fn test_empty_sheet() {
        assert_eq!(rows_to_markdown(&[]), "(empty sheet)");
    }

    #[test]
    fn test_float_cells_drop_trailing_zero() {
        assert_eq!(cell_to_string(&Data::Float(3.0)), "3");
        assert_eq!(cell_to_string(&Data::Float(2.5)), "2.5");
        assert_eq!(cell_to_string(&Data::Empty), "");
    }
}
