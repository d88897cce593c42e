use std::collections::HashMap;
use std::sync::OnceLock;

use anyhow::{bail, Result};
use async_trait::async_trait;
use owl_toolcore::{param, ParameterDefinition, Tool, ToolContext, ToolParameters, ToolRegistry, ToolResult};
use regex::Regex;
use serde_json::{json, Value};

use crate::http;

const SEC_API_URL: &str = "https://api.sec-api.io";
const DEFAULT_SEC_USER_AGENT: &str = "owl-research-agent admin@localhost";

/// Register the SEC filings toolkit
pub fn register_sec_tools(registry: &mut ToolRegistry) {
    registry.register_with_categories(SecFilingTool::new(FilingForm::Annual), vec!["finance".to_string()]);
    registry.register_with_categories(SecFilingTool::new(FilingForm::Quarterly), vec!["finance".to_string()]);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilingForm {
    /// 10-K
    Annual,
    /// 10-Q
    Quarterly,
}

impl FilingForm {
    pub fn form_type(&self) -> &'static str {
        match self {
            Self::Annual => "10-K",
            Self::Quarterly => "10-Q",
        }
    }
}

fn disallowed_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-zA-Z$0-9\s]").expect("static regex is valid"))
}

/// Keep only ASCII letters, digits, `$` and whitespace
pub fn clean_filing_text(text: &str) -> String {
    disallowed_chars().replace_all(text, "").into_owned()
}

/// Fetches the latest 10-K or 10-Q filing for a ticker via SEC-API
pub struct SecFilingTool {
    form: FilingForm,
    query_url: String,
}

impl SecFilingTool {
    pub fn new(form: FilingForm) -> Self {
        Self::with_query_url(form, SEC_API_URL)
    }

    pub fn with_query_url(form: FilingForm, query_url: impl Into<String>) -> Self {
        Self {
            form,
            query_url: query_url.into(),
        }
    }

    fn query_body(&self, stock_name: &str) -> Value {
        json!({
            "query": {
                "query_string": {
                    "query": format!("ticker:{} AND formType:\"{}\"", stock_name, self.form.form_type())
                }
            },
            "from": "0",
            "size": "1",
            "sort": [{"filedAt": {"order": "desc"}}]
        })
    }

    async fn fetch(&self, stock_name: &str, api_key: &str, user_agent: &str) -> Result<Option<String>> {
        let client = http::client();
        let response = client
            .post(&self.query_url)
            .query(&[("token", api_key)])
            .json(&self.query_body(stock_name))
            .send()
            .await?;
        if !response.status().is_success() {
            bail!("SEC-API query returned HTTP {}", response.status());
        }
        let body: Value = response.json().await?;

        let Some(url) = body["filings"][0]["linkToFilingDetails"].as_str() else {
            return Ok(None);
        };

        let filing = client.get(url).header("User-Agent", user_agent).send().await?;
        if !filing.status().is_success() {
            bail!("HTTP error {} downloading {}", filing.status(), url);
        }
        let html = filing.text().await?;
        Ok(Some(clean_filing_text(&http::html_to_text(&html))))
    }
}

#[async_trait]
impl Tool for SecFilingTool {
    fn name(&self) -> &str {
        match self.form {
            FilingForm::Annual => "fetch_10k_filing",
            FilingForm::Quarterly => "fetch_10q_filing",
        }
    }

    fn description(&self) -> &str {
        match self.form {
            FilingForm::Annual => "Fetch the latest 10-K (annual report) filing for a stock ticker and return its cleaned text content.",
            FilingForm::Quarterly => "Fetch the latest 10-Q (quarterly report) filing for a stock ticker and return its cleaned text content.",
        }
    }

    fn parameters(&self) -> HashMap<String, ParameterDefinition> {
        HashMap::from([param!(
            "stock_name",
            "string",
            "The stock ticker symbol (e.g., 'AAPL' for Apple Inc.).",
            required
        )])
    }

    async fn execute(&self, params: ToolParameters, context: &ToolContext) -> ToolResult {
        let stock_name = match params.get_required::<String>("stock_name") {
            Ok(name) => name.trim().to_uppercase(),
            Err(e) => return ToolResult::error(e.to_string()),
        };
        let Some(api_key) = context.env_var("SEC_API_API_KEY") else {
            return ToolResult::error(format!("SEC_API_API_KEY must be set to use {}", self.name()));
        };
        let user_agent = context
            .env_var("SEC_USER_AGENT")
            .unwrap_or_else(|| DEFAULT_SEC_USER_AGENT.to_string());

        match self.fetch(&stock_name, &api_key, &user_agent).await {
            Ok(Some(text)) => ToolResult::success(text),
            Ok(None) => ToolResult::error(format!(
                "No {} filings found for {}",
                self.form.form_type(),
                stock_name
            )),
            Err(e) => ToolResult::error(format!("Error fetching {} filing: {}", self.form.form_type(), e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_filing_text() {
        assert_eq!(
            clean_filing_text("Revenue: $1,234.5 (up 10%)\n— note"),
            "Revenue $12345 up 10\n note"
        );
    }

    #[test]
    fn test_query_body() {
        let tool = SecFilingTool::new(FilingForm::Quarterly);
        let body = tool.query_body("GOOG");
        assert_eq!(
            body["query"]["query_string"]["query"],
            "ticker:GOOG AND formType:\"10-Q\""
        );
        assert_eq!(body["size"], "1");
    }
}
