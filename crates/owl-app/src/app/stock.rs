//! Stock analysis: a financial analyst instructs an investment advisor that
//! researches the company, summarises its SEC filings and writes a report.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Local;
use colored::Colorize;
use owl_agents::{run_society, ChatAgent};
use owl_llm_api::{ChatMessage, LlmClient};
use owl_toolcore::{param, ParameterDefinition, Tool, ToolContext, ToolParameters, ToolRegistry, ToolResult};

use crate::app::setup::{self, Roles};
use crate::artifacts::{save_run_artifacts, slugify};
use crate::config::{society_clients, OwlConfig};

pub const STOCK_SYSTEM_PROMPT: &str = "You are an advanced Stock Analysis Assistant powered by OWL multi-agent technology.
Your primary task is to provide comprehensive, detailed and specific stock investment recommendations with practical analysis and actionable advice.

Current Analysis Date: {date}

OUTPUT REQUIREMENTS:

1. DETAIL: Do not summarize or truncate. Provide complete information with sections, subsections and extensive details.
2. COMPANY FOCUS: Cover company background, business model, management, competitive landscape, market position and growth prospects.
3. STOCK DATA: Analyse performance metrics, financial ratios, valuation, historical price movements and trading volumes, including earnings reports, balance sheets and cash flow statements.
4. NO TRUNCATION: Never cut a response off with '...'. Always finish the thought.
5. STRUCTURE: Use clear headings, bullet points and numbered lists.
6. STRATEGIES: Give several investment approaches, risk assessments, entry/exit points and position sizing.
7. FILES: Save the report as a well-formatted file, and include the full content in your response as well.";

pub const SEC_SYSTEM_PROMPT: &str = "You are an SEC Financial Data Analysis Assistant.
Your task is to retrieve and analyse quarterly (10-Q) and annual (10-K) SEC filings and report detailed insights.

1. DATA RETRIEVAL: fetch the filings and extract key financial metrics and disclosures.
2. FINANCIAL ANALYSIS: income statement, balance sheet and cash flow analysis; key ratios; quarter-over-quarter and year-over-year changes.
3. REPORTING: present data in clear structures, highlight significant changes and trends, flag concerning patterns.
4. CONTEXT: compare against industry benchmarks, identify red flags, evaluate management commentary and risk factors.

Always keep data accurate and complete, and explain significant findings.";

/// Task handed to the society for `company`
pub fn stock_task_prompt(company: &str) -> String {
    let system = STOCK_SYSTEM_PROMPT.replace("{date}", &Local::now().format("%Y-%m-%d").to_string());
    format!(
        "{system}

Task: Generate a comprehensive investment analysis report for {company}.
Requirements:
1. Research and collect company information:
   - Use search tools to gather company background, industry position and recent news
   - Use the SEC summary tool to obtain financial statements and regulatory filings
   - Analyse key financial metrics and performance indicators

2. Write a detailed markdown report with these sections:
   - Company Overview and Business Model
   - Industry Analysis and Market Position
   - Financial Analysis (last 3-5 years): revenue and profit trends, balance sheet, cash flow, key ratios
   - Risk Assessment
   - Investment Recommendation

3. Report format:
   - Professional markdown with data tables and key metrics
   - At least 2000 words
   - You MUST use the write_to_file tool to save the report as '{company}_investment_analysis.md'
   - Confirm the file has been written before completing the task"
    )
}

/// Runs a dedicated SEC analyst agent and returns its filing summary
pub struct SecSummaryTool {
    client: Arc<dyn LlmClient>,
    sec_tools: Arc<ToolRegistry>,
}

impl SecSummaryTool {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        let mut registry = ToolRegistry::new();
        owl_tools::register_sec_tools(&mut registry);
        Self::with_registry(client, registry)
    }

    pub fn with_registry(client: Arc<dyn LlmClient>, sec_tools: ToolRegistry) -> Self {
        Self {
            client,
            sec_tools: Arc::new(sec_tools),
        }
    }

    fn request(company: &str) -> String {
        format!(
            "Please search and analyze the SEC filings for {company} and provide a comprehensive summary report. The report should:

1. Include key financial metrics and performance indicators from recent quarterly and annual reports
2. Highlight significant business developments, risks, and market position
3. Analyze management's discussion and strategic initiatives
4. Note any material changes in operations or financial condition
5. Summarize important regulatory disclosures and compliance matters

Keep the report clear and concise, no more than 10,000 words, focused on what matters most to investors."
        )
    }
}

#[async_trait]
impl Tool for SecSummaryTool {
    fn name(&self) -> &str {
        "get_sec_summary_for_company"
    }

    fn description(&self) -> &str {
        "Retrieve and analyze the SEC 10-K and 10-Q filings of a company and return a structured analysis report."
    }

    fn parameters(&self) -> HashMap<String, ParameterDefinition> {
        HashMap::from([param!(
            "company_stock_name",
            "string",
            "Company stock symbol, e.g. 'AAPL' for Apple Inc.",
            required
        )])
    }

    async fn execute(&self, params: ToolParameters, context: &ToolContext) -> ToolResult {
        let company = match params.get_required::<String>("company_stock_name") {
            Ok(company) => company,
            Err(e) => return ToolResult::error(e.to_string()),
        };

        let mut agent = ChatAgent::new("sec_analyst", SEC_SYSTEM_PROMPT, self.client.clone())
            .with_tools(self.sec_tools.clone(), context.clone());
        match agent.step(&ChatMessage::user(Self::request(&company))).await {
            Ok(response) if !response.content().trim().is_empty() => {
                ToolResult::success(response.content().to_string())
            }
            Ok(_) => ToolResult::error(format!("SEC analyst returned no summary for {}", company)),
            Err(e) => ToolResult::error(format!("SEC analysis failed: {:#}", e)),
        }
    }
}

/// Registry for the investment advisor: file writing, search and SEC summaries
pub fn stock_registry(config: &OwlConfig, client: Arc<dyn LlmClient>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    owl_tools::register_file_write_tools(&mut registry, &config.output_dir);
    owl_tools::register_search_tools(&mut registry);
    registry.register_with_categories(SecSummaryTool::new(client), vec!["finance".to_string()]);
    registry
}

pub async fn run_stock_mode(mut config: OwlConfig, company: String, round_limit: usize) -> Result<()> {
    config.round_limit = round_limit;
    config.validate()?;

    setup::print_banner("Stock Analysis", &config);
    println!("{}", format!("Company: {}", company).bright_yellow());

    let (user_client, assistant_client) = society_clients(&config)?;
    let registry = Arc::new(stock_registry(&config, assistant_client.clone()));
    let logger = setup::open_logger(&config.work_dir, "owl-stock").await;

    let task = stock_task_prompt(&company);
    let mut society = setup::build_society(
        &config,
        &task,
        (user_client, assistant_client),
        Some(registry),
        Roles {
            user: "financial_analyst",
            assistant: "investment_advisor",
        },
        logger.clone(),
    )?;

    let started = std::time::Instant::now();
    let result = run_society(&mut society, config.round_limit).await;
    setup::close_logger(logger).await;
    let result = result?;
    log::info!(
        "stock report for {} finished in {:.2}s",
        company,
        started.elapsed().as_secs_f64()
    );

    setup::print_result(&result);
    let (history, _) = save_run_artifacts(&config.output_dir, &slugify(&company, 40), &task, &result)?;
    println!("{}", format!("Records saved to {}", history.display()).green());

    let report = config.output_dir.join(format!("{}_investment_analysis.md", company));
    if report.exists() {
        println!("{}", format!("Report: {}", report.display()).green());
    } else {
        println!("{}", "The advisor did not write a report file".yellow());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use owl_llm_api::mock::ScriptedLlmClient;

    #[test]
    fn test_stock_task_prompt() {
        let prompt = stock_task_prompt("Tesla");
        assert!(prompt.contains("investment analysis report for Tesla"));
        assert!(prompt.contains("'Tesla_investment_analysis.md'"));
        assert!(!prompt.contains("{date}"));
    }

    #[test]
    fn test_stock_registry_tools() {
        let dir = tempfile::tempdir().unwrap();
        let config = OwlConfig {
            output_dir: dir.path().to_path_buf(),
            ..OwlConfig::default()
        };
        let registry = stock_registry(&config, Arc::new(ScriptedLlmClient::new()));
        assert!(registry.has_tool("write_to_file"));
        assert!(registry.has_tool("search_wiki"));
        assert!(registry.has_tool("get_sec_summary_for_company"));
    }

    #[tokio::test]
    async fn test_sec_summary_returns_agent_reply() {
        let client = Arc::new(ScriptedLlmClient::new());
        client.push_text("Revenue grew 12% year over year.");
        let tool = SecSummaryTool::with_registry(client.clone(), ToolRegistry::new());

        let params = ToolParameters::from_json(r#"{"company_stock_name": "GOOG"}"#).unwrap();
        let result = tool.execute(params, &ToolContext::default()).await;
        assert!(result.success);
        assert_eq!(result.content, "Revenue grew 12% year over year.");

        let calls = client.calls();
        assert_eq!(calls[0].messages[0].role, "system");
        assert!(calls[0].messages[1].content.contains("SEC filings for GOOG"));
    }

    #[tokio::test]
    async fn test_sec_summary_reports_failure() {
        let client = Arc::new(ScriptedLlmClient::new());
        client.push_error("quota exceeded");
        let tool = SecSummaryTool::with_registry(client, ToolRegistry::new());
        let params = ToolParameters::from_json(r#"{"company_stock_name": "GOOG"}"#).unwrap();
        let result = tool.execute(params, &ToolContext::default()).await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("quota exceeded"));
    }
}
