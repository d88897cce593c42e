use std::collections::HashMap;

use async_trait::async_trait;
use owl_toolcore::{param, ParameterDefinition, Tool, ToolContext, ToolParameters, ToolRegistry, ToolResult};
use serde_json::{json, Value};

use crate::http;

const WIKIPEDIA_BASE: &str = "https://en.wikipedia.org";
const DUCKDUCKGO_BASE: &str = "https://api.duckduckgo.com";
const GOOGLE_SEARCH_URL: &str = "https://www.googleapis.com/customsearch/v1";

/// Register the search toolkit
pub fn register_search_tools(registry: &mut ToolRegistry) {
    let category = || vec!["search".to_string()];
    registry.register_with_categories(WikipediaSearchTool::default(), category());
    registry.register_with_categories(DuckDuckGoSearchTool::default(), category());
    registry.register_with_categories(GoogleSearchTool::default(), category());
}

/// Wikipedia page summaries
pub struct WikipediaSearchTool {
    base_url: String,
}

impl Default for WikipediaSearchTool {
    fn default() -> Self {
        Self::with_base_url(WIKIPEDIA_BASE)
    }
}

impl WikipediaSearchTool {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn similar_titles(&self, client: &reqwest::Client, entity: &str) -> Vec<String> {
        let url = format!(
            "{}/w/api.php?action=opensearch&search={}&limit=5&namespace=0&format=json",
            self.base_url,
            urlencoding::encode(entity)
        );
        let response = match client.get(&url).send().await {
            Ok(response) if response.status().is_success() => response,
            _ => return Vec::new(),
        };
        match response.json::<Value>().await {
            Ok(body) => body[1]
                .as_array()
                .map(|titles| titles.iter().filter_map(|t| t.as_str().map(String::from)).collect())
                .unwrap_or_default(),
            Err(_) => Vec::new(),
        }
    }

    async fn search(&self, entity: &str) -> anyhow::Result<String> {
        let client = http::client();
        let title = entity.trim().replace(' ', "_");
        let url = format!(
            "{}/api/rest_v1/page/summary/{}",
            self.base_url,
            urlencoding::encode(&title)
        );

        let response = client.get(&url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            let similar = self.similar_titles(&client, entity).await;
            let mut message = format!(
                "There is no page in Wikipedia corresponding to entity {}, please specify another word to describe the entity to be searched.",
                entity
            );
            if !similar.is_empty() {
                message.push_str(&format!(" Similar entities: {}", similar.join(", ")));
            }
            return Ok(message);
        }
        if !status.is_success() {
            anyhow::bail!("Wikipedia returned HTTP {}", status);
        }

        let body: Value = response.json().await?;
        if body["type"] == "disambiguation" {
            let options = self.similar_titles(&client, entity).await;
            return Ok(format!(
                "The entity {} is ambiguous, try one of: {}",
                entity,
                options.join(", ")
            ));
        }

        let extract = body["extract"].as_str().unwrap_or_default();
        if extract.is_empty() {
            return Ok(format!("Wikipedia has no summary for {}.", entity));
        }
        Ok(extract.to_string())
    }
}

#[async_trait]
impl Tool for WikipediaSearchTool {
    fn name(&self) -> &str {
        "search_wiki"
    }

    fn description(&self) -> &str {
        "Search the entity in WikiPedia and return the summary of the required page, containing factual information about the given entity."
    }

    fn parameters(&self) -> HashMap<String, ParameterDefinition> {
        HashMap::from([param!("entity", "string", "The entity to be searched.", required)])
    }

    async fn execute(&self, params: ToolParameters, _context: &ToolContext) -> ToolResult {
        let entity = match params.get_required::<String>("entity") {
            Ok(entity) => entity,
            Err(e) => return ToolResult::error(e.to_string()),
        };

        match self.search(&entity).await {
            Ok(summary) => ToolResult::success(summary),
            Err(e) => ToolResult::error(format!("Wikipedia search failed: {}", e)),
        }
    }
}

/// DuckDuckGo Instant Answer search
pub struct DuckDuckGoSearchTool {
    base_url: String,
}

impl Default for DuckDuckGoSearchTool {
    fn default() -> Self {
        Self::with_base_url(DUCKDUCKGO_BASE)
    }
}

impl DuckDuckGoSearchTool {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn collect_topics(topics: &Value, out: &mut Vec<(String, String)>) {
        for topic in topics.as_array().into_iter().flatten() {
            if let (Some(text), Some(url)) = (topic["Text"].as_str(), topic["FirstURL"].as_str()) {
                out.push((text.to_string(), url.to_string()));
            } else if topic.get("Topics").is_some() {
                Self::collect_topics(&topic["Topics"], out);
            }
        }
    }

    fn parse_results(body: &Value, max_results: usize) -> Vec<Value> {
        let mut entries = Vec::new();

        let abstract_text = body["AbstractText"].as_str().unwrap_or_default();
        if !abstract_text.is_empty() {
            entries.push(json!({
                "title": body["Heading"].as_str().unwrap_or_default(),
                "description": abstract_text,
                "url": body["AbstractURL"].as_str().unwrap_or_default(),
            }));
        }

        let mut topics = Vec::new();
        Self::collect_topics(&body["RelatedTopics"], &mut topics);
        for (text, url) in topics {
            let title = text.split(" - ").next().unwrap_or(&text).to_string();
            entries.push(json!({"title": title, "description": text, "url": url}));
        }

        entries
            .into_iter()
            .take(max_results)
            .enumerate()
            .map(|(i, mut entry)| {
                entry["result_id"] = json!(i + 1);
                entry
            })
            .collect()
    }

    async fn search(&self, query: &str, max_results: usize) -> anyhow::Result<Vec<Value>> {
        let url = format!(
            "{}/?q={}&format=json&no_html=1&skip_disambig=1",
            self.base_url,
            urlencoding::encode(query)
        );
        let response = http::client().get(&url).send().await?;
        if !response.status().is_success() {
            anyhow::bail!("DuckDuckGo returned HTTP {}", response.status());
        }
        let body: Value = response.json().await?;
        Ok(Self::parse_results(&body, max_results))
    }
}

#[async_trait]
impl Tool for DuckDuckGoSearchTool {
    fn name(&self) -> &str {
        "search_duckduckgo"
    }

    fn description(&self) -> &str {
        "Use DuckDuckGo search engine to search information for the given query. Returns a list of results with title, description and url."
    }

    fn parameters(&self) -> HashMap<String, ParameterDefinition> {
        HashMap::from([
            param!("query", "string", "The query to be searched.", required),
            param!("max_results", "integer", "Max number of results.", optional, 5),
        ])
    }

    async fn execute(&self, params: ToolParameters, _context: &ToolContext) -> ToolResult {
        let query = match params.get_required::<String>("query") {
            Ok(query) => query,
            Err(e) => return ToolResult::error(e.to_string()),
        };
        let max_results = params.get_optional::<usize>("max_results").unwrap_or(None).unwrap_or(5);

        match self.search(&query, max_results).await {
            Ok(results) if results.is_empty() => {
                ToolResult::success(format!("No results found for '{}'.", query))
            }
            Ok(results) => ToolResult::success(Value::Array(results).to_string()),
            Err(e) => ToolResult::error(format!("DuckDuckGo search failed: {}", e)),
        }
    }
}

/// Google Custom Search; needs `GOOGLE_API_KEY` and `SEARCH_ENGINE_ID`
pub struct GoogleSearchTool {
    endpoint: String,
}

impl Default for GoogleSearchTool {
    fn default() -> Self {
        Self::with_endpoint(GOOGLE_SEARCH_URL)
    }
}

impl GoogleSearchTool {
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    fn parse_items(body: &Value) -> Vec<Value> {
        body["items"]
            .as_array()
            .into_iter()
            .flatten()
            .enumerate()
            .map(|(i, item)| {
                let long_description = item["pagemap"]["metatags"][0]["og:description"]
                    .as_str()
                    .unwrap_or("N/A");
                json!({
                    "result_id": i + 1,
                    "title": item["title"].as_str().unwrap_or_default(),
                    "description": item["snippet"].as_str().unwrap_or_default(),
                    "long_description": long_description,
                    "url": item["link"].as_str().unwrap_or_default(),
                })
            })
            .collect()
    }
}

#[async_trait]
impl Tool for GoogleSearchTool {
    fn name(&self) -> &str {
        "search_google"
    }

    fn description(&self) -> &str {
        "Use Google search engine to search information for the given query. Returns a list of results with title, description, long description and url."
    }

    fn parameters(&self) -> HashMap<String, ParameterDefinition> {
        HashMap::from([
            param!("query", "string", "The query to be searched.", required),
            param!("num_result_pages", "integer", "The number of result pages to retrieve (max 10).", optional, 5),
        ])
    }

    async fn execute(&self, params: ToolParameters, context: &ToolContext) -> ToolResult {
        let query = match params.get_required::<String>("query") {
            Ok(query) => query,
            Err(e) => return ToolResult::error(e.to_string()),
        };
        let num = params
            .get_optional::<u32>("num_result_pages")
            .unwrap_or(None)
            .unwrap_or(5)
            .clamp(1, 10);

        let (api_key, engine_id) = match (context.env_var("GOOGLE_API_KEY"), context.env_var("SEARCH_ENGINE_ID")) {
            (Some(key), Some(id)) => (key, id),
            _ => {
                return ToolResult::error(
                    "GOOGLE_API_KEY and SEARCH_ENGINE_ID must be set to use search_google".to_string(),
                )
            }
        };

        let num = num.to_string();
        let request = http::client().get(&self.endpoint).query(&[
            ("key", api_key.as_str()),
            ("cx", engine_id.as_str()),
            ("q", query.as_str()),
            ("num", num.as_str()),
        ]);

        let body: Value = match request.send().await {
            Ok(response) => match response.json().await {
                Ok(body) => body,
                Err(e) => return ToolResult::error(format!("Google search returned invalid JSON: {}", e)),
            },
            Err(e) => return ToolResult::error(format!("Google search failed: {}", e)),
        };

        if let Some(message) = body["error"]["message"].as_str() {
            return ToolResult::error(format!("Google search error: {}", message));
        }

        let results = Self::parse_items(&body);
        if results.is_empty() {
            return ToolResult::success(format!("No results found for '{}'.", query));
        }
        ToolResult::success(Value::Array(results).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duckduckgo_parses_nested_topics() {
        let body = json!({
            "Heading": "Rust",
            "AbstractText": "Rust is a language.",
            "AbstractURL": "https://en.wikipedia.org/wiki/Rust",
            "RelatedTopics": [
                {"Text": "Cargo - package manager", "FirstURL": "https://duckduckgo.com/Cargo"},
                {"Name": "Group", "Topics": [
                    {"Text": "Ferris - mascot", "FirstURL": "https://duckduckgo.com/Ferris"}
                ]}
            ]
        });
        let results = DuckDuckGoSearchTool::parse_results(&body, 5);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0]["title"], "Rust");
        assert_eq!(results[1]["title"], "Cargo");
        assert_eq!(results[2]["url"], "https://duckduckgo.com/Ferris");
        assert_eq!(results[2]["result_id"], 3);

        assert_eq!(DuckDuckGoSearchTool::parse_results(&body, 1).len(), 1);
    }

    #[test]
    fn test_google_items_parse() {
        let body = json!({"items": [{
            "title": "Rust",
            "snippet": "A language",
            "link": "https://www.rust-lang.org",
            "pagemap": {"metatags": [{"og:description": "Reliable software"}]}
        }, {
            "title": "Crates",
            "snippet": "Registry",
            "link": "https://crates.io"
        }]});
        let results = GoogleSearchTool::parse_items(&body);
        assert_eq!(results[0]["long_description"], "Reliable software");
        assert_eq!(results[1]["long_description"], "N/A");
        assert_eq!(results[1]["result_id"], 2);
    }

    #[tokio::test]
    async fn test_google_requires_keys() {
        let tool = GoogleSearchTool::with_endpoint("http://127.0.0.1:1/unused");
        let context = ToolContext::default()
            .with_env("GOOGLE_API_KEY", "")
            .with_env("SEARCH_ENGINE_ID", "");
        let params = ToolParameters::from_json(r#"{"query": "rust"}"#).unwrap();
        let result = tool.execute(params, &context).await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("GOOGLE_API_KEY"));
    }
}
