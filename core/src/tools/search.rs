use crate::config::SearchConfig;
use crate::tools::{resolve_api_key, truncate_chars};
use crate::traits::{Tool, ToolKind, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

/// Upper bound on results handed back to the engine.
pub const MAX_RESULTS: usize = 3;
const SNIPPET_MAX_CHARS: usize = 400;
const TAVILY_URL: &str = "https://api.tavily.com/search";

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

/// Web search backed by the Tavily API.
pub struct SearchTool {
    client: reqwest::Client,
    api_key: Option<String>,
    max_results: usize,
    endpoint: String,
}

impl SearchTool {
    pub fn new(api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            max_results: MAX_RESULTS,
            endpoint: TAVILY_URL.to_string(),
        }
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        let api_key = resolve_api_key(&["TAVILY_API_KEY", "TRIPWISE_TAVILY_API_KEY"], &config.api_key);
        Self::new(api_key).with_max_results(config.max_results)
    }

    /// Values above [`MAX_RESULTS`] are clamped.
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results.clamp(1, MAX_RESULTS);
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn search(&self, api_key: &str, query: &str) -> ToolResult {
        let body = serde_json::json!({
            "api_key": api_key,
            "query": query,
            "max_results": self.max_results,
            "search_depth": "basic"
        });

        let response = match self.client.post(&self.endpoint).json(&body).send().await {
            Ok(r) => r,
            Err(e) => return ToolResult::failure(format!("Search request failed: {}", e)),
        };

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return ToolResult::failure(format!(
                "Search API error {}: {}",
                status,
                truncate_chars(&error_text, SNIPPET_MAX_CHARS)
            ));
        }

        let parsed: TavilyResponse = match response.json().await {
            Ok(r) => r,
            Err(e) => return ToolResult::failure(format!("Failed to parse search response: {}", e)),
        };

        debug!(query, results = parsed.results.len(), "search completed");
        ToolResult::success(format_results(&parsed.results, self.max_results))
    }
}

fn format_results(results: &[TavilyResult], max_results: usize) -> String {
    if results.is_empty() {
        return "No results found".to_string();
    }

    results
        .iter()
        .take(max_results)
        .enumerate()
        .map(|(i, r)| {
            let title = if r.title.is_empty() { "(no title)" } else { &r.title };
            format!(
                "{}. {}\n   {}\n   {}",
                i + 1,
                title,
                r.url,
                truncate_chars(r.content.trim(), SNIPPET_MAX_CHARS)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[async_trait]
impl Tool for SearchTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Search
    }

    async fn execute(&self, input: &str) -> anyhow::Result<ToolResult> {
        let query = input.trim().trim_matches('"').trim();
        if query.is_empty() {
            return Ok(ToolResult::failure(
                "Search error: empty query. Provide the text to search for as Action Input.",
            ));
        }

        let Some(api_key) = self.api_key.as_deref() else {
            return Ok(ToolResult::failure(
                "Search error: no search API key configured (set TAVILY_API_KEY). Continue with what you already know.",
            ));
        };

        Ok(self.search(api_key, query).await)
    }
}
