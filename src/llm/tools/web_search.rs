//! 联网搜索工具（Serper）

use rig::tool::Tool;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::generator::capability::WebSearchSettings;

/// 联网搜索工具
#[derive(Debug, Clone)]
pub struct AgentToolWebSearch {
    settings: WebSearchSettings,
    max_results: usize,
    http: reqwest::Client,
}

/// 搜索参数
#[derive(Debug, Deserialize)]
pub struct WebSearchArgs {
    pub query: String,
}

/// 单条搜索结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub snippet: String,
}

#[derive(Debug, Serialize)]
pub struct WebSearchResult {
    pub query: String,
    pub results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SearchHit>,
}

#[derive(Debug, thiserror::Error)]
pub enum WebSearchError {
    #[error("查询内容过短")]
    EmptyQuery,
    #[error("搜索请求失败: {0}")]
    Request(#[from] reqwest::Error),
    #[error("搜索服务返回错误状态: {0}")]
    Status(reqwest::StatusCode),
    #[error("无法解析搜索结果: {0}")]
    Decode(#[from] serde_json::Error),
}

/// 搜索请求共用的 HTTP 客户端
pub fn http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
}

impl AgentToolWebSearch {
    pub fn new(settings: WebSearchSettings, max_results: usize, http: reqwest::Client) -> Self {
        Self {
            settings,
            max_results: max_results.max(1),
            http,
        }
    }

    pub fn settings(&self) -> &WebSearchSettings {
        &self.settings
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, WebSearchError> {
        let response = self
            .http
            .post(&self.settings.endpoint)
            .header("X-API-KEY", &self.settings.api_key)
            .json(&serde_json::json!({ "q": query, "num": self.max_results }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(WebSearchError::Status(response.status()));
        }

        let body = response.text().await?;
        parse_hits(&body, self.max_results)
    }
}

/// 提取 `organic` 结果，最多 `limit` 条
pub fn parse_hits(body: &str, limit: usize) -> Result<Vec<SearchHit>, WebSearchError> {
    let parsed: SerperResponse = serde_json::from_str(body)?;
    Ok(parsed.organic.into_iter().take(limit).collect())
}

impl Tool for AgentToolWebSearch {
    const NAME: &'static str = "web_search";

    type Error = WebSearchError;
    type Args = WebSearchArgs;
    type Output = WebSearchResult;

    async fn definition(&self, _prompt: String) -> rig::completion::ToolDefinition {
        rig::completion::ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Search the internet via Google and return the top results (title, link, snippet). Use it to find papers, reports and recent news.".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        let query = args.query.trim();
        if query.len() < 2 {
            return Err(WebSearchError::EmptyQuery);
        }
        tracing::debug!("   🔧 tool called...web_search@{}", query);

        let results = self.search(query).await?;
        tracing::debug!(query, hits = results.len(), "搜索完成");
        Ok(WebSearchResult {
            query: query.to_string(),
            results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_organic_results() {
        let body = r#"{
            "searchParameters": {"q": "soil health"},
            "organic": [
                {"title": "A", "link": "https://a.example", "snippet": "first", "position": 1},
                {"title": "B", "link": "https://b.example", "position": 2},
                {"title": "C", "link": "https://c.example", "snippet": "third"}
            ]
        }"#;

        let hits = parse_hits(body, 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].link, "https://a.example");
        assert_eq!(hits[1].snippet, "");
    }

    #[test]
    fn test_parse_without_organic_section() {
        assert!(parse_hits(r#"{"answerBox": {}}"#, 5).unwrap().is_empty());
        assert!(matches!(
            parse_hits("not json", 5),
            Err(WebSearchError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_short_query_rejected_before_request() {
        let tool = AgentToolWebSearch::new(
            WebSearchSettings {
                api_key: "k".to_string(),
                endpoint: "http://127.0.0.1:9/search".to_string(),
            },
            5,
            http_client().unwrap(),
        );
        let err = tool
            .call(WebSearchArgs {
                query: " x ".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, WebSearchError::EmptyQuery));
    }
}
