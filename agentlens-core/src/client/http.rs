//! HTTP implementation of [`RuntimeClient`]
//!
//! Talks to the agent runtime's REST API. The base URL comes from
//! `[endpoint]` in the config; every failure is mapped into the error
//! taxonomy at the call site and never retried here.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::config::EndpointConfig;
use crate::error::{Error, Result};

use super::{AgentRecord, ConversationRecord, MemoryStatsRecord, RuntimeClient};

/// HTTP client for the agent runtime API
pub struct HttpRuntimeClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpRuntimeClient {
    /// Create a new client from endpoint configuration.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: &EndpointConfig) -> Result<Self> {
        config.validate()?;

        let base_url = config.base_url.trim_end_matches('/').to_string();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET a JSON resource; `not_found` builds the error for a 404.
    async fn get_json<T, F>(&self, path: &str, not_found: F) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
        F: FnOnce() -> Error,
    {
        let response = self
            .http_client
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| Error::Transport(format!("HTTP request failed: {}", e)))?;

        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| Error::Transport(format!("failed to parse response: {}", e)))
        } else if status == StatusCode::NOT_FOUND {
            Err(not_found())
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            Err(Error::Transport(format!(
                "API error ({}): {}",
                status, error_text
            )))
        }
    }
}

/// Response from GET /api/logs
#[derive(Debug, Deserialize)]
struct LogsResponse {
    lines: Vec<String>,
}

/// Response from POST /api/agents/{id}/memory/initialize
#[derive(Debug, Deserialize)]
struct InitializeResponse {
    ok: bool,
}

#[async_trait]
impl RuntimeClient for HttpRuntimeClient {
    async fn get_conversation(&self, conversation_id: &str) -> Result<ConversationRecord> {
        let path = format!(
            "/api/conversations/{}",
            urlencoding::encode(conversation_id)
        );
        let id = conversation_id.to_string();
        self.get_json(&path, move || {
            Error::Lookup(format!("conversation not found: {}", id))
        })
        .await
    }

    async fn get_agent(&self, agent_id: &str) -> Result<AgentRecord> {
        let path = format!("/api/agents/{}", urlencoding::encode(agent_id));
        let id = agent_id.to_string();
        self.get_json(&path, move || Error::Lookup(format!("agent not found: {}", id)))
            .await
    }

    async fn initialize_agent_memory(&self, agent_id: &str) -> Result<bool> {
        let url = self.url(&format!(
            "/api/agents/{}/memory/initialize",
            urlencoding::encode(agent_id)
        ));

        let response = self
            .http_client
            .post(&url)
            .send()
            .await
            .map_err(|e| Error::Transport(format!("HTTP request failed: {}", e)))?;

        let status = response.status();

        if status.is_success() {
            let result: InitializeResponse = response
                .json()
                .await
                .map_err(|e| Error::Transport(format!("failed to parse response: {}", e)))?;
            Ok(result.ok)
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            Err(Error::Initialization(format!(
                "API error ({}): {}",
                status, error_text
            )))
        }
    }

    async fn get_agent_memory_stats(&self, agent_id: &str) -> Result<MemoryStatsRecord> {
        let path = format!(
            "/api/agents/{}/memory/stats",
            urlencoding::encode(agent_id)
        );
        let id = agent_id.to_string();
        self.get_json(&path, move || {
            Error::Lookup(format!("memory stats not found for agent: {}", id))
        })
        .await
    }

    async fn get_server_logs(&self, lines: usize) -> Result<Vec<String>> {
        let path = format!("/api/logs?lines={}", lines);
        let response: LogsResponse = self
            .get_json(&path, || Error::Transport("log endpoint missing".to_string()))
            .await?;
        Ok(response.lines)
    }

    async fn rebuild_memory_index(&self, agent_id: &str) -> Result<()> {
        let url = self.url(&format!(
            "/api/agents/{}/memory/index/rebuild",
            urlencoding::encode(agent_id)
        ));

        let response = self
            .http_client
            .post(&url)
            .send()
            .await
            .map_err(|e| Error::Transport(format!("HTTP request failed: {}", e)))?;

        let status = response.status();

        if status.is_success() {
            Ok(())
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            Err(Error::Transport(format!(
                "API error ({}): {}",
                status, error_text
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EndpointConfig;

    #[test]
    fn test_client_requires_valid_config() {
        let config = EndpointConfig {
            base_url: String::new(),
            ..Default::default()
        };
        assert!(HttpRuntimeClient::new(&config).is_err());
    }

    #[test]
    fn test_base_url_is_normalized() {
        let config = EndpointConfig {
            base_url: "http://runtime.example.com/".to_string(),
            ..Default::default()
        };
        let client = HttpRuntimeClient::new(&config).unwrap();
        assert_eq!(
            client.url("/api/logs?lines=10"),
            "http://runtime.example.com/api/logs?lines=10"
        );
    }

    #[test]
    fn test_path_ids_are_encoded() {
        let config = EndpointConfig::default();
        let client = HttpRuntimeClient::new(&config).unwrap();
        let encoded = format!("/api/agents/{}", urlencoding::encode("a/b c"));
        assert_eq!(
            client.url(&encoded),
            "http://127.0.0.1:7700/api/agents/a%2Fb%20c"
        );
    }
}
