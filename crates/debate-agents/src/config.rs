use std::time::Duration;

/// Default OpenAI-compatible base URL (local Ollama).
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434/v1";

/// Default per-request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Inference endpoint shared by every debater and the orchestrator.
/// Model selection happens per request via the model name.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointConfig {
    /// Base URL including the `/v1` prefix, without a trailing slash.
    pub base_url: String,
    /// Bearer token; local servers usually need none.
    pub api_key: Option<String>,
    pub request_timeout: Duration,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            // DEBATE_BASE_URL: OpenAI-compatible server (Ollama, llama.cpp, vLLM)
            base_url: std::env::var("DEBATE_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_BASE_URL.into()),
            // DEBATE_API_KEY: optional bearer token
            api_key: std::env::var("DEBATE_API_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
            // DEBATE_REQUEST_TIMEOUT_SECS: per-request deadline
            request_timeout: std::env::var("DEBATE_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or_else(|| Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)),
        }
    }
}

impl EndpointConfig {
    /// Endpoint at `base_url` with no key and the default timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

/// Check if an inference endpoint is reachable (GET {url}/models).
pub async fn check_endpoint(url: &str, api_key: Option<&str>) -> bool {
    let models_url = format!("{}/models", url.trim_end_matches('/'));
    let mut request = reqwest::Client::new()
        .get(&models_url)
        .timeout(Duration::from_secs(5));
    if let Some(key) = api_key {
        request = request.bearer_auth(key);
    }
    match request.send().await {
        Ok(resp) => resp.status().is_success(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_strips_trailing_slash() {
        let config = EndpointConfig::new("http://gpu-01:8080/v1/");
        assert_eq!(config.base_url, "http://gpu-01:8080/v1");
        assert_eq!(
            config.chat_completions_url(),
            "http://gpu-01:8080/v1/chat/completions"
        );
        assert_eq!(config.request_timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_builders() {
        let config = EndpointConfig::new(DEFAULT_BASE_URL)
            .with_api_key("secret")
            .with_timeout(Duration::from_secs(5));
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_check_endpoint_unreachable() {
        // Port 9 (discard) is closed on any sane test host.
        assert!(!check_endpoint("http://127.0.0.1:9/v1", None).await);
    }
}
