//! Pluggable text-generation backend abstraction
//!
//! # Architecture
//!
//! - `AIBackend` trait: prompt in, raw text out
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `GeminiBackend`, `OpenAICompatibleBackend`, `MockBackend`
//!
//! # Configuration
//!
//! Environment variables:
//! - `AI_BACKEND`: Backend to use (gemini, openai_compatible, mock). Default: gemini
//! - `GEMINI_API_KEY`: API key (required for gemini backend)
//! - `GEMINI_MODEL`: Model name (default: gemini-2.5-flash)
//! - `GEMINI_HOST`: Base URL (default: https://generativelanguage.googleapis.com)
//! - `OPENAI_COMPATIBLE_HOST`: Server URL (required for openai_compatible backend)
//! - `OPENAI_COMPATIBLE_MODEL`: Model name (default: gpt-4o-mini)
//! - `OPENAI_COMPATIBLE_API_KEY`: API key if required (optional)
//! - `AI_TIMEOUT_SECS`: Timeout for every outbound call (default: 30)

mod gemini;
mod mock;
mod openai_compatible;

pub use gemini::GeminiBackend;
pub use mock::MockBackend;
pub use openai_compatible::OpenAICompatibleBackend;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::Result;

/// Default timeout for outbound text-generation calls
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Read `AI_TIMEOUT_SECS`, falling back to the default
pub fn timeout_from_env() -> Duration {
    let secs = std::env::var("AI_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|s| *s > 0)
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    Duration::from_secs(secs)
}

/// HTTP client with a bounded request timeout
pub(crate) fn http_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to build HTTP client with timeout, using defaults");
            Client::new()
        })
}

/// Trait defining the interface for all text-generation backends
///
/// Backends should be Send + Sync to allow use across async tasks.
#[async_trait]
pub trait AIBackend: Send + Sync {
    /// Send a prompt and return the raw generated text
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    /// Get the model name (for logging)
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete AI client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum AIClient {
    /// Google Gemini REST API
    Gemini(GeminiBackend),
    /// OpenAI-compatible chat completions server
    OpenAICompatible(OpenAICompatibleBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl AIClient {
    /// Create an AI client from environment variables
    ///
    /// Checks `AI_BACKEND` to determine which backend to use:
    /// - `gemini` (default): Uses GEMINI_API_KEY, GEMINI_MODEL and GEMINI_HOST
    /// - `openai_compatible`: Uses OPENAI_COMPATIBLE_HOST and OPENAI_COMPATIBLE_MODEL
    /// - `mock`: Creates a mock backend that replies with an empty insight list
    ///
    /// Returns None if the required environment variables are not set.
    pub fn from_env() -> Option<Self> {
        let backend = std::env::var("AI_BACKEND").unwrap_or_else(|_| "gemini".to_string());
        let timeout = timeout_from_env();

        match backend.to_lowercase().as_str() {
            "gemini" | "google" => GeminiBackend::from_env(timeout).map(AIClient::Gemini),
            "openai_compatible" | "openai" | "vllm" | "localai" | "llamacpp" => {
                OpenAICompatibleBackend::from_env(timeout).map(AIClient::OpenAICompatible)
            }
            "mock" => Some(AIClient::Mock(MockBackend::new())),
            _ => {
                tracing::warn!(backend = %backend, "Unknown AI_BACKEND, falling back to gemini");
                GeminiBackend::from_env(timeout).map(AIClient::Gemini)
            }
        }
    }

    /// Create a Gemini backend directly
    pub fn gemini(host: &str, model: &str, api_key: &str) -> Self {
        AIClient::Gemini(GeminiBackend::new(host, model, api_key))
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        AIClient::Mock(MockBackend::new())
    }

    /// Backend name for status output
    pub fn backend_name(&self) -> &'static str {
        match self {
            AIClient::Gemini(_) => "gemini",
            AIClient::OpenAICompatible(_) => "openai_compatible",
            AIClient::Mock(_) => "mock",
        }
    }
}

// Implement AIBackend for AIClient by delegating to the inner backend
#[async_trait]
impl AIBackend for AIClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        match self {
            AIClient::Gemini(b) => b.generate(prompt).await,
            AIClient::OpenAICompatible(b) => b.generate(prompt).await,
            AIClient::Mock(b) => b.generate(prompt).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AIClient::Gemini(b) => b.health_check().await,
            AIClient::OpenAICompatible(b) => b.health_check().await,
            AIClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            AIClient::Gemini(b) => b.model(),
            AIClient::OpenAICompatible(b) => b.model(),
            AIClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            AIClient::Gemini(b) => b.host(),
            AIClient::OpenAICompatible(b) => b.host(),
            AIClient::Mock(b) => b.host(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_client_dispatch() {
        let client = AIClient::mock();
        assert_eq!(client.backend_name(), "mock");
        assert_eq!(client.model(), "mock");
        assert!(client.health_check().await);
        let text = client.generate("anything").await.unwrap();
        assert!(text.contains("insights"));
    }

    #[test]
    fn test_gemini_constructor() {
        let client = AIClient::gemini("http://localhost:1234/", "gemini-2.5-flash", "k");
        assert_eq!(client.backend_name(), "gemini");
        assert_eq!(client.host(), "http://localhost:1234");
        assert_eq!(client.model(), "gemini-2.5-flash");
    }
}
