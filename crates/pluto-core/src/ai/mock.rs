//! Mock backend for testing
//!
//! Replies with a scripted string (or a scripted failure) without any I/O.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::AIBackend;

/// Reply used by `MockBackend::new()`: a valid, empty insight list
pub const DEFAULT_MOCK_REPLY: &str = r#"{"insights": []}"#;

/// Mock AI backend for testing
#[derive(Clone)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    reply: std::result::Result<String, String>,
    calls: Arc<AtomicUsize>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self::with_reply(DEFAULT_MOCK_REPLY)
    }

    /// Mock that always replies with `reply`
    pub fn with_reply(reply: &str) -> Self {
        Self {
            healthy: true,
            reply: Ok(reply.to_string()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Mock whose every call fails like a transport error
    pub fn failing(message: &str) -> Self {
        Self {
            healthy: false,
            reply: Err(message.to_string()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of `generate` calls made so far (shared across clones)
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AIBackend for MockBackend {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone().map_err(Error::Ai)
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_reply_and_call_count() {
        let mock = MockBackend::with_reply("hello");
        let clone = mock.clone();
        assert_eq!(clone.generate("x").await.unwrap(), "hello");
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_failing() {
        let mock = MockBackend::failing("boom");
        assert!(matches!(mock.generate("x").await, Err(Error::Ai(m)) if m == "boom"));
        assert!(!mock.health_check().await);
    }
}
