//! Pluto Core Library
//!
//! Shared functionality for the Pluto personal finance backend:
//! - Database access and migrations (users, accounts, transactions, insight cache)
//! - Password hashing for the identity layer
//! - Synthetic banking-data provider ("fake Plaid") with account-type strategies
//! - Analytics engine: spending summary, trend analysis, health score, financial summary
//! - Pluggable text-generation backends (Gemini, OpenAI-compatible, mock)
//! - Narrative insight service with strict decoding, fallback and a 30-day cache

pub mod ai;
pub mod analytics;
pub mod db;
pub mod error;
pub mod models;
pub mod narrative;
pub mod security;
pub mod synth;

/// Test utilities including a mock generative-text server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{AIBackend, AIClient, GeminiBackend, MockBackend, OpenAICompatibleBackend};
pub use analytics::{
    CategoryBreakdown, FinancialSummary, HealthScore, MathematicalSummary, SpendingInsight,
    TrendAnalysis, TrendDirection, Window,
};
pub use db::{AuditEntry, Database};
pub use error::{Error, Result};
pub use narrative::{NarrativeInsight, NarrativeInsightService, NarrativeInsights};
pub use synth::{LinkRequest, Synthesizer};
