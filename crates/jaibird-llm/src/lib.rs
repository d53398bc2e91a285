//! Generative text models (OpenAI/Anthropic) behind one call contract.
//!
//! Each pipeline function (document cleanup, summaries, enrichment) gets its
//! own client, resolved once from `llm-config.json` at construction.

pub mod config;
pub mod providers;
pub mod testing;
pub mod types;

pub use config::{FunctionSettings, LLMConfig, ResolvedModel};
pub use providers::LlmClient;
pub use types::*;

use async_trait::async_trait;

/// Prompt in, text out.
#[async_trait]
pub trait TextModel: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> jaibird_core::Result<String>;

    /// Provider and model label for logs.
    fn name(&self) -> String;

    fn usage(&self) -> UsageSnapshot {
        UsageSnapshot::default()
    }
}
