pub mod client;
pub mod parse;
pub mod types;

pub use client::OpenAiClient;
pub use parse::{ParseTier, ParsedAugmented};
pub use types::AugmentedAnswer;

use crate::error::RetryError;

/// Seam for the two generation call shapes, so the scheduler can be
/// exercised without a network.
pub trait Generator {
    /// Baseline generation without search augmentation.
    async fn primary(&self, model: &str, prompt: &str) -> Result<String, RetryError>;
    /// Generation with web search and a structured sources list.
    async fn augmented(&self, model: &str, prompt: &str)
    -> Result<AugmentedAnswer, RetryError>;
}

impl Generator for OpenAiClient {
    async fn primary(&self, model: &str, prompt: &str) -> Result<String, RetryError> {
        self.chat(model, prompt).await
    }

    async fn augmented(&self, model: &str, prompt: &str) -> Result<AugmentedAnswer, RetryError> {
        OpenAiClient::augmented(self, model, prompt).await
    }
}
