use async_trait::async_trait;

use super::types::{SamplingParams, TokenSequence};
use crate::utils::GenerationError;

/// Core trait that every language model backend implements
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Tokenize text. The end-of-sequence marker returned by
    /// [`LanguageModel::eos_token`] is recognised as a special token.
    fn encode(&self, text: &str) -> Result<TokenSequence, GenerationError>;

    /// Turn tokens back into text, skipping special tokens
    fn decode(&self, tokens: &TokenSequence) -> Result<String, GenerationError>;

    /// Marker appended to every utterance
    fn eos_token(&self) -> &'static str;

    /// Continue `input`. The returned sequence starts with `input`, followed
    /// by the reply and a closing end-of-sequence token, and never exceeds
    /// `max_length` tokens.
    async fn generate(
        &self,
        input: &TokenSequence,
        max_length: usize,
        params: &SamplingParams,
    ) -> Result<TokenSequence, GenerationError>;

    /// Get the name of the model
    fn name(&self) -> String;

    /// Validate that the model is reachable and installed
    async fn validate_connection(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
