use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_NO_REPEAT_NGRAM_SIZE, DEFAULT_TEMPERATURE, DEFAULT_TOP_K, DEFAULT_TOP_P,
};

/// Ordered token ids, the model's native input and output unit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSequence(Vec<u32>);

impl TokenSequence {
    pub fn new(tokens: Vec<u32>) -> Self {
        Self(tokens)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    /// The last `n` tokens (all of them when shorter than `n`)
    pub fn tail(&self, n: usize) -> &[u32] {
        &self.0[self.0.len().saturating_sub(n)..]
    }

    /// Tokens from position `start` onwards
    pub fn suffix_from(&self, start: usize) -> TokenSequence {
        Self(self.0.get(start..).unwrap_or_default().to_vec())
    }

    pub fn push(&mut self, token: u32) {
        self.0.push(token);
    }

    pub fn extend_from_slice(&mut self, tokens: &[u32]) {
        self.0.extend_from_slice(tokens);
    }
}

/// Generation-time knobs controlling randomness and repetition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    /// Sample from the distribution instead of decoding greedily
    pub do_sample: bool,
    /// Suppress repeating any n-gram of this size
    pub no_repeat_ngram_size: Option<u32>,
    pub top_k: Option<u32>,
    pub top_p: Option<f32>,
    pub temperature: Option<f32>,
    pub repetition_penalty: Option<f32>,
    pub length_penalty: Option<f32>,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            do_sample: true,
            no_repeat_ngram_size: Some(DEFAULT_NO_REPEAT_NGRAM_SIZE),
            top_k: Some(DEFAULT_TOP_K),
            top_p: Some(DEFAULT_TOP_P),
            temperature: Some(DEFAULT_TEMPERATURE),
            repetition_penalty: None,
            length_penalty: None,
        }
    }
}

/// Where the model should run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePreference {
    /// Let the runtime decide
    #[default]
    Auto,
    Cpu,
    Gpu,
}
