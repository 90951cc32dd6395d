use tiktoken_rs::{cl100k_base, CoreBPE};

use super::errors::GenerationError;

/// Special token closing every utterance in the conversation
pub const END_OF_TEXT: &str = "<|endoftext|>";

/// BPE tokenizer producing the token sequences kept in history
pub struct Tokenizer {
    bpe: CoreBPE,
    eos_token_id: u32,
}

impl Tokenizer {
    /// Load the cl100k_base vocabulary bundled with tiktoken
    pub fn new() -> Result<Self, GenerationError> {
        let bpe = cl100k_base().map_err(|e| GenerationError::Tokenizer(e.to_string()))?;

        let eos = bpe.encode_with_special_tokens(END_OF_TEXT);
        let eos_token_id = match eos.as_slice() {
            [id] => *id,
            _ => {
                return Err(GenerationError::Tokenizer(format!(
                    "{} does not map to a single token",
                    END_OF_TEXT
                )))
            }
        };

        Ok(Self { bpe, eos_token_id })
    }

    /// Id of the end-of-text token
    pub fn eos_token_id(&self) -> u32 {
        self.eos_token_id
    }

    /// Encode text, recognising `<|endoftext|>` as the special token
    pub fn encode(&self, text: &str) -> Vec<u32> {
        self.bpe.encode_with_special_tokens(text)
    }

    /// Decode tokens, skipping special tokens.
    ///
    /// cl100k spreads CJK and emoji over several tokens; bytes of a
    /// character cut off by truncation decode as U+FFFD.
    pub fn decode(&self, tokens: &[u32]) -> Result<String, GenerationError> {
        let ordinary: Vec<u32> = tokens
            .iter()
            .copied()
            .filter(|&t| t != self.eos_token_id)
            .collect();

        let bytes = self.decode_bytes(&ordinary)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Shorten `tokens` to at most `max` without ending inside a character
    pub fn truncate(&self, tokens: &mut Vec<u32>, max: usize) {
        let mut keep = max.min(tokens.len());
        while keep > 0 && !self.ends_on_char_boundary(&tokens[..keep]) {
            keep -= 1;
        }
        tokens.truncate(keep);
    }

    fn ends_on_char_boundary(&self, tokens: &[u32]) -> bool {
        self.decode_bytes(tokens)
            .map(|bytes| std::str::from_utf8(&bytes).is_ok())
            .unwrap_or(false)
    }

    fn decode_bytes(&self, tokens: &[u32]) -> Result<Vec<u8>, GenerationError> {
        self.bpe
            .decode_bytes(tokens)
            .map_err(|e| GenerationError::Tokenizer(e.to_string()))
    }

    /// Split a dialogue into its utterances at each end-of-text token.
    /// Empty segments (e.g. after a trailing EOS) are dropped.
    pub fn split_turns<'a>(&self, tokens: &'a [u32]) -> Vec<&'a [u32]> {
        tokens
            .split(|&t| t == self.eos_token_id)
            .filter(|segment| !segment.is_empty())
            .collect()
    }
}
