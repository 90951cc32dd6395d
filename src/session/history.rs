use tracing::debug;

use crate::models::TokenSequence;

/// Join prior history with a new utterance, keeping at most `max_tokens`
/// of the history (the most recent ones). `new_input` is never shortened.
pub fn merge(
    history: Option<&TokenSequence>,
    new_input: &TokenSequence,
    max_tokens: usize,
) -> TokenSequence {
    let history = match history {
        Some(history) if !history.is_empty() => history,
        _ => return new_input.clone(),
    };

    let kept = history.tail(max_tokens);
    if kept.len() < history.len() {
        debug!(
            dropped = history.len() - kept.len(),
            kept = kept.len(),
            "truncating conversation history"
        );
    }

    let mut merged = TokenSequence::new(Vec::with_capacity(kept.len() + new_input.len()));
    merged.extend_from_slice(kept);
    merged.extend_from_slice(new_input.as_slice());
    merged
}

/// The running dialogue, always replaced as a whole
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    history: Option<TokenSequence>,
    turns: usize,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Option<&TokenSequence> {
        self.history.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_none()
    }

    /// Number of tokens currently held
    pub fn len(&self) -> usize {
        self.history.as_ref().map_or(0, TokenSequence::len)
    }

    /// Turns committed since the last reset
    pub fn turns(&self) -> usize {
        self.turns
    }

    /// [`merge`] against the current history
    pub fn merge_input(&self, new_input: &TokenSequence, max_tokens: usize) -> TokenSequence {
        merge(self.history.as_ref(), new_input, max_tokens)
    }

    /// Replace the history with a freshly generated dialogue
    pub fn commit(&mut self, generated: TokenSequence) {
        self.history = if generated.is_empty() {
            None
        } else {
            Some(generated)
        };
        self.turns += 1;
    }

    /// Forget everything
    pub fn reset(&mut self) {
        self.history = None;
        self.turns = 0;
    }
}
