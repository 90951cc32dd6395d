use thiserror::Error;

/// Main error type for Natter outside of a single turn
#[derive(Error, Debug)]
pub enum NatterError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Speech error: {0}")]
    SpeechError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Unsupported: {0}")]
    Unsupported(String),
}

/// Failure of one call into the language model gateway.
///
/// Every variant is recovered at the turn boundary by clearing the
/// conversation, so none of them is fatal.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("failed to reach the model server: {0}")]
    Request(#[from] reqwest::Error),

    #[error("model server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("conversation of {length} tokens leaves no room to reply (max_length {max_length})")]
    ContextOverflow { length: usize, max_length: usize },

    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    #[error("malformed model response: {0}")]
    MalformedResponse(String),
}

/// Failure to turn captured audio into text
#[derive(Error, Debug)]
pub enum RecognitionError {
    #[error("speech was not intelligible")]
    Unintelligible,

    #[error("speech recognition service failed: {0}")]
    Service(String),

    #[error("audio capture failed: {0}")]
    Audio(String),
}

impl From<reqwest::Error> for RecognitionError {
    fn from(err: reqwest::Error) -> Self {
        RecognitionError::Service(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_overflow_message() {
        let err = GenerationError::ContextOverflow {
            length: 1200,
            max_length: 1000,
        };
        let message = err.to_string();
        assert!(message.contains("1200"));
        assert!(message.contains("1000"));
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: NatterError = io.into();
        assert!(matches!(err, NatterError::IoError(_)));
    }
}
