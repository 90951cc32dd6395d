use crate::constants::{CLEAR_COMMAND, HELP_COMMAND, QUIT_COMMANDS};

/// In-band commands recognised by the conversation loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    Clear,
    Help,
}

/// What the user said, once classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Nothing but whitespace
    Empty,
    Command(Command),
    /// Text for the model
    Message(String),
}

impl Input {
    /// Commands are the whole trimmed utterance, compared case-insensitively
    pub fn classify(utterance: &str) -> Self {
        let trimmed = utterance.trim();
        if trimmed.is_empty() {
            return Input::Empty;
        }

        let lower = trimmed.to_lowercase();
        if QUIT_COMMANDS.contains(&lower.as_str()) {
            Input::Command(Command::Quit)
        } else if lower == CLEAR_COMMAND {
            Input::Command(Command::Clear)
        } else if lower == HELP_COMMAND {
            Input::Command(Command::Help)
        } else {
            Input::Message(trimmed.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quit_words() {
        for word in ["quit", "EXIT", "  Bye  "] {
            assert_eq!(Input::classify(word), Input::Command(Command::Quit));
        }
    }

    #[test]
    fn test_clear_and_help() {
        assert_eq!(Input::classify("Clear"), Input::Command(Command::Clear));
        assert_eq!(Input::classify("help\n"), Input::Command(Command::Help));
    }

    #[test]
    fn test_commands_must_match_whole_utterance() {
        assert_eq!(
            Input::classify("quit now"),
            Input::Message("quit now".to_string())
        );
        assert_eq!(
            Input::classify("please clear"),
            Input::Message("please clear".to_string())
        );
    }

    #[test]
    fn test_whitespace_is_empty() {
        assert_eq!(Input::classify(""), Input::Empty);
        assert_eq!(Input::classify(" \t\n"), Input::Empty);
    }

    #[test]
    fn test_message_is_trimmed() {
        assert_eq!(
            Input::classify("  hello there \n"),
            Input::Message("hello there".to_string())
        );
    }
}
