use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "natter")]
#[command(version)]
#[command(about = "A small conversational agent for the terminal", long_about = None)]
pub struct Cli {
    /// Ollama model to chat with (overrides [model] name)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Listen on the microphone and speak replies
    #[arg(long)]
    pub voice: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Write a default configuration file
    Init,
    /// List microphones usable with --voice
    Devices,
    /// List models installed on the Ollama host
    Models,
    /// Start a chat session (default)
    Chat,
    /// Show version information
    Version,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_arguments_starts_text_chat() {
        let cli = Cli::parse_from(["natter"]);
        assert!(cli.command.is_none());
        assert!(!cli.voice);
        assert!(cli.model.is_none());
    }

    #[test]
    fn test_flags_and_subcommand() {
        let cli = Cli::parse_from([
            "natter",
            "--voice",
            "-m",
            "llama3",
            "--config",
            "/tmp/natter.toml",
            "chat",
        ]);
        assert!(cli.voice);
        assert_eq!(cli.model.as_deref(), Some("llama3"));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/natter.toml")));
        assert_eq!(cli.command, Some(Commands::Chat));
    }

    #[test]
    fn test_unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["natter", "serve"]).is_err());
    }
}
