use std::path::{Path, PathBuf};
use std::process::Stdio;
use tracing::debug;

use crate::utils::NatterError;

/// Text-to-speech programs tried in order when none is configured
const CANDIDATES: &[&str] = &["say", "espeak-ng", "espeak"];

/// Speaks text by running a system text-to-speech command
#[derive(Debug, Clone)]
pub struct Synthesizer {
    program: PathBuf,
    args: Vec<String>,
}

impl Synthesizer {
    /// Use `configured` (a command line such as `espeak -s 150`) or the
    /// first known program found on PATH.
    pub fn detect(configured: Option<&str>) -> Result<Self, NatterError> {
        if let Some(command) = configured {
            let mut parts = command.split_whitespace();
            let name = parts
                .next()
                .ok_or_else(|| NatterError::ConfigError("voice.tts_command is empty".to_string()))?;
            let program = which::which(name).map_err(|_| {
                NatterError::ConfigError(format!("text-to-speech command not found: {}", name))
            })?;

            return Ok(Self {
                program,
                args: parts.map(str::to_string).collect(),
            });
        }

        CANDIDATES
            .iter()
            .find_map(|name| which::which(name).ok())
            .map(|program| Self {
                program,
                args: Vec::new(),
            })
            .ok_or_else(|| {
                NatterError::Unsupported(
                    "no text-to-speech command found (tried say, espeak-ng, espeak); set voice.tts_command"
                        .to_string(),
                )
            })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Speak `text`, waiting for the command to finish
    pub async fn speak(&self, text: &str) -> Result<(), NatterError> {
        if text.trim().is_empty() {
            return Err(NatterError::SpeechError("Cannot speak empty text".to_string()));
        }

        debug!(program = %self.program.display(), "speaking");
        let status = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await?;

        if !status.success() {
            return Err(NatterError::SpeechError(format!(
                "{} exited with {}",
                self.program.display(),
                status
            )));
        }

        Ok(())
    }
}
