use anyhow::Result;
use async_trait::async_trait;
use colored::Colorize;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::warn;

use crate::app::{UIConfig, VoiceConfig};
use crate::speech::SpeechGateway;
use crate::utils::RecognitionError;

/// One attempt at reading what the user said
#[derive(Debug)]
pub enum Heard {
    Utterance(String),
    /// Nobody spoke before the listen timeout
    Silence,
    /// Audio was captured but could not be recognised
    Misheard(RecognitionError),
    /// Input stream ended
    Closed,
}

/// Where utterances come from
#[async_trait]
pub trait InputSource: Send {
    async fn read(&mut self) -> Result<Heard>;
}

/// Something the loop wants the user to see or hear
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Emission<'a> {
    /// Ready for the next utterance
    Prompt,
    Reply {
        text: &'a str,
        elapsed: Option<Duration>,
    },
    /// Informational line (greeting, help, confirmations)
    Notice(&'a str),
    /// Something went wrong
    Apology(&'a str),
}

/// Where the loop's output goes
#[async_trait]
pub trait OutputSink: Send {
    async fn emit(&mut self, emission: Emission<'_>) -> Result<()>;
}

/// Lines typed on stdin
pub struct ConsoleInput {
    lines: Lines<BufReader<Stdin>>,
}

impl ConsoleInput {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

impl Default for ConsoleInput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InputSource for ConsoleInput {
    async fn read(&mut self) -> Result<Heard> {
        Ok(match self.lines.next_line().await? {
            Some(line) => Heard::Utterance(line),
            None => Heard::Closed,
        })
    }
}

/// Prints the conversation to stdout
pub struct Console {
    color: bool,
    user_label: String,
    bot_label: String,
}

impl Console {
    pub fn new(ui: &UIConfig) -> Self {
        Self {
            color: ui.color,
            user_label: ui.user_label.clone(),
            bot_label: ui.bot_label.clone(),
        }
    }

    /// Render an emission as the text printed to the terminal
    pub fn render(&self, emission: Emission<'_>) -> String {
        match emission {
            Emission::Prompt => {
                let label = format!("{}: ", self.user_label);
                if self.color {
                    label.blue().bold().to_string()
                } else {
                    label
                }
            }
            Emission::Reply { text, elapsed } => {
                let label = format!("{}:", self.bot_label);
                let label = if self.color {
                    label.green().bold().to_string()
                } else {
                    label
                };
                let timing = elapsed
                    .map(|d| {
                        let t = format!(" ({:.2}s)", d.as_secs_f32());
                        if self.color {
                            t.dimmed().to_string()
                        } else {
                            t
                        }
                    })
                    .unwrap_or_default();
                format!("{} {}{}", label, text, timing)
            }
            Emission::Notice(text) => {
                if self.color {
                    text.cyan().to_string()
                } else {
                    text.to_string()
                }
            }
            Emission::Apology(text) => {
                if self.color {
                    text.red().to_string()
                } else {
                    text.to_string()
                }
            }
        }
    }
}

#[async_trait]
impl OutputSink for Console {
    async fn emit(&mut self, emission: Emission<'_>) -> Result<()> {
        let line = self.render(emission);
        let mut stdout = std::io::stdout();
        if matches!(emission, Emission::Prompt) {
            write!(stdout, "{}", line)?;
        } else {
            writeln!(stdout, "{}", line)?;
        }
        stdout.flush()?;
        Ok(())
    }
}

/// Utterances recognised from the microphone
pub struct VoiceInput {
    speech: Arc<dyn SpeechGateway>,
    device_index: Option<usize>,
    timeout: Duration,
    phrase_time_limit: Duration,
}

impl VoiceInput {
    pub fn new(speech: Arc<dyn SpeechGateway>, voice: &VoiceConfig, device_index: Option<usize>) -> Self {
        Self {
            speech,
            device_index,
            timeout: Duration::from_secs(voice.listen_timeout_secs),
            phrase_time_limit: Duration::from_secs(voice.phrase_time_limit_secs),
        }
    }
}

#[async_trait]
impl InputSource for VoiceInput {
    async fn read(&mut self) -> Result<Heard> {
        let heard = match self
            .speech
            .listen(self.device_index, self.timeout, self.phrase_time_limit)
            .await
        {
            Ok(Some(text)) => {
                println!("You said: {}", text);
                Heard::Utterance(text)
            }
            Ok(None) => Heard::Silence,
            Err(err) => Heard::Misheard(err),
        };
        Ok(heard)
    }
}

/// Prints like [`Console`] and also speaks everything but the prompt
pub struct VoiceOutput {
    console: Console,
    speech: Arc<dyn SpeechGateway>,
}

impl VoiceOutput {
    pub fn new(console: Console, speech: Arc<dyn SpeechGateway>) -> Self {
        Self { console, speech }
    }
}

#[async_trait]
impl OutputSink for VoiceOutput {
    async fn emit(&mut self, emission: Emission<'_>) -> Result<()> {
        let spoken = match emission {
            Emission::Prompt => {
                println!("Listening...");
                return Ok(());
            }
            Emission::Reply { text, .. } => text,
            Emission::Notice(text) | Emission::Apology(text) => text,
        };

        self.console.emit(emission).await?;

        // Speech failure loses nothing; the text is already on screen
        if let Err(err) = self.speech.speak(spoken).await {
            warn!("Failed to speak: {}", err);
        }
        Ok(())
    }
}
