use anyhow::{Context, Result};
use colored::Colorize;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use super::conversation::{Conversation, TurnSettings};
use super::io::{Console, ConsoleInput, Emission, OutputSink, VoiceInput, VoiceOutput};
use crate::{
    app::{load_config, Config},
    cli::{handle_command, Cli},
    constants::{TEXT_GREETING, VOICE_GREETING},
    models::ModelFactory,
    speech::{select_microphone, SpeechGateway, SystemSpeech},
    utils::log_progress,
};

/// Main runtime orchestrator
pub struct Orchestrator {
    cli: Cli,
    config: Config,
}

impl Orchestrator {
    /// Create a new orchestrator from CLI args
    pub fn new(cli: Cli) -> Result<Self> {
        let mut config = load_config(cli.config.as_deref())?;
        apply_overrides(&mut config, &cli);

        Ok(Self { cli, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the orchestrator
    pub async fn run(self) -> Result<()> {
        if let Some(command) = self.cli.command {
            if handle_command(command, &self.config).await? {
                return Ok(());
            }
        }

        let total_steps = if self.config.voice.enabled { 3 } else { 2 };

        log_progress(1, total_steps, format!("Connecting to {}", self.config.model.host));
        let model = ModelFactory::create(&self.config.model)
            .await
            .with_context(|| format!("Failed to initialize model '{}'", self.config.model.name))?;

        println!("Starting natter with model: {}", model.name().green());

        let mut conversation = Conversation::new(model.as_ref(), turn_settings(&self.config));
        let console = Console::new(&self.config.ui);

        if self.config.voice.enabled {
            log_progress(2, total_steps, "Setting up speech");
            let speech: Arc<dyn SpeechGateway> = Arc::new(
                SystemSpeech::from_config(&self.config.voice)
                    .context("Failed to initialize speech")?,
            );
            let device_index = self.choose_microphone(speech.as_ref()).await?;
            info!(device_index, "microphone selected");

            log_progress(total_steps, total_steps, "Ready");
            let mut input = VoiceInput::new(speech.clone(), &self.config.voice, Some(device_index));
            let mut output = VoiceOutput::new(console, speech);
            output.emit(Emission::Notice(VOICE_GREETING)).await?;
            conversation.run(&mut input, &mut output).await
        } else {
            log_progress(total_steps, total_steps, "Ready");
            let mut input = ConsoleInput::new();
            let mut output = console;
            output.emit(Emission::Notice(TEXT_GREETING)).await?;
            conversation.run(&mut input, &mut output).await
        }
    }

    /// Configured microphone, or ask on stdin
    async fn choose_microphone(&self, speech: &dyn SpeechGateway) -> Result<usize> {
        let names = speech
            .list_microphones()
            .context("Failed to enumerate microphones")?;

        if let Some(index) = self.config.voice.device_index {
            if index >= names.len() {
                anyhow::bail!(
                    "Configured microphone index {} is out of range ({} devices found)",
                    index,
                    names.len()
                );
            }
            return Ok(index);
        }

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        select_microphone(&names, &mut lines).await
    }
}

/// CLI flags take precedence over every config source
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(model) = &cli.model {
        config.model.name = model.clone();
    }
    if cli.voice {
        config.voice.enabled = true;
    }
}

fn turn_settings(config: &Config) -> TurnSettings {
    TurnSettings {
        max_length: config.model.max_length,
        max_history_tokens: config.model.max_history_tokens,
        sampling: config.sampling.clone(),
        show_timing: config.ui.show_timing,
    }
}
