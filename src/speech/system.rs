use async_trait::async_trait;
use std::time::Duration;

use super::microphone;
use super::synthesis::Synthesizer;
use super::traits::SpeechGateway;
use super::transcription::Transcriber;
use crate::app::VoiceConfig;
use crate::utils::{NatterError, RecognitionError};

/// Microphone + transcription service + system text-to-speech
pub struct SystemSpeech {
    transcriber: Transcriber,
    synthesizer: Synthesizer,
}

impl SystemSpeech {
    pub fn new(transcriber: Transcriber, synthesizer: Synthesizer) -> Self {
        Self {
            transcriber,
            synthesizer,
        }
    }

    /// Build from the `[voice]` config section
    pub fn from_config(config: &VoiceConfig) -> Result<Self, NatterError> {
        let api_key = std::env::var(&config.api_key_env).ok();
        if api_key.is_none() {
            tracing::warn!(
                "{} is not set; transcription requests will be unauthenticated",
                config.api_key_env
            );
        }

        let transcriber = Transcriber::new(
            &config.transcription_url,
            &config.transcription_model,
            api_key,
        )?;
        let synthesizer = Synthesizer::detect(config.tts_command.as_deref())?;

        Ok(Self::new(transcriber, synthesizer))
    }
}

#[async_trait]
impl SpeechGateway for SystemSpeech {
    async fn listen(
        &self,
        device_index: Option<usize>,
        timeout: Duration,
        phrase_time_limit: Duration,
    ) -> Result<Option<String>, RecognitionError> {
        let recording = tokio::task::spawn_blocking(move || {
            microphone::record_phrase(device_index, timeout, phrase_time_limit)
        })
        .await
        .map_err(|e| RecognitionError::Audio(e.to_string()))??;

        let Some(recording) = recording else {
            return Ok(None);
        };

        tracing::debug!(secs = recording.duration_secs(), "transcribing phrase");
        let text = self.transcriber.transcribe(recording.to_wav()?).await?;
        Ok(Some(text))
    }

    async fn speak(&self, text: &str) -> Result<(), NatterError> {
        self.synthesizer.speak(text).await
    }

    fn list_microphones(&self) -> Result<Vec<String>, NatterError> {
        microphone::list_input_devices()
    }
}
