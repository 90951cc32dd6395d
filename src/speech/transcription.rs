use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::constants::HTTP_REQUEST_TIMEOUT_SECS;
use crate::utils::{NatterError, RecognitionError};

/// Client for an OpenAI-compatible `/audio/transcriptions` endpoint
pub struct Transcriber {
    client: Client,
    url: String,
    model: String,
    api_key: Option<String>,
}

impl Transcriber {
    pub fn new(url: &str, model: &str, api_key: Option<String>) -> Result<Self, NatterError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| NatterError::SpeechError(e.to_string()))?;

        Ok(Self {
            client,
            url: url.to_string(),
            model: model.to_string(),
            api_key,
        })
    }

    /// Transcribe a WAV file held in memory
    pub async fn transcribe(&self, wav: Vec<u8>) -> Result<String, RecognitionError> {
        let file = Part::bytes(wav)
            .file_name("speech.wav")
            .mime_str("audio/wav")?;

        let form = Form::new()
            .text("model", self.model.clone())
            .text("response_format", "json")
            .part("file", file);

        let mut request = self.client.post(&self.url).multipart(form);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RecognitionError::Service(format!("{}: {}", status, body)));
        }

        let body: TranscriptionResponse = response.json().await?;
        debug!(chars = body.text.len(), "transcription received");
        transcript_text(&body.text)
    }
}

/// Empty transcripts mean the audio held no recognisable words
fn transcript_text(raw: &str) -> Result<String, RecognitionError> {
    let text = raw.trim();
    if text.is_empty() {
        Err(RecognitionError::Unintelligible)
    } else {
        Ok(text.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}
