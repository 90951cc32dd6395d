use anyhow::Context as _;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use super::traits::LanguageModel;
use super::types::{DevicePreference, SamplingParams, TokenSequence};
use crate::constants::{HEALTH_CHECK_TIMEOUT_SECS, OLLAMA_ALL_GPU_LAYERS};
use crate::utils::{GenerationError, Tokenizer, END_OF_TEXT};

/// Language model served by a local Ollama instance.
///
/// The dialogue is kept as tokens on our side. Each turn is rendered back to
/// text one utterance per line and sent as a raw completion prompt; the
/// model's next line is the reply.
pub struct OllamaModel {
    client: Client,
    base_url: String,
    model_name: String,
    device: DevicePreference,
    tokenizer: Tokenizer,
}

impl OllamaModel {
    /// Create a new Ollama-backed model
    pub fn new(
        model_name: &str,
        base_url: &str,
        device: DevicePreference,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let tokenizer = Tokenizer::new().context("Failed to load tokenizer")?;

        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            model_name: model_name.to_string(),
            device,
            tokenizer,
        })
    }

    /// Render a token dialogue as the raw prompt text, one utterance per line.
    /// The oldest utterance may start mid-character after truncation; the
    /// partial bytes are dropped.
    fn render_prompt(&self, tokens: &TokenSequence) -> Result<String, GenerationError> {
        let mut prompt = String::new();
        for turn in self.tokenizer.split_turns(tokens.as_slice()) {
            let text = self.tokenizer.decode(turn)?;
            let text = text
                .trim_start_matches(char::REPLACEMENT_CHARACTER)
                .trim();
            if text.is_empty() {
                continue;
            }
            prompt.push_str(text);
            prompt.push('\n');
        }
        Ok(prompt)
    }

    fn build_options(&self, params: &SamplingParams, num_predict: usize) -> GenerateOptions {
        if params.no_repeat_ngram_size.is_some() || params.length_penalty.is_some() {
            debug!("no_repeat_ngram_size and length_penalty have no Ollama equivalent, ignoring");
        }

        let temperature = if params.do_sample {
            params.temperature
        } else {
            Some(0.0)
        };

        GenerateOptions {
            temperature,
            top_k: params.top_k,
            top_p: params.top_p,
            repeat_penalty: params.repetition_penalty,
            num_predict,
            num_gpu: match self.device {
                DevicePreference::Auto => None,
                DevicePreference::Cpu => Some(0),
                DevicePreference::Gpu => Some(OLLAMA_ALL_GPU_LAYERS),
            },
        }
    }

    /// Names of the models installed on the server
    pub async fn list_installed(&self) -> anyhow::Result<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(HEALTH_CHECK_TIMEOUT_SECS))
            .send()
            .await
            .with_context(|| format!("Failed to connect to Ollama at {}. Is it running? Try: ollama serve", self.base_url))?;

        if !response.status().is_success() {
            anyhow::bail!("Ollama returned {} for {}", response.status(), url);
        }

        let tags: TagsResponse = response.json().await?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

#[async_trait]
impl LanguageModel for OllamaModel {
    fn encode(&self, text: &str) -> Result<TokenSequence, GenerationError> {
        Ok(TokenSequence::new(self.tokenizer.encode(text)))
    }

    fn decode(&self, tokens: &TokenSequence) -> Result<String, GenerationError> {
        self.tokenizer.decode(tokens.as_slice())
    }

    fn eos_token(&self) -> &'static str {
        END_OF_TEXT
    }

    async fn generate(
        &self,
        input: &TokenSequence,
        max_length: usize,
        params: &SamplingParams,
    ) -> Result<TokenSequence, GenerationError> {
        // One slot is reserved for the closing EOS token
        let budget = max_length.saturating_sub(input.len() + 1);
        if budget == 0 {
            return Err(GenerationError::ContextOverflow {
                length: input.len(),
                max_length,
            });
        }

        let request = GenerateRequest {
            model: &self.model_name,
            prompt: self.render_prompt(input)?,
            raw: true,
            stream: false,
            stop: vec!["\n"],
            options: self.build_options(params, budget),
        };

        let url = format!("{}/api/generate", self.base_url);
        debug!(tokens = input.len(), budget, "requesting completion");

        let response = self.client.post(&url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let completion: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

        let mut reply = self.tokenizer.encode(completion.response.trim());
        // The server counts its own tokens; ours may differ slightly
        self.tokenizer.truncate(&mut reply, budget);

        let mut generated = input.clone();
        generated.extend_from_slice(&reply);
        generated.push(self.tokenizer.eos_token_id());
        Ok(generated)
    }

    fn name(&self) -> String {
        self.model_name.clone()
    }

    async fn validate_connection(&self) -> anyhow::Result<()> {
        let installed = self.list_installed().await?;
        let wanted = self.model_name.as_str();

        let found = installed
            .iter()
            .any(|name| name == wanted || name.split(':').next() == Some(wanted));

        if !found {
            anyhow::bail!(
                "Model '{}' is not installed in Ollama. Run: ollama pull {}",
                wanted,
                wanted
            );
        }

        info!(model = wanted, "model is available");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    raw: bool,
    stream: bool,
    stop: Vec<&'a str>,
    options: GenerateOptions,
}

#[derive(Debug, PartialEq, Serialize)]
struct GenerateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    repeat_penalty: Option<f32>,
    num_predict: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_gpu: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    models: Vec<TagInfo>,
}

#[derive(Debug, Deserialize)]
struct TagInfo {
    name: String,
}
