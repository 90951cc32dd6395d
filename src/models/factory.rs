use anyhow::Result;
use std::time::Duration;

use super::ollama::OllamaModel;
use super::traits::LanguageModel;
use crate::app::ModelSettings;

/// Factory for creating model instances from configuration
pub struct ModelFactory;

impl ModelFactory {
    /// Create the language model described by `settings`.
    /// Fails (and aborts startup) when the server is unreachable or the
    /// model has not been pulled.
    pub async fn create(settings: &ModelSettings) -> Result<Box<dyn LanguageModel>> {
        let model = Self::build(settings)?;
        model.validate_connection().await?;
        Ok(Box::new(model))
    }

    /// List models installed on the configured server
    pub async fn list_available(settings: &ModelSettings) -> Result<Vec<String>> {
        Self::build(settings)?.list_installed().await
    }

    fn build(settings: &ModelSettings) -> Result<OllamaModel> {
        if settings.name.trim().is_empty() {
            anyhow::bail!("No model configured. Set [model] name in config.toml or pass --model");
        }

        OllamaModel::new(
            settings.name.trim(),
            &settings.host,
            settings.device,
            Duration::from_secs(settings.timeout_secs),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_model_name_is_rejected() {
        let settings = ModelSettings {
            name: "  ".to_string(),
            ..ModelSettings::default()
        };

        let err = ModelFactory::create(&settings).await.err().unwrap();
        assert!(err.to_string().contains("No model configured"));
    }
}
