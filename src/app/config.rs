use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{
    DEFAULT_LISTEN_TIMEOUT_SECS, DEFAULT_MAX_HISTORY_TOKENS, DEFAULT_MAX_LENGTH, DEFAULT_MODEL,
    DEFAULT_OLLAMA_URL, DEFAULT_PHRASE_TIME_LIMIT_SECS, DEFAULT_TRANSCRIPTION_KEY_ENV,
    DEFAULT_TRANSCRIPTION_MODEL, DEFAULT_TRANSCRIPTION_URL, HTTP_REQUEST_TIMEOUT_SECS,
};
use crate::models::{DevicePreference, SamplingParams};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Model and history settings
    #[serde(default)]
    pub model: ModelSettings,

    /// Sampling parameters passed on every generation
    #[serde(default)]
    pub sampling: SamplingParams,

    /// Voice input/output
    #[serde(default)]
    pub voice: VoiceConfig,

    /// Terminal output
    #[serde(default)]
    pub ui: UIConfig,
}

/// Model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Model name as known to Ollama
    pub name: String,
    /// Ollama server URL
    pub host: String,
    /// Where the model should run
    pub device: DevicePreference,
    /// Upper bound on history plus reply, in tokens
    pub max_length: usize,
    /// Prior history kept before each turn, in tokens; older context is dropped
    pub max_history_tokens: usize,
    /// Request timeout for one generation
    pub timeout_secs: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_MODEL.to_string(),
            host: DEFAULT_OLLAMA_URL.to_string(),
            device: DevicePreference::Auto,
            max_length: DEFAULT_MAX_LENGTH,
            max_history_tokens: DEFAULT_MAX_HISTORY_TOKENS,
            timeout_secs: HTTP_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// Voice configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceConfig {
    /// Listen on the microphone and speak replies
    pub enabled: bool,
    /// Microphone index; asked interactively when unset
    pub device_index: Option<usize>,
    /// Seconds to wait for speech to start
    pub listen_timeout_secs: u64,
    /// Longest phrase recorded, in seconds
    pub phrase_time_limit_secs: u64,
    /// OpenAI-compatible transcription endpoint
    pub transcription_url: String,
    pub transcription_model: String,
    /// Environment variable holding the transcription API key
    pub api_key_env: String,
    /// Text-to-speech command; detected when unset
    pub tts_command: Option<String>,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            device_index: None,
            listen_timeout_secs: DEFAULT_LISTEN_TIMEOUT_SECS,
            phrase_time_limit_secs: DEFAULT_PHRASE_TIME_LIMIT_SECS,
            transcription_url: DEFAULT_TRANSCRIPTION_URL.to_string(),
            transcription_model: DEFAULT_TRANSCRIPTION_MODEL.to_string(),
            api_key_env: DEFAULT_TRANSCRIPTION_KEY_ENV.to_string(),
            tts_command: None,
        }
    }
}

/// UI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UIConfig {
    /// Colorize the transcript
    pub color: bool,
    /// Show how long each reply took
    pub show_timing: bool,
    pub user_label: String,
    pub bot_label: String,
}

impl Default for UIConfig {
    fn default() -> Self {
        Self {
            color: true,
            show_timing: false,
            user_label: "You".to_string(),
            bot_label: "Chatbot".to_string(),
        }
    }
}

/// Load configuration from multiple sources.
///
/// Later sources win: defaults, the global config file, `.natter/config.toml`
/// in the working directory, `explicit` (which must exist), then `NATTER_`
/// environment variables (`NATTER_MODEL__NAME=...`).
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let mut files = Vec::new();

    if let Ok(config_dir) = get_config_dir() {
        files.push(config_dir.join("config.toml"));
    }
    files.push(PathBuf::from(".natter/config.toml"));

    if let Some(path) = explicit {
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        files.push(path.to_path_buf());
    }

    build_figment(&files)
        .merge(env_provider())
        .extract()
        .context("Failed to load configuration")
}

/// Defaults overlaid with whichever of `files` exist, in order
fn build_figment(files: &[PathBuf]) -> Figment {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));

    for file in files.iter().filter(|f| f.exists()) {
        figment = figment.merge(Toml::file(file));
    }

    figment
}

fn env_provider() -> Env {
    Env::prefixed("NATTER_").split("__")
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "natter") {
        Ok(proj_dirs.config_dir().to_path_buf())
    } else {
        // Fallback to home directory
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .context("Could not determine home directory")?;
        Ok(PathBuf::from(home).join(".config").join("natter"))
    }
}

/// Save configuration to file
pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let toml_string = toml::to_string_pretty(config)?;
    std::fs::write(path, toml_string)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;

    Ok(())
}

/// Create a default configuration file if it doesn't exist.
/// Returns the path and whether it was newly written.
pub fn init_config() -> Result<(PathBuf, bool)> {
    let config_file = get_config_dir()?.join("config.toml");

    if config_file.exists() {
        return Ok((config_file, false));
    }

    save_config(&Config::default(), &config_file)?;
    Ok((config_file, true))
}
