use anyhow::{Context, Result};
use colored::Colorize;

use crate::{
    app::{init_config, Config},
    models::ModelFactory,
    speech::list_input_devices,
};

use super::Commands;

/// Handle CLI subcommands. Returns `false` when the chat should start.
pub async fn handle_command(command: Commands, config: &Config) -> Result<bool> {
    match command {
        Commands::Init => {
            let (path, created) = init_config()?;
            if created {
                println!("Configuration written to {}", path.display());
            } else {
                println!("Configuration already exists at {}", path.display());
            }
            Ok(true)
        }
        Commands::Devices => {
            list_devices()?;
            Ok(true)
        }
        Commands::Models => {
            list_models(config).await?;
            Ok(true)
        }
        Commands::Version => {
            show_version();
            Ok(true)
        }
        Commands::Chat => Ok(false),
    }
}

/// List microphones with the index `voice.device_index` expects
pub fn list_devices() -> Result<()> {
    let devices = list_input_devices().context("Failed to enumerate microphones")?;
    if devices.is_empty() {
        println!("No microphones found");
        return Ok(());
    }

    println!("Available microphone devices:");
    for (index, name) in devices.iter().enumerate() {
        println!("  [{}] {}", index, name);
    }
    Ok(())
}

/// List models installed on the configured Ollama host
pub async fn list_models(config: &Config) -> Result<()> {
    let models = ModelFactory::list_available(&config.model)
        .await
        .with_context(|| format!("Could not reach Ollama at {}", config.model.host))?;

    if models.is_empty() {
        println!("No models installed. Run: ollama pull {}", config.model.name);
        return Ok(());
    }

    println!("Installed models:");
    for model in models {
        if model == config.model.name || model.starts_with(&format!("{}:", config.model.name)) {
            println!("  • {} {}", model.green(), "(configured)".dimmed());
        } else {
            println!("  • {}", model);
        }
    }
    Ok(())
}

/// Show version information
pub fn show_version() {
    println!("natter v{}", env!("CARGO_PKG_VERSION"));
    println!("   A small conversational agent for the terminal");
}
