// Gateway module for models - follows the Train Station Pattern
// All external access must go through this gateway

// Private submodules - not directly accessible from outside
mod factory;
mod ollama;
mod traits;
mod types;

// Public re-exports - the ONLY way to access model functionality
pub use factory::ModelFactory;
pub use ollama::OllamaModel;
pub use traits::LanguageModel;
pub use types::{DevicePreference, SamplingParams, TokenSequence};

#[cfg(test)]
pub use traits::MockLanguageModel;
