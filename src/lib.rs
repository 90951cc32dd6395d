pub mod app;
pub mod cli;
pub mod constants;
pub mod models;
pub mod runtime;
pub mod session;
pub mod speech;
pub mod utils;

pub use app::{load_config, Config};
pub use models::{LanguageModel, ModelFactory, TokenSequence};
pub use session::{merge, ConversationState};
pub use speech::SpeechGateway;
pub use utils::{GenerationError, NatterError, RecognitionError};
