// Gateway module for utils - follows the Train Station Pattern
// All external access must go through this gateway

// Private submodules - not directly accessible from outside
mod errors;
mod logger;
mod tokenizer;

// Public re-exports - the ONLY way to access utils functionality
pub use errors::{GenerationError, NatterError, RecognitionError};
pub use logger::{init_logger, log_progress};
pub use tokenizer::{Tokenizer, END_OF_TEXT};
