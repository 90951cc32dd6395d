/// Constants module to avoid magic numbers in the codebase

// Network Configuration
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_TRANSCRIPTION_URL: &str = "https://api.groq.com/openai/v1/audio/transcriptions";
pub const DEFAULT_TRANSCRIPTION_MODEL: &str = "whisper-large-v3-turbo";
pub const DEFAULT_TRANSCRIPTION_KEY_ENV: &str = "GROQ_API_KEY";

// Timeouts
pub const HTTP_REQUEST_TIMEOUT_SECS: u64 = 600; // 10 minutes for slow CPU generation
pub const HEALTH_CHECK_TIMEOUT_SECS: u64 = 3;
pub const DEFAULT_LISTEN_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_PHRASE_TIME_LIMIT_SECS: u64 = 10;

// Default Model Configuration
pub const DEFAULT_MODEL: &str = "tinyllama";
pub const DEFAULT_MAX_LENGTH: usize = 1000;
pub const DEFAULT_MAX_HISTORY_TOKENS: usize = 768;
pub const DEFAULT_TEMPERATURE: f32 = 0.8;
pub const DEFAULT_TOP_K: u32 = 100;
pub const DEFAULT_TOP_P: f32 = 0.7;
pub const DEFAULT_NO_REPEAT_NGRAM_SIZE: u32 = 3;
pub const OLLAMA_ALL_GPU_LAYERS: i32 = 999;

// Audio capture
pub const SILENCE_RMS_THRESHOLD: f32 = 500.0;
pub const ANALYSIS_WINDOW_MS: u64 = 30;
pub const PAUSE_THRESHOLD_MS: u64 = 800; // Trailing silence that ends a phrase
pub const CAPTURE_POLL_INTERVAL_MS: u64 = 50;

// Conversation
pub const QUIT_COMMANDS: &[&str] = &["quit", "exit", "bye"];
pub const CLEAR_COMMAND: &str = "clear";
pub const HELP_COMMAND: &str = "help";

pub const TEXT_GREETING: &str = "Chatbot is ready! Type 'quit' to exit.";
pub const VOICE_GREETING: &str = "Voice assistant ready. Say something!";
pub const FAREWELL: &str = "Goodbye! Have a great day!";
pub const CLEARED_NOTICE: &str = "Conversation history cleared.";
pub const RESTART_NOTICE: &str = "Let's start a new conversation.";
pub const MISHEARD_NOTICE: &str = "Sorry, I didn't catch that.";
pub const RECOGNITION_FAILED_NOTICE: &str = "Speech recognition service failed.";

pub const HELP_TEXT: &str = "\
Commands:
  help               Show this message
  clear              Forget the conversation so far
  quit | exit | bye  Leave
Anything else is sent to the model.";
