// Gateway module for speech - follows the Train Station Pattern
// All external access must go through this gateway

// Private submodules - not directly accessible from outside
mod audio;
mod detector;
mod microphone;
mod selector;
mod synthesis;
mod system;
mod traits;
mod transcription;

// Public re-exports - the ONLY way to access speech functionality
pub use audio::Recording;
pub use detector::{rms, Detection, PhraseDetector};
pub use microphone::list_input_devices;
pub use selector::{parse_selection, select_microphone};
pub use synthesis::Synthesizer;
pub use system::SystemSpeech;
pub use traits::SpeechGateway;
pub use transcription::Transcriber;

#[cfg(test)]
pub use traits::MockSpeechGateway;
