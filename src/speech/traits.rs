use async_trait::async_trait;
use std::time::Duration;

use crate::utils::{NatterError, RecognitionError};

/// Speech recognition and synthesis used by the voice variant
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechGateway: Send + Sync {
    /// Record one phrase and transcribe it.
    ///
    /// `Ok(None)` means nobody spoke before `timeout` ran out. A phrase is
    /// cut off after `phrase_time_limit`.
    async fn listen(
        &self,
        device_index: Option<usize>,
        timeout: Duration,
        phrase_time_limit: Duration,
    ) -> Result<Option<String>, RecognitionError>;

    /// Say `text` out loud, returning once playback has finished
    async fn speak(&self, text: &str) -> Result<(), NatterError>;

    /// Names of the available microphones, in device-index order
    fn list_microphones(&self) -> Result<Vec<String>, NatterError>;
}
