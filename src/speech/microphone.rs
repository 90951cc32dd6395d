//! Microphone capture.
//!
//! Real capture goes through cpal and is only compiled with the `voice`
//! feature; without it every call reports that voice support is missing.

#[cfg(feature = "voice")]
pub use capture::{list_input_devices, record_phrase};

#[cfg(not(feature = "voice"))]
pub use stub::{list_input_devices, record_phrase};

#[cfg(not(feature = "voice"))]
mod stub {
    use std::time::Duration;

    use super::super::audio::Recording;
    use crate::utils::{NatterError, RecognitionError};

    const NO_VOICE: &str = "natter was built without the `voice` feature";

    /// Names of the input devices, in index order
    pub fn list_input_devices() -> Result<Vec<String>, NatterError> {
        Err(NatterError::Unsupported(NO_VOICE.to_string()))
    }

    /// Record one phrase from the microphone
    pub fn record_phrase(
        _device_index: Option<usize>,
        _timeout: Duration,
        _phrase_time_limit: Duration,
    ) -> Result<Option<Recording>, RecognitionError> {
        Err(RecognitionError::Audio(NO_VOICE.to_string()))
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_reports_missing_voice_support() {
            assert!(matches!(
                list_input_devices(),
                Err(NatterError::Unsupported(_))
            ));
            assert!(matches!(
                record_phrase(None, Duration::from_secs(1), Duration::from_secs(1)),
                Err(RecognitionError::Audio(_))
            ));
        }
    }
}

#[cfg(feature = "voice")]
mod capture {
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use cpal::{Device, FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};
    use tracing::{debug, warn};

    use super::super::audio::Recording;
    use super::super::detector::{Detection, PhraseDetector};
    use crate::constants::CAPTURE_POLL_INTERVAL_MS;
    use crate::utils::{NatterError, RecognitionError};

    /// Names of the input devices, in index order
    pub fn list_input_devices() -> Result<Vec<String>, NatterError> {
        let devices = cpal::default_host()
            .input_devices()
            .map_err(|e| NatterError::SpeechError(e.to_string()))?;

        Ok(devices
            .map(|d| d.name().unwrap_or_else(|_| "<unnamed device>".to_string()))
            .collect())
    }

    /// Record one phrase from the microphone.
    ///
    /// Blocks until the phrase ends, the phrase limit is hit, or nobody
    /// speaks within `timeout` (`Ok(None)`).
    pub fn record_phrase(
        device_index: Option<usize>,
        timeout: Duration,
        phrase_time_limit: Duration,
    ) -> Result<Option<Recording>, RecognitionError> {
        let device = select_device(device_index)?;
        let supported = device.default_input_config().map_err(audio_error)?;
        let sample_rate = supported.sample_rate().0;
        let config: StreamConfig = supported.config();
        let buffer = Arc::new(Mutex::new(Vec::new()));

        let stream = match supported.sample_format() {
            SampleFormat::F32 => build_stream::<f32>(&device, &config, buffer.clone()),
            SampleFormat::I16 => build_stream::<i16>(&device, &config, buffer.clone()),
            SampleFormat::U16 => build_stream::<u16>(&device, &config, buffer.clone()),
            other => {
                return Err(RecognitionError::Audio(format!(
                    "unsupported sample format {:?}",
                    other
                )))
            }
        }?;
        stream.play().map_err(audio_error)?;

        let mut detector = PhraseDetector::new(sample_rate, timeout, phrase_time_limit);
        // Guard against a device that stops delivering samples
        let deadline = Instant::now() + timeout + phrase_time_limit + Duration::from_secs(1);

        let phrase = loop {
            std::thread::sleep(Duration::from_millis(CAPTURE_POLL_INTERVAL_MS));

            let samples = buffer
                .lock()
                .map_err(|_| RecognitionError::Audio("capture buffer poisoned".to_string()))?;

            match detector.update(&samples) {
                Detection::Listening if Instant::now() < deadline => continue,
                Detection::Listening => {
                    break detector.partial().map(|range| samples[range].to_vec())
                }
                Detection::TimedOut => break None,
                Detection::Finished(range) => break Some(samples[range].to_vec()),
            }
        };
        drop(stream);

        debug!(
            captured = phrase.as_ref().map_or(0, Vec::len),
            sample_rate, "microphone capture finished"
        );
        Ok(phrase.map(|samples| Recording::new(samples, sample_rate)))
    }

    fn select_device(device_index: Option<usize>) -> Result<Device, RecognitionError> {
        let host = cpal::default_host();
        match device_index {
            Some(index) => host
                .input_devices()
                .map_err(audio_error)?
                .nth(index)
                .ok_or_else(|| RecognitionError::Audio(format!("no microphone at index {}", index))),
            None => host
                .default_input_device()
                .ok_or_else(|| RecognitionError::Audio("no input device".to_string())),
        }
    }

    fn build_stream<T>(
        device: &Device,
        config: &StreamConfig,
        buffer: Arc<Mutex<Vec<i16>>>,
    ) -> Result<Stream, RecognitionError>
    where
        T: SizedSample,
        i16: FromSample<T>,
    {
        let channels = config.channels.max(1) as usize;
        device
            .build_input_stream(
                config,
                move |data: &[T], _: &cpal::InputCallbackInfo| {
                    // Keep the first channel of each frame
                    if let Ok(mut guard) = buffer.lock() {
                        guard.extend(data.chunks(channels).map(|frame| frame[0].to_sample::<i16>()));
                    }
                },
                |err| warn!("Audio stream error: {}", err),
                None,
            )
            .map_err(audio_error)
    }

    fn audio_error(err: impl std::fmt::Display) -> RecognitionError {
        RecognitionError::Audio(err.to_string())
    }
}
