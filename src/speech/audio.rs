use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::Cursor;

use crate::utils::RecognitionError;

/// Mono 16-bit PCM captured from a microphone
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
}

impl Recording {
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Length of the recording in seconds
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Encode as an in-memory WAV file
    pub fn to_wav(&self) -> Result<Vec<u8>, RecognitionError> {
        let spec = WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec).map_err(wav_error)?;
            for &sample in &self.samples {
                writer.write_sample(sample).map_err(wav_error)?;
            }
            writer.finalize().map_err(wav_error)?;
        }

        Ok(cursor.into_inner())
    }
}

fn wav_error(err: hound::Error) -> RecognitionError {
    RecognitionError::Audio(format!("failed to encode WAV: {}", err))
}
