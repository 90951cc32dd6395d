use std::ops::Range;
use std::time::Duration;

use crate::constants::{ANALYSIS_WINDOW_MS, PAUSE_THRESHOLD_MS, SILENCE_RMS_THRESHOLD};

/// Root mean square energy of a block of 16-bit samples
pub fn rms(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let energy = samples
        .iter()
        .map(|sample| (*sample as f32).powi(2))
        .sum::<f32>()
        / samples.len() as f32;
    energy.sqrt()
}

/// Outcome of feeding more audio to a [`PhraseDetector`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    /// Need more audio
    Listening,
    /// Nothing loud enough before the timeout
    TimedOut,
    /// A phrase occupies this range of the buffer
    Finished(Range<usize>),
}

/// Finds one spoken phrase in a growing sample buffer.
///
/// The buffer is cut into fixed windows; a window whose RMS reaches the
/// threshold counts as speech. The phrase starts at the first loud window
/// and ends after a run of quiet windows or when the phrase limit is hit.
#[derive(Debug, Clone)]
pub struct PhraseDetector {
    window: usize,
    threshold: f32,
    timeout_windows: usize,
    limit_windows: usize,
    pause_windows: usize,
    processed: usize,
    onset: Option<usize>,
    waited: usize,
    phrase_windows: usize,
    silent_run: usize,
}

impl PhraseDetector {
    pub fn new(sample_rate: u32, timeout: Duration, phrase_time_limit: Duration) -> Self {
        let window = (sample_rate as u64 * ANALYSIS_WINDOW_MS / 1000).max(1) as usize;
        let windows = |d: Duration| (d.as_millis() as u64).div_ceil(ANALYSIS_WINDOW_MS).max(1) as usize;

        Self {
            window,
            threshold: SILENCE_RMS_THRESHOLD,
            timeout_windows: windows(timeout),
            limit_windows: windows(phrase_time_limit),
            pause_windows: windows(Duration::from_millis(PAUSE_THRESHOLD_MS)),
            processed: 0,
            onset: None,
            waited: 0,
            phrase_windows: 0,
            silent_run: 0,
        }
    }

    /// Override the loudness threshold
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Examine whatever part of `samples` has not been seen yet.
    /// `samples` must be the same buffer, only ever appended to.
    pub fn update(&mut self, samples: &[i16]) -> Detection {
        while samples.len() - self.processed >= self.window {
            let start = self.processed;
            self.processed += self.window;
            let loud = rms(&samples[start..self.processed]) >= self.threshold;

            match self.onset {
                None if loud => {
                    self.onset = Some(start);
                    self.phrase_windows = 1;
                    self.silent_run = 0;
                }
                None => {
                    self.waited += 1;
                    if self.waited >= self.timeout_windows {
                        return Detection::TimedOut;
                    }
                }
                Some(onset) => {
                    self.phrase_windows += 1;
                    self.silent_run = if loud { 0 } else { self.silent_run + 1 };

                    if self.silent_run >= self.pause_windows
                        || self.phrase_windows >= self.limit_windows
                    {
                        return Detection::Finished(onset..self.processed);
                    }
                }
            }
        }

        Detection::Listening
    }

    /// Whatever phrase has been heard so far, if speech ever started
    pub fn partial(&self) -> Option<Range<usize>> {
        self.onset.map(|onset| onset..self.processed)
    }
}
