//! Per-question answer recording against a live capture handle.
//!
//! A recorder arms the handle's shared sample sink on start and, on stop,
//! drains the buffered samples and finalizes them as one in-memory WAV blob.
//! At most one recorder may be armed against a handle at a time; dropping a
//! recorder without stopping discards the partial take.

use crate::capture::media::{MediaHandle, SharedCapture};
use std::io::Cursor;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordError {
    /// The capture handle was already released; there is nothing to record from.
    #[error("capture handle has no live tracks")]
    NoLiveTracks,
    /// Another recorder is already armed against this handle.
    #[error("a recording is already in progress for this capture handle")]
    AlreadyRecording,
    /// The recording finished with zero captured samples.
    #[error("no audio was captured for this answer")]
    Empty,
    /// WAV finalization failed.
    #[error("failed to encode answer audio: {0}")]
    Encode(#[from] hound::Error),
}

/// An armed recording for a single interview question.
///
/// Created by [`AnswerRecorder::start`], finalized by [`AnswerRecorder::stop`].
pub struct AnswerRecorder {
    shared: Arc<SharedCapture>,
    stopped: bool,
}

impl AnswerRecorder {
    /// Arms the capture handle for a new answer.
    ///
    /// Clears any leftover samples from a previous take before arming.
    ///
    /// # Errors
    /// - [`RecordError::NoLiveTracks`] if the handle has been released
    /// - [`RecordError::AlreadyRecording`] if another recorder is armed
    pub fn start(handle: &MediaHandle) -> Result<Self, RecordError> {
        if handle.is_released() {
            return Err(RecordError::NoLiveTracks);
        }

        let shared = handle.shared();
        if !shared.try_arm() {
            return Err(RecordError::AlreadyRecording);
        }

        tracing::debug!("Answer recording started");
        Ok(Self {
            shared,
            stopped: false,
        })
    }

    /// Disarms capture and finalizes the buffered samples as a WAV blob
    /// (16-bit mono PCM at the device's native rate).
    ///
    /// # Errors
    /// - [`RecordError::Empty`] if no samples were captured; the caller
    ///   should let the user redo the question
    /// - [`RecordError::Encode`] if WAV finalization fails
    pub fn stop(mut self) -> Result<Vec<u8>, RecordError> {
        self.stopped = true;
        self.shared.disarm();

        let samples = self.shared.take_samples();
        if samples.is_empty() {
            tracing::warn!("Recording stopped with no samples captured");
            return Err(RecordError::Empty);
        }

        let sample_rate = self.shared.sample_rate();
        let duration_secs = samples.len() as f32 / sample_rate as f32;
        tracing::info!(
            "Answer recorded: {:.2}s ({} samples at {}Hz)",
            duration_secs,
            samples.len(),
            sample_rate
        );

        encode_wav(&samples, sample_rate)
    }
}

impl Drop for AnswerRecorder {
    fn drop(&mut self) {
        // Abandoned mid-answer: discard the partial take, no Answer is produced.
        if !self.stopped {
            self.shared.disarm();
            let discarded = self.shared.take_samples().len();
            tracing::debug!("Partial answer discarded ({} samples)", discarded);
        }
    }
}

/// Encodes mono i16 samples as an in-memory WAV file.
fn encode_wav(samples: &[i16], sample_rate: u32) -> Result<Vec<u8>, RecordError> {
    let wav_spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, wav_spec)?;
        for &sample in samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
    }

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_fails_on_released_handle() {
        let mut handle = MediaHandle::synthetic(16000);
        handle.release();
        assert!(matches!(
            AnswerRecorder::start(&handle),
            Err(RecordError::NoLiveTracks)
        ));
    }

    #[test]
    fn only_one_recorder_at_a_time() {
        let handle = MediaHandle::synthetic(16000);
        let first = AnswerRecorder::start(&handle).unwrap();
        assert!(matches!(
            AnswerRecorder::start(&handle),
            Err(RecordError::AlreadyRecording)
        ));
        drop(first);
        // After the first recorder is gone a new one can arm again.
        assert!(AnswerRecorder::start(&handle).is_ok());
    }

    #[test]
    fn stop_without_samples_is_empty() {
        let handle = MediaHandle::synthetic(16000);
        let recorder = AnswerRecorder::start(&handle).unwrap();
        assert!(matches!(recorder.stop(), Err(RecordError::Empty)));
    }

    #[test]
    fn stop_finalizes_wav_blob() {
        let handle = MediaHandle::synthetic(16000);
        let shared = handle.shared();
        let recorder = AnswerRecorder::start(&handle).unwrap();
        shared.push_test_samples(&[0, 1000, -1000, 500]);

        let blob = recorder.stop().unwrap();

        // RIFF/WAVE header plus 4 samples * 2 bytes of PCM data.
        assert_eq!(&blob[0..4], b"RIFF");
        assert_eq!(&blob[8..12], b"WAVE");
        assert_eq!(blob.len(), 44 + 8);
    }

    #[test]
    fn drop_discards_partial_take() {
        let handle = MediaHandle::synthetic(16000);
        let shared = handle.shared();
        let recorder = AnswerRecorder::start(&handle).unwrap();
        shared.push_test_samples(&[1, 2, 3]);

        drop(recorder);

        assert!(!shared.is_armed());
        assert_eq!(shared.sample_count(), 0);
    }
}
