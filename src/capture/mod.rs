//! Microphone capture for interview answers.
//!
//! Owns the only live device resource in the application: a single capture
//! handle per interview session, armed and disarmed per question by the
//! answer recorder. Only the session controller initiates acquisition or
//! release; everything else borrows the handle.

pub mod media;
pub mod recorder;

pub use media::{acquire, CaptureConstraints, CaptureError, MediaHandle};
pub use recorder::{AnswerRecorder, RecordError};

pub(crate) use media::suppress_alsa_stderr;
