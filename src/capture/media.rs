//! Audio input acquisition and the capture handle lifecycle.
//!
//! Wraps cpal device lookup and input stream creation behind a single
//! `acquire`/`release` contract. The returned [`MediaHandle`] is the only
//! owner of the live input stream; while it is open the platform shows its
//! capture indicator, so release must happen on every exit path. Samples are
//! downmixed to mono i16 and buffered in a shared sink that the answer
//! recorder arms and drains per question.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[cfg(target_os = "linux")]
use std::fs::OpenOptions;
#[cfg(target_os = "linux")]
use std::os::unix::io::AsRawFd;

/// Typed acquisition failures, mirroring the capture taxonomy the rest of
/// the session flow is written against. Acquisition never retries on its
/// own; the caller decides whether to prompt the user again.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The requested device (or any default input device) does not exist.
    #[error("audio input device not found: {0}")]
    NotFound(String),
    /// The device exists but its stream could not be opened, typically
    /// because another application holds it or access is forbidden.
    #[error("audio input device could not be opened: {0}")]
    NotAllowed(String),
    /// The stream was created but failed to start producing samples.
    #[error("audio input stream failed to start: {0}")]
    NotReadable(String),
}

/// Requested capture parameters, read from the `[audio]` config section.
#[derive(Debug, Clone)]
pub struct CaptureConstraints {
    /// Device name, numeric index, or "default" for the system default
    pub device: String,
    /// Requested sample rate in Hz (actual may differ based on device)
    pub sample_rate: u32,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            device: "default".to_string(),
            sample_rate: 16000,
        }
    }
}

/// Capture state shared between the input stream callback, the media handle
/// and the answer recorder.
pub(crate) struct SharedCapture {
    /// Buffered mono i16 samples for the currently armed recording
    samples: Mutex<Vec<i16>>,
    /// Whether a recorder is currently armed against this handle
    armed: AtomicBool,
    /// Whether the handle has been released (all tracks stopped)
    released: AtomicBool,
    /// Cleared by the stream error callback when the device dies mid-session
    healthy: AtomicBool,
    /// Number of times the release side effect actually ran; stays at 1
    /// no matter how many times `release` is called
    release_count: AtomicUsize,
    /// Actual recording sample rate from the device
    sample_rate: u32,
}

impl SharedCapture {
    fn new(sample_rate: u32) -> Self {
        Self {
            samples: Mutex::new(Vec::new()),
            armed: AtomicBool::new(false),
            released: AtomicBool::new(false),
            healthy: AtomicBool::new(true),
            release_count: AtomicUsize::new(0),
            sample_rate,
        }
    }

    pub(crate) fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Arms the sink for a new recording. Fails if another recorder holds it.
    pub(crate) fn try_arm(&self) -> bool {
        if self
            .armed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }
        self.samples.lock().unwrap().clear();
        true
    }

    pub(crate) fn disarm(&self) {
        self.armed.store(false, Ordering::SeqCst);
    }

    pub(crate) fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }

    pub(crate) fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    /// Drains all buffered samples for finalization.
    pub(crate) fn take_samples(&self) -> Vec<i16> {
        std::mem::take(&mut *self.samples.lock().unwrap())
    }

    pub(crate) fn sample_count(&self) -> usize {
        self.samples.lock().unwrap().len()
    }

    fn mark_unhealthy(&self) {
        self.healthy.store(false, Ordering::SeqCst);
    }

    /// Appends incoming device samples, downmixed to mono by averaging
    /// all channels per frame.
    fn push_downmixed(&self, data: &[i16], num_channels: usize) {
        let mut samples = self.samples.lock().unwrap();

        match num_channels {
            1 => {
                samples.extend_from_slice(data);
            }
            2 => {
                for chunk in data.chunks_exact(2) {
                    let left = chunk[0] as i32;
                    let right = chunk[1] as i32;
                    samples.push(((left + right) / 2) as i16);
                }
            }
            _ => {
                for chunk in data.chunks_exact(num_channels) {
                    let sum: i32 = chunk.iter().map(|&s| s as i32).sum();
                    samples.push((sum / num_channels as i32) as i16);
                }
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn push_test_samples(&self, data: &[i16]) {
        self.samples.lock().unwrap().extend_from_slice(data);
    }

    #[cfg(test)]
    pub(crate) fn release_count(&self) -> usize {
        self.release_count.load(Ordering::SeqCst)
    }
}

/// The live microphone handle for one interview session.
///
/// Holds the cpal input stream alive while open. Shared by reference with
/// the answer recorder through [`SharedCapture`]; only the session
/// controller calls `release`. Dropping an unreleased handle releases it.
pub struct MediaHandle {
    /// Active audio input stream (None once released, or for test handles)
    stream: Option<cpal::Stream>,
    shared: Arc<SharedCapture>,
}

impl MediaHandle {
    /// Stops every underlying track and drops the device handle.
    ///
    /// Idempotent: the stream is stopped on the first call only, later calls
    /// are no-ops. Any armed recording is disarmed first so the recorder
    /// never finalizes against dead tracks.
    pub fn release(&mut self) {
        if self
            .shared
            .released
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }
        self.shared.disarm();
        self.stream = None;
        self.shared.release_count.fetch_add(1, Ordering::SeqCst);
        tracing::debug!("Capture handle released");
    }

    pub fn is_released(&self) -> bool {
        self.shared.is_released()
    }

    /// False once the stream error callback has fired (device unplugged,
    /// access revoked). The session is degraded but not auto-recovered.
    pub fn is_healthy(&self) -> bool {
        self.shared.healthy.load(Ordering::SeqCst)
    }

    /// Actual recording sample rate reported by the device.
    pub fn sample_rate(&self) -> u32 {
        self.shared.sample_rate()
    }

    pub(crate) fn shared(&self) -> Arc<SharedCapture> {
        Arc::clone(&self.shared)
    }

    /// A handle with no device stream behind it, for exercising the session
    /// flow without hardware.
    #[cfg(test)]
    pub(crate) fn synthetic(sample_rate: u32) -> Self {
        Self {
            stream: None,
            shared: Arc::new(SharedCapture::new(sample_rate)),
        }
    }
}

impl Drop for MediaHandle {
    fn drop(&mut self) {
        self.release();
    }
}

/// Opens the configured input device and starts its capture stream.
///
/// The stream runs for the whole session; samples are only buffered while a
/// recorder is armed. The platform capture indicator is active for the
/// handle's lifetime.
///
/// # Errors
/// - [`CaptureError::NotFound`] if no matching device exists
/// - [`CaptureError::NotAllowed`] if the device cannot be configured or opened
/// - [`CaptureError::NotReadable`] if the stream fails to start
pub fn acquire(constraints: &CaptureConstraints) -> Result<MediaHandle, CaptureError> {
    // Get device while suppressing ALSA library warnings
    let device = suppress_alsa_stderr(|| {
        let host = cpal::default_host();

        if constraints.device == "default" {
            host.default_input_device().ok_or_else(|| {
                CaptureError::NotFound("no default audio input device available".to_string())
            })
        } else {
            find_device_by_name(&host, &constraints.device)
        }
    })?;

    let device_name = device
        .name()
        .unwrap_or_else(|_| "Unknown device".to_string());
    tracing::info!("Capture device: {}", device_name);

    let device_config = device
        .default_input_config()
        .map_err(|e| CaptureError::NotAllowed(e.to_string()))?;
    let device_sample_rate = device_config.sample_rate().0;
    let num_channels = device_config.channels() as usize;

    if device_sample_rate != constraints.sample_rate {
        tracing::warn!(
            "Requested sample rate {}Hz but device uses {}Hz. Recording at device rate.",
            constraints.sample_rate,
            device_sample_rate
        );
    }

    tracing::debug!(
        "Device configuration: {}Hz, {} channels",
        device_sample_rate,
        num_channels
    );

    let shared = Arc::new(SharedCapture::new(device_sample_rate));

    // Set up audio callback with cloned Arc references
    let sink = Arc::clone(&shared);
    let error_sink = Arc::clone(&shared);
    let callback_channels = num_channels;

    let stream = device
        .build_input_stream(
            &device_config.into(),
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                if sink.is_armed() {
                    sink.push_downmixed(data, callback_channels);
                }
            },
            move |err| {
                tracing::error!("Audio stream error: {}", err);
                error_sink.mark_unhealthy();
            },
            None,
        )
        .map_err(|e| match e {
            cpal::BuildStreamError::DeviceNotAvailable => {
                CaptureError::NotFound("audio input device is no longer available".to_string())
            }
            other => CaptureError::NotAllowed(other.to_string()),
        })?;

    stream
        .play()
        .map_err(|e| CaptureError::NotReadable(e.to_string()))?;

    tracing::debug!("Audio stream started");
    Ok(MediaHandle {
        stream: Some(stream),
        shared,
    })
}

/// Finds an audio input device by name or numeric index.
///
/// # Arguments
/// * `host` - The cpal audio host
/// * `device_spec` - A device name, or a numeric index (0, 1, 2, etc.)
///
/// # Errors
/// - If no device with the specified name/index is found
fn find_device_by_name(host: &cpal::Host, device_spec: &str) -> Result<cpal::Device, CaptureError> {
    // Try to parse as a numeric index first
    if let Ok(index) = device_spec.parse::<usize>() {
        let devices: Vec<_> = host
            .input_devices()
            .map_err(|e| CaptureError::NotAllowed(format!("failed to enumerate devices: {e}")))?
            .collect();

        if index < devices.len() {
            return Ok(devices.into_iter().nth(index).unwrap());
        } else {
            return Err(CaptureError::NotFound(format!(
                "device index {} is out of range (0-{})",
                index,
                devices.len().saturating_sub(1)
            )));
        }
    }

    // Try to find by name
    let devices = host
        .input_devices()
        .map_err(|e| CaptureError::NotAllowed(format!("failed to enumerate devices: {e}")))?;

    for device in devices {
        if let Ok(name) = device.name() {
            if name == device_spec {
                return Ok(device);
            }
        }
    }

    Err(CaptureError::NotFound(format!(
        "audio input device '{device_spec}' not found. Use 'resuwin list-devices' to see available devices."
    )))
}

/// Temporarily redirects stderr to /dev/null to suppress ALSA library warnings on Linux.
/// Falls back to running the closure unsuppressed if the redirect cannot be set up.
/// On non-Linux platforms, this is a no-op since ALSA doesn't exist.
#[cfg(target_os = "linux")]
pub(crate) fn suppress_alsa_stderr<F, T>(f: F) -> T
where
    F: FnOnce() -> T,
{
    let dev_null = match OpenOptions::new().write(true).open("/dev/null") {
        Ok(file) => file,
        Err(_) => return f(),
    };

    let dev_null_fd = dev_null.as_raw_fd();

    // Save the current stderr file descriptor
    let old_stderr = unsafe { libc::dup(libc::STDERR_FILENO) };
    if old_stderr == -1 {
        return f();
    }

    // Redirect stderr to /dev/null
    let redirect_result = unsafe { libc::dup2(dev_null_fd, libc::STDERR_FILENO) };
    if redirect_result == -1 {
        unsafe { libc::close(old_stderr) };
        return f();
    }

    let result = f();

    // Restore the original stderr
    unsafe {
        libc::dup2(old_stderr, libc::STDERR_FILENO);
        libc::close(old_stderr);
    }

    result
}

/// On non-Linux platforms, no stderr suppression is needed since ALSA doesn't exist.
#[cfg(not(target_os = "linux"))]
pub(crate) fn suppress_alsa_stderr<F, T>(f: F) -> T
where
    F: FnOnce() -> T,
{
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_is_idempotent_and_runs_once() {
        let mut handle = MediaHandle::synthetic(16000);
        let shared = handle.shared();
        assert!(!handle.is_released());

        handle.release();
        handle.release();
        handle.release();

        assert!(handle.is_released());
        assert_eq!(shared.release_count(), 1);
    }

    #[test]
    fn drop_releases_unreleased_handle() {
        let handle = MediaHandle::synthetic(16000);
        let shared = handle.shared();
        drop(handle);
        assert!(shared.is_released());
        assert_eq!(shared.release_count(), 1);
    }

    #[test]
    fn drop_after_release_does_not_release_twice() {
        let mut handle = MediaHandle::synthetic(16000);
        let shared = handle.shared();
        handle.release();
        drop(handle);
        assert_eq!(shared.release_count(), 1);
    }

    #[test]
    fn release_disarms_active_recording() {
        let mut handle = MediaHandle::synthetic(16000);
        let shared = handle.shared();
        assert!(shared.try_arm());
        handle.release();
        assert!(!shared.is_armed());
    }

    #[test]
    fn arm_is_exclusive() {
        let handle = MediaHandle::synthetic(16000);
        let shared = handle.shared();
        assert!(shared.try_arm());
        assert!(!shared.try_arm());
        shared.disarm();
        assert!(shared.try_arm());
    }

    #[test]
    fn arming_clears_previous_samples() {
        let handle = MediaHandle::synthetic(16000);
        let shared = handle.shared();
        shared.push_test_samples(&[1, 2, 3]);
        assert!(shared.try_arm());
        assert_eq!(shared.sample_count(), 0);
    }

    #[test]
    fn downmix_averages_stereo_pairs() {
        let shared = SharedCapture::new(16000);
        shared.push_downmixed(&[100, 200, -50, 50], 2);
        assert_eq!(shared.take_samples(), vec![150, 0]);
    }

    #[test]
    fn downmix_averages_all_channels() {
        let shared = SharedCapture::new(16000);
        shared.push_downmixed(&[30, 60, 90], 3);
        assert_eq!(shared.take_samples(), vec![60]);
    }
}
