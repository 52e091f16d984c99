mod board;
mod media;
mod webcam;

pub use board::BoardCamera;
pub use media::MediaDir;
pub use webcam::Webcam;

use crate::state::Device;
use anyhow::Result;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Structured result of a backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureOutcome {
    pub success: bool,
    pub message: String,
}

impl CaptureOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

impl From<Result<String>> for CaptureOutcome {
    fn from(result: Result<String>) -> Self {
        match result {
            Ok(message) => Self::ok(message),
            Err(err) => Self::failed(format!("{err:#}")),
        }
    }
}

impl fmt::Display for CaptureOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.success { "ok" } else { "failed" };
        write!(f, "{}: {}", status, self.message)
    }
}

/// Trait for whatever actually drives the cameras
///
/// Calls block until the backend returns. A video start may hand the
/// recording off to a background process and return early.
pub trait CaptureBackend {
    /// Take a single still on `device`
    fn take_photo(&mut self, device: Device) -> CaptureOutcome;

    /// Start a recording of `duration` on `device`
    fn start_video(&mut self, device: Device, duration: Duration) -> CaptureOutcome;
}

/// Settings for the production camera rig
#[derive(Debug, Clone)]
pub struct RigConfig {
    pub media_dir: PathBuf,
    pub up_index: u32,
    pub down_index: u32,
    pub board_width: u32,
    pub board_height: u32,
    pub board_warmup: Duration,
}

/// The three cameras on the payload behind one backend.
pub struct CameraRig {
    board: BoardCamera,
    up: Webcam,
    down: Webcam,
    media: MediaDir,
}

impl CameraRig {
    pub fn new(config: &RigConfig) -> Result<Self> {
        let media = MediaDir::create(&config.media_dir)?;

        Ok(Self {
            board: BoardCamera::new(config.board_width, config.board_height, config.board_warmup),
            up: Webcam::new(Device::Up, config.up_index),
            down: Webcam::new(Device::Down, config.down_index),
            media,
        })
    }
}

impl CaptureBackend for CameraRig {
    fn take_photo(&mut self, device: Device) -> CaptureOutcome {
        let path = self.media.photo_path(device);
        let result = match device {
            Device::Board => self.board.capture_still(&path),
            Device::Up => self.up.capture_still(&path),
            Device::Down => self.down.capture_still(&path),
        };
        result.into()
    }

    fn start_video(&mut self, device: Device, duration: Duration) -> CaptureOutcome {
        if !device.supports_video() {
            return CaptureOutcome::failed(format!("{device} camera does not record video"));
        }

        let path = self.media.video_path(device);
        let webcam = match device {
            Device::Up => &mut self.up,
            _ => &mut self.down,
        };
        webcam.start_recording(&path, duration).into()
    }
}
