use crate::state::Device;
use anyhow::{Context, Result};
use image::RgbImage;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

/// USB webcam: stills through nokhwa, recordings through a background ffmpeg.
pub struct Webcam {
    device: Device,
    index: u32,
    recordings: Vec<Child>,
}

impl Webcam {
    pub fn new(device: Device, index: u32) -> Self {
        Self {
            device,
            index,
            recordings: Vec::new(),
        }
    }

    pub fn capture_still(&mut self, path: &Path) -> Result<String> {
        tracing::info!("{} photo capture started", self.device);

        let index = CameraIndex::Index(self.index);
        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution);

        let mut camera = Camera::new(index, requested)
            .with_context(|| format!("Failed to open {} webcam", self.device))?;

        camera
            .open_stream()
            .context("Failed to open camera stream")?;

        let frame = camera.frame().context("Failed to capture frame");
        if let Err(err) = camera.stop_stream() {
            tracing::debug!("Failed to stop {} stream: {}", self.device, err);
        }

        let decoded: RgbImage = frame?
            .decode_image::<RgbFormat>()
            .context("Failed to decode frame")?;

        decoded
            .save(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        tracing::info!("{} photo capture finished", self.device);
        Ok(format!("saved {}", path.display()))
    }

    fn record_command(&self, path: &Path, duration: Duration) -> Command {
        let mut cmd = Command::new("ffmpeg");
        cmd.args([
            "-hide_banner",
            "-loglevel",
            "error",
            "-f",
            "video4linux2",
            "-i",
            &format!("/dev/video{}", self.index),
            "-t",
            &duration.as_secs().to_string(),
            "-y",
        ]);
        cmd.arg(path);
        cmd
    }

    /// Spawn the recording and return without waiting for it.
    pub fn start_recording(&mut self, path: &Path, duration: Duration) -> Result<String> {
        self.reap();

        tracing::info!(
            "{} video capture started ({}s)",
            self.device,
            duration.as_secs()
        );

        let child = self
            .record_command(path, duration)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .context("Failed to spawn ffmpeg")?;

        let pid = child.id();
        self.recordings.push(child);

        Ok(format!("recording {} (pid {})", path.display(), pid))
    }

    /// Drop handles of recordings that have exited.
    fn reap(&mut self) {
        let device = self.device;
        self.recordings.retain_mut(|child| match child.try_wait() {
            Ok(Some(status)) => {
                if !status.success() {
                    tracing::warn!("{} recording exited with {}", device, status);
                }
                false
            }
            Ok(None) => true,
            Err(err) => {
                tracing::warn!("Failed to poll {} recording: {}", device, err);
                false
            }
        });
    }
}
