use anyhow::{ensure, Context, Result};
use std::path::Path;
use std::process::Command;
use std::time::Duration;

/// Board camera driven through `libcamera-still`.
///
/// The call blocks for the warm-up period plus the capture itself.
pub struct BoardCamera {
    width: u32,
    height: u32,
    warmup: Duration,
}

impl BoardCamera {
    pub fn new(width: u32, height: u32, warmup: Duration) -> Self {
        Self {
            width,
            height,
            warmup,
        }
    }

    fn still_command(&self, path: &Path) -> Command {
        let mut cmd = Command::new("libcamera-still");
        cmd.args([
            "-n", // no preview window
            "-t",
            &self.warmup.as_millis().to_string(),
            "--width",
            &self.width.to_string(),
            "--height",
            &self.height.to_string(),
            "-o",
        ]);
        cmd.arg(path);
        cmd
    }

    pub fn capture_still(&mut self, path: &Path) -> Result<String> {
        tracing::info!("Board photo capture started");

        let out = self
            .still_command(path)
            .output()
            .context("Failed to run libcamera-still")?;

        ensure!(
            out.status.success(),
            "libcamera-still exited with {}: {}",
            out.status,
            String::from_utf8_lossy(&out.stderr).trim()
        );

        tracing::info!("Board photo capture finished");
        Ok(format!("saved {}", path.display()))
    }
}
