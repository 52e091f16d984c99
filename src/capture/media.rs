use crate::state::Device;
use anyhow::{Context, Result};
use chrono::{DateTime, Local, TimeZone};
use std::fs;
use std::path::{Path, PathBuf};

const TIMESTAMP_FORMAT: &str = "%m%d%Y-%H%M%S";

/// Flat media layout: `photos/` and `videos/` under one root.
pub struct MediaDir {
    photos: PathBuf,
    videos: PathBuf,
}

impl MediaDir {
    pub fn create<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        let photos = root.join("photos");
        let videos = root.join("videos");

        for dir in [&photos, &videos] {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create media directory {}", dir.display()))?;
        }

        tracing::info!("Writing media under {}", root.display());

        Ok(Self { photos, videos })
    }

    pub fn photo_path(&self, device: Device) -> PathBuf {
        self.photos.join(file_name(device, &Local::now(), "jpg"))
    }

    pub fn video_path(&self, device: Device) -> PathBuf {
        self.videos.join(file_name(device, &Local::now(), "mp4"))
    }
}

fn file_name<Tz: TimeZone>(device: Device, at: &DateTime<Tz>, extension: &str) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "{}-{}.{}",
        device.file_tag(),
        at.format(TIMESTAMP_FORMAT),
        extension
    )
}
