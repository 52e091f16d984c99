use std::fmt;
use std::time::Duration;

/// Camera endpoints on the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Device {
    /// Dedicated board camera, photo only
    Board,
    /// Upward-facing USB webcam
    Up,
    /// Downward-facing USB webcam
    Down,
}

impl Device {
    /// Whether the device can record timed video
    pub fn supports_video(self) -> bool {
        !matches!(self, Device::Board)
    }

    /// Short tag used in media filenames
    pub fn file_tag(self) -> &'static str {
        match self {
            Device::Board => "RPI",
            Device::Up => "UP",
            Device::Down => "DOWN",
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Device::Board => "board",
            Device::Up => "up",
            Device::Down => "down",
        };
        f.write_str(name)
    }
}

/// Flight phase selected over the command link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Regular,
    Takeoff,
    Peak,
    Landing,
}

impl Mode {
    /// Map a command digit to a mode. Only `0..=3` are valid.
    pub fn from_digit(digit: u32) -> Option<Self> {
        match digit {
            0 => Some(Mode::Regular),
            1 => Some(Mode::Takeoff),
            2 => Some(Mode::Peak),
            3 => Some(Mode::Landing),
            _ => None,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Regular => "regular",
            Mode::Takeoff => "takeoff",
            Mode::Peak => "peak",
            Mode::Landing => "landing",
        };
        f.write_str(name)
    }
}

/// Presumed video state of one webcam.
///
/// Nothing reports back when a recording really ends, so `active` is cleared
/// purely from elapsed time against `started_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaptureState {
    pub active: bool,
    /// `None` until the first video start; compares as expired for any threshold
    pub started_at: Option<Duration>,
    /// Duration the last video was started with
    pub declared: Duration,
}

impl CaptureState {
    /// Time since the last video start, `None` if no video ever started
    pub fn elapsed(&self, now: Duration) -> Option<Duration> {
        self.started_at.map(|start| now.saturating_sub(start))
    }

    /// True once more than `limit` has passed since the last start.
    /// A device that never recorded is always past any limit.
    pub fn exceeded(&self, now: Duration, limit: Duration) -> bool {
        self.elapsed(now).map_or(true, |elapsed| elapsed > limit)
    }

    pub fn mark_started(&mut self, now: Duration, declared: Duration) {
        self.active = true;
        self.started_at = Some(now);
        self.declared = declared;
    }
}

/// Everything the scheduler remembers between ticks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModeState {
    pub mode: Mode,
    pub up: CaptureState,
    pub down: CaptureState,
}

impl ModeState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn capture_mut(&mut self, device: Device) -> Option<&mut CaptureState> {
        match device {
            Device::Up => Some(&mut self.up),
            Device::Down => Some(&mut self.down),
            Device::Board => None,
        }
    }

    /// Neither webcam is presumed to be recording
    pub fn both_idle(&self) -> bool {
        !self.up.active && !self.down.active
    }
}
