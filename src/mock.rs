//! Test doubles for driving the scheduler without hardware or real time.

use crate::capture::{CaptureBackend, CaptureOutcome};
use crate::clock::Clock;
use crate::link::{CommandChannel, LinkError};
use crate::state::Device;
use std::cell::Cell;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::time::Duration;

/// Virtual clock. `sleep` advances time instantly.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

/// Command link fed from a script of timed lines.
///
/// A line becomes readable once the shared clock reaches its arrival time.
pub struct ScriptedChannel<'a> {
    clock: &'a ManualClock,
    lines: VecDeque<(Duration, String)>,
    sent: Vec<String>,
    failing_reads: u32,
}

impl<'a> ScriptedChannel<'a> {
    pub fn new(clock: &'a ManualClock) -> Self {
        Self {
            clock,
            lines: VecDeque::new(),
            sent: Vec::new(),
            failing_reads: 0,
        }
    }

    /// Queue `line` to arrive at `at`. Lines must be pushed in arrival order.
    pub fn push(&mut self, at: Duration, line: &str) {
        self.lines.push_back((at, format!("{line}\r\n")));
    }

    /// Make the next `count` reads fail.
    pub fn fail_reads(&mut self, count: u32) {
        self.failing_reads = count;
    }

    pub fn sent(&self) -> &[String] {
        &self.sent
    }
}

impl CommandChannel for ScriptedChannel<'_> {
    fn try_read_line(&mut self) -> Result<Option<String>, LinkError> {
        if self.failing_reads > 0 {
            self.failing_reads -= 1;
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "scripted failure").into());
        }

        let due = self
            .lines
            .front()
            .is_some_and(|(at, _)| *at <= self.clock.now());
        if !due {
            return Ok(None);
        }
        Ok(self.lines.pop_front().map(|(_, line)| line))
    }

    fn send(&mut self, text: &str) -> Result<(), LinkError> {
        self.sent.push(text.to_owned());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Photo(Device),
    Video(Device, Duration),
}

/// Backend that records every call and succeeds unless told otherwise.
pub struct RecordingBackend<'a> {
    clock: &'a ManualClock,
    calls: Vec<Call>,
    fail_videos: bool,
    blocking: HashMap<Device, Duration>,
}

impl<'a> RecordingBackend<'a> {
    pub fn new(clock: &'a ManualClock) -> Self {
        Self {
            clock,
            calls: Vec::new(),
            fail_videos: false,
            blocking: HashMap::new(),
        }
    }

    /// Report every video start as failed.
    pub fn fail_videos(&mut self) {
        self.fail_videos = true;
    }

    /// Photos on `device` take `duration` of clock time.
    pub fn block_on(&mut self, device: Device, duration: Duration) {
        self.blocking.insert(device, duration);
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }
}

impl CaptureBackend for RecordingBackend<'_> {
    fn take_photo(&mut self, device: Device) -> CaptureOutcome {
        self.calls.push(Call::Photo(device));
        if let Some(duration) = self.blocking.get(&device) {
            self.clock.advance(*duration);
        }
        CaptureOutcome::ok(format!("{device} photo"))
    }

    fn start_video(&mut self, device: Device, duration: Duration) -> CaptureOutcome {
        self.calls.push(Call::Video(device, duration));
        if self.fail_videos {
            CaptureOutcome::failed(format!("{device} recorder unavailable"))
        } else {
            CaptureOutcome::ok(format!("{device} recording"))
        }
    }
}
