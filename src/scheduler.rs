use crate::capture::{CaptureBackend, CaptureOutcome};
use crate::clock::Clock;
use crate::command::RawLine;
use crate::link::CommandChannel;
use crate::state::{Device, Mode, ModeState};
use std::time::Duration;

pub const TAKEOFF_VIDEO: Duration = Duration::from_secs(120);
pub const PEAK_VIDEO: Duration = Duration::from_secs(120);
pub const LANDING_UP_VIDEO: Duration = Duration::from_secs(10);
pub const LANDING_DOWN_VIDEO: Duration = Duration::from_secs(120);

const ACK: &str = "$0";

/// What to do with a device's state when a video start reports failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Mark the device recording even when the start reported failure
    #[default]
    Optimistic,
    /// Only mark a device recording when the backend reports success
    ConfirmedOnly,
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Length of the command drain at the start of every tick
    pub poll_window: Duration,
    /// Pause after every issued capture
    pub settle: Duration,
    /// Wait between channel polls when nothing is buffered
    pub poll_interval: Duration,
    pub failure_policy: FailurePolicy,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_window: Duration::from_secs(30),
            settle: Duration::from_secs(1),
            poll_interval: Duration::from_millis(50),
            failure_policy: FailurePolicy::Optimistic,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Photo,
    Video(Duration),
}

/// A backend call made during a decision phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedAction {
    pub device: Device,
    pub kind: ActionKind,
    pub outcome: CaptureOutcome,
}

/// Everything one tick decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// Mode the decision phase ran under
    pub mode: Mode,
    /// Devices whose recording was considered finished this tick
    pub expired: Vec<Device>,
    pub actions: Vec<IssuedAction>,
}

impl TickReport {
    fn new(mode: Mode) -> Self {
        Self {
            mode,
            expired: Vec::new(),
            actions: Vec::new(),
        }
    }

    pub fn photos(&self, device: Device) -> usize {
        self.actions
            .iter()
            .filter(|a| a.device == device && a.kind == ActionKind::Photo)
            .count()
    }

    pub fn videos(&self, device: Device) -> Vec<Duration> {
        self.actions
            .iter()
            .filter(|a| a.device == device)
            .filter_map(|a| match a.kind {
                ActionKind::Video(duration) => Some(duration),
                ActionKind::Photo => None,
            })
            .collect()
    }
}

/// Running counters, logged at debug level after every tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub ticks: u64,
    pub commands: u64,
    pub invalid_commands: u64,
    pub log_lines: u64,
    pub read_errors: u64,
    pub failed_captures: u64,
}

/// Mode-driven capture loop.
///
/// Single threaded: every backend call blocks the loop, and commands that
/// arrive meanwhile are only seen in the next drain phase.
pub struct Scheduler<L, B, K> {
    link: L,
    backend: B,
    clock: K,
    config: SchedulerConfig,
    state: ModeState,
    stats: SchedulerStats,
}

impl<L, B, K> Scheduler<L, B, K>
where
    L: CommandChannel,
    B: CaptureBackend,
    K: Clock,
{
    pub fn new(link: L, backend: B, clock: K, config: SchedulerConfig) -> Self {
        Self {
            link,
            backend,
            clock,
            config,
            state: ModeState::new(),
            stats: SchedulerStats::default(),
        }
    }

    pub fn state(&self) -> &ModeState {
        &self.state
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Handshake once, then tick until the process is killed.
    pub fn run(&mut self) -> ! {
        self.handshake();

        tracing::info!("Entering capture loop in {} mode", self.state.mode);
        loop {
            self.tick();
        }
    }

    /// Discard stale chatter, then wait for `$0` and acknowledge it.
    pub fn handshake(&mut self) {
        let mut discarded = 0usize;
        while self.poll_line().is_some() {
            discarded += 1;
        }
        if discarded > 0 {
            tracing::debug!("Discarded {} buffered lines before start", discarded);
        }

        tracing::info!("Waiting for start command");
        loop {
            let Some(line) = self.poll_line() else {
                self.clock.sleep(self.config.poll_interval);
                continue;
            };

            match RawLine::parse(&line) {
                Some(RawLine::Command(Mode::Regular)) => {
                    tracing::info!("Command received (start): {}", line.trim_end());
                    if let Err(err) = self.link.send(ACK) {
                        tracing::error!("Failed to acknowledge start command: {}", err);
                    }
                    return;
                }
                Some(RawLine::Command(_)) => {
                    self.stats.invalid_commands += 1;
                    tracing::warn!("Invalid command before start: {}", line.trim_end());
                }
                Some(RawLine::Invalid { line, reason }) => {
                    self.stats.invalid_commands += 1;
                    tracing::warn!("Invalid command before start: {} ({})", line, reason);
                }
                Some(RawLine::Log(text)) => {
                    self.stats.log_lines += 1;
                    tracing::info!("{}", text);
                }
                None => {}
            }
        }
    }

    /// One full cycle: drain, expire, decide, board photo.
    pub fn tick(&mut self) -> TickReport {
        let _span = tracing::debug_span!("tick", n = self.stats.ticks).entered();

        self.drain();

        let mut report = TickReport::new(self.state.mode);
        self.expire(&mut report);

        match self.state.mode {
            Mode::Regular => self.regular(&mut report),
            Mode::Takeoff => self.takeoff(&mut report),
            Mode::Peak => self.peak(&mut report),
            Mode::Landing => self.landing(&mut report),
        }

        self.photo(Device::Board, &mut report);

        self.stats.ticks += 1;
        tracing::debug!("Tick finished: {:?}", self.stats);

        report
    }

    /// Read commands for one poll window. Never touches the backend.
    fn drain(&mut self) {
        let start = self.clock.now();
        while self.clock.now().saturating_sub(start) < self.config.poll_window {
            match self.poll_line() {
                Some(line) => self.ingest(&line),
                None => self.clock.sleep(self.config.poll_interval),
            }
        }
    }

    fn poll_line(&mut self) -> Option<String> {
        match self.link.try_read_line() {
            Ok(line) => line,
            Err(err) => {
                self.stats.read_errors += 1;
                tracing::debug!("Command link read failed: {}", err);
                None
            }
        }
    }

    fn ingest(&mut self, line: &str) {
        match RawLine::parse(line) {
            Some(RawLine::Command(mode)) => {
                self.stats.commands += 1;
                tracing::info!("Command received: {}", line.trim_end());
                if self.state.mode != mode {
                    tracing::info!("Mode {} -> {}", self.state.mode, mode);
                }
                self.state.mode = mode;
            }
            Some(RawLine::Invalid { line, reason }) => {
                self.stats.invalid_commands += 1;
                tracing::warn!("Invalid command received: {} ({})", line, reason);
            }
            Some(RawLine::Log(text)) => {
                self.stats.log_lines += 1;
                tracing::info!("{}", text);
            }
            None => {}
        }
    }

    // Landing clears its own recordings through the force-expire branches.
    fn expire(&mut self, report: &mut TickReport) {
        if self.state.mode == Mode::Landing {
            return;
        }

        let now = self.clock.now();
        for device in [Device::Down, Device::Up] {
            let Some(capture) = self.state.capture_mut(device) else {
                continue;
            };
            if capture.active && capture.exceeded(now, capture.declared) {
                capture.active = false;
                report.expired.push(device);
                tracing::debug!("{} recording presumed finished", device);
            }
        }
    }

    fn regular(&mut self, report: &mut TickReport) {
        if !self.state.down.active {
            self.photo(Device::Down, report);
        }
        if !self.state.up.active {
            self.photo(Device::Up, report);
        }
    }

    fn takeoff(&mut self, report: &mut TickReport) {
        if self.state.both_idle() {
            self.video(Device::Down, TAKEOFF_VIDEO, report);
        }
        if !self.state.up.active {
            self.photo(Device::Up, report);
        }
    }

    fn peak(&mut self, report: &mut TickReport) {
        if self.state.both_idle() {
            self.video(Device::Up, PEAK_VIDEO, report);
        }
        if !self.state.down.active {
            self.photo(Device::Down, report);
        }
    }

    fn landing(&mut self, report: &mut TickReport) {
        if self.state.up.exceeded(self.clock.now(), LANDING_UP_VIDEO) {
            if self.state.both_idle() {
                self.video(Device::Up, LANDING_UP_VIDEO, report);
            } else if self.state.up.active {
                self.force_expire(Device::Up, report);
            }
        }

        if self.state.down.exceeded(self.clock.now(), LANDING_DOWN_VIDEO) {
            if self.state.both_idle() {
                self.video(Device::Down, LANDING_DOWN_VIDEO, report);
            } else if self.state.down.active {
                self.force_expire(Device::Down, report);
            }
        }

        if !self.state.down.active {
            self.photo(Device::Down, report);
        } else if !self.state.up.active {
            self.photo(Device::Up, report);
        }
    }

    fn force_expire(&mut self, device: Device, report: &mut TickReport) {
        if let Some(capture) = self.state.capture_mut(device) {
            capture.active = false;
            report.expired.push(device);
            tracing::debug!("{} recording force-expired", device);
        }
    }

    fn photo(&mut self, device: Device, report: &mut TickReport) {
        let outcome = self.backend.take_photo(device);
        self.check(device, &outcome);

        report.actions.push(IssuedAction {
            device,
            kind: ActionKind::Photo,
            outcome,
        });
        self.clock.sleep(self.config.settle);
    }

    fn video(&mut self, device: Device, duration: Duration, report: &mut TickReport) {
        let outcome = self.backend.start_video(device, duration);
        self.check(device, &outcome);

        let advance = outcome.success || self.config.failure_policy == FailurePolicy::Optimistic;
        if advance {
            let now = self.clock.now();
            if let Some(capture) = self.state.capture_mut(device) {
                capture.mark_started(now, duration);
            }
        }

        report.actions.push(IssuedAction {
            device,
            kind: ActionKind::Video(duration),
            outcome,
        });
        self.clock.sleep(self.config.settle);
    }

    fn check(&mut self, device: Device, outcome: &CaptureOutcome) {
        if outcome.success {
            tracing::debug!("{} capture: {}", device, outcome.message);
        } else {
            self.stats.failed_captures += 1;
            tracing::warn!("{} capture failed: {}", device, outcome.message);
        }
    }
}
