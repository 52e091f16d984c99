//! Mode-driven camera scheduler for a high-altitude-balloon payload.
//!
//! Mode commands arrive over a serial link from the flight computer. Each
//! tick the scheduler drains that link, decides which cameras may start a
//! photo or a timed recording, and hands the work to a capture backend.

pub mod capture;
pub mod clock;
pub mod command;
pub mod link;
pub mod scheduler;
pub mod state;

#[cfg(test)]
pub mod mock;

pub use capture::{CameraRig, CaptureBackend, CaptureOutcome, RigConfig};
pub use clock::{Clock, SystemClock};
pub use command::{CommandError, RawLine};
pub use link::{CommandChannel, LinkError, SerialLink};
pub use scheduler::{
    ActionKind, FailurePolicy, IssuedAction, Scheduler, SchedulerConfig, SchedulerStats,
    TickReport,
};
pub use state::{CaptureState, Device, Mode, ModeState};
