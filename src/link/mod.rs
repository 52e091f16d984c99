mod serial;

pub use serial::SerialLink;

use thiserror::Error;

/// Failures on the command link. None of these stop the scheduler.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: serialport::Error,
    },
    #[error("serial port error: {0}")]
    Port(#[from] serialport::Error),
    #[error("I/O error on command link: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for the line-oriented link to the flight computer
pub trait CommandChannel {
    /// Return the next complete line if one is buffered. Never blocks for long.
    fn try_read_line(&mut self) -> Result<Option<String>, LinkError>;

    /// Write `text` to the link verbatim
    fn send(&mut self, text: &str) -> Result<(), LinkError>;
}
