use crate::state::Mode;
use thiserror::Error;

/// Reasons a `$`-prefixed line is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("command has no mode digit")]
    MissingDigit,
    #[error("'{0}' is not a mode digit")]
    NotADigit(char),
    #[error("mode digit {0} is out of range")]
    UnknownMode(u32),
}

/// One line read off the command link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawLine {
    /// `$` followed by a valid mode digit
    Command(Mode),
    /// `$` followed by anything that isn't `0..=3`
    Invalid { line: String, reason: CommandError },
    /// Free text from the flight computer
    Log(String),
}

impl RawLine {
    /// Classify a line. Trailing CR/LF is stripped; blank lines yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            return None;
        }

        let Some(body) = line.strip_prefix('$') else {
            return Some(RawLine::Log(line.to_owned()));
        };

        Some(match parse_mode(body) {
            Ok(mode) => RawLine::Command(mode),
            Err(reason) => RawLine::Invalid {
                line: line.to_owned(),
                reason,
            },
        })
    }
}

// Only the first character after `$` matters, as on the flight computer side.
fn parse_mode(body: &str) -> Result<Mode, CommandError> {
    let ch = body.chars().next().ok_or(CommandError::MissingDigit)?;
    let digit = ch.to_digit(10).ok_or(CommandError::NotADigit(ch))?;
    Mode::from_digit(digit).ok_or(CommandError::UnknownMode(digit))
}
