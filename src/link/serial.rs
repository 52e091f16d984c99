use super::{CommandChannel, LinkError};
use serialport::SerialPort;
use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

const READ_CHUNK: usize = 256;
/// Longest partial line kept while waiting for its `\n`
const MAX_LINE: usize = 1024;

pub struct SerialLink {
    port: Box<dyn SerialPort>,
    pending: Vec<u8>,
}

impl SerialLink {
    pub fn open(path: &str, baud: u32, timeout: Duration) -> Result<Self, LinkError> {
        tracing::info!("Opening command link at {} ({} baud)", path, baud);

        let port = serialport::new(path, baud)
            .timeout(timeout)
            .open()
            .map_err(|source| LinkError::Open {
                path: path.to_owned(),
                source,
            })?;

        tracing::info!("Command link opened successfully");

        Ok(Self {
            port,
            pending: Vec::new(),
        })
    }

    fn fill(&mut self) -> Result<(), LinkError> {
        let waiting = self.port.bytes_to_read()? as usize;
        if waiting == 0 {
            return Ok(());
        }

        let mut chunk = [0u8; READ_CHUNK];
        let want = waiting.min(READ_CHUNK);
        match self.port.read(&mut chunk[..want]) {
            Ok(n) => {
                buffer_chunk(&mut self.pending, &chunk[..n]);
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::TimedOut => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

impl CommandChannel for SerialLink {
    fn try_read_line(&mut self) -> Result<Option<String>, LinkError> {
        if let Some(line) = take_line(&mut self.pending) {
            return Ok(Some(line));
        }
        self.fill()?;
        Ok(take_line(&mut self.pending))
    }

    fn send(&mut self, text: &str) -> Result<(), LinkError> {
        self.port.write_all(text.as_bytes())?;
        self.port.flush()?;
        Ok(())
    }
}

/// Append freshly read bytes, dropping a partial line that outgrows `MAX_LINE`.
fn buffer_chunk(pending: &mut Vec<u8>, chunk: &[u8]) {
    pending.extend_from_slice(chunk);

    let tail_start = pending
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |pos| pos + 1);
    let tail = pending.len() - tail_start;
    if tail > MAX_LINE {
        tracing::warn!("Dropping {} bytes of unterminated input on command link", tail);
        pending.truncate(tail_start);
    }
}

/// Split one `\n`-terminated line off the front of `pending`
fn take_line(pending: &mut Vec<u8>) -> Option<String> {
    let end = pending.iter().position(|&b| b == b'\n')?;
    let line: Vec<u8> = pending.drain(..=end).collect();
    Some(String::from_utf8_lossy(&line).into_owned())
}
