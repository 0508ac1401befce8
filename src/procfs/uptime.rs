//! Time elapsed since boot, from `/proc/uptime`

use std::time::Duration;

use crate::procfs::parsers::{decode_u64, TokenParser};
use crate::procfs::reader::{PseudoFileReader, ReadPseudoFile, LINE_BUFFER_SIZE};
use crate::procfs::ProcfsError;

const UPTIME_PATH: &str = "/proc/uptime";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Uptime {
    pub uptime: Duration,
    /// Sum of the idle time of every CPU, which may exceed `uptime` on multi-core machines
    pub idle: Duration,
}

pub struct UptimeReader {
    source: Box<dyn ReadPseudoFile + Send>,
}

impl UptimeReader {
    pub fn new() -> Self {
        Self::from_source(Box::new(PseudoFileReader::new(UPTIME_PATH, LINE_BUFFER_SIZE)))
    }

    pub fn from_source(source: Box<dyn ReadPseudoFile + Send>) -> Self {
        UptimeReader { source }
    }

    pub fn read(&mut self, uptime: &mut Uptime) -> Result<(), ProcfsError> {
        let content = self.source.read()?;
        let mut tokens = TokenParser::new(content);

        *uptime = Uptime {
            uptime: decode_duration(tokens.next_token()?)?,
            idle: decode_duration(tokens.next_token()?)?,
        };

        Ok(())
    }
}

impl Default for UptimeReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Decodes a duration formatted as `<seconds>.<centiseconds>`
fn decode_duration(field: &[u8]) -> Result<Duration, ProcfsError> {
    let dot = field.iter().position(|&b| b == b'.').ok_or_else(|| {
        let err_msg = format!("Expected a fractional amount of seconds, got '{}'", String::from_utf8_lossy(field));
        ProcfsError::InvalidFileFormat(err_msg)
    })?;

    let secs = decode_u64(&field[..dot])?;
    let centis = decode_u64(&field[dot + 1..])?;

    Ok(Duration::from_secs(secs) + Duration::from_millis(centis * 10))
}
