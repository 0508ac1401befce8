//! Load average, from `/proc/loadavg`

use crate::procfs::parsers::{decode_u64, TokenParser};
use crate::procfs::reader::{PseudoFileReader, ReadPseudoFile, LINE_BUFFER_SIZE};
use crate::procfs::ProcfsError;

const LOADAVG_PATH: &str = "/proc/loadavg";

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct LoadAvg {
    pub load1: f64,
    pub load5: f64,
    pub load15: f64,
    /// Amount of currently runnable scheduling entities (processes and threads)
    pub running: u64,
    /// Amount of scheduling entities which currently exist on the system
    pub total: u64,
}

pub struct LoadAvgReader {
    source: Box<dyn ReadPseudoFile + Send>,
}

impl LoadAvgReader {
    pub fn new() -> Self {
        Self::from_source(Box::new(PseudoFileReader::new(LOADAVG_PATH, LINE_BUFFER_SIZE)))
    }

    pub fn from_source(source: Box<dyn ReadPseudoFile + Send>) -> Self {
        LoadAvgReader { source }
    }

    pub fn read(&mut self, load: &mut LoadAvg) -> Result<(), ProcfsError> {
        let content = self.source.read()?;
        *load = parse_loadavg(content)?;
        Ok(())
    }
}

impl Default for LoadAvgReader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_loadavg(content: &[u8]) -> Result<LoadAvg, ProcfsError> {
    let mut tokens = TokenParser::new(content);

    let load1 = tokens.next_f64()?;
    let load5 = tokens.next_f64()?;
    let load15 = tokens.next_f64()?;

    let entities = tokens.next_token()?;
    let slash = entities.iter().position(|&b| b == b'/').ok_or_else(|| {
        let err_msg = format!("Expected 'running/total', got '{}'", String::from_utf8_lossy(entities));
        ProcfsError::InvalidFileFormat(err_msg)
    })?;

    Ok(LoadAvg {
        load1,
        load5,
        load15,
        running: decode_u64(&entities[..slash])?,
        total: decode_u64(&entities[slash + 1..])?,
    })
}
