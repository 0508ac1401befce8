//! Memory usage, from `/proc/meminfo`

use crate::procfs::parsers::{decode_u64, find_line_by_prefix, nth_field};
use crate::procfs::reader::{PseudoFileReader, ReadPseudoFile, MEMINFO_BUFFER_SIZE};
use crate::procfs::ProcfsError;

const MEMINFO_PATH: &str = "/proc/meminfo";

/// Memory usage of the machine, in bytes
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MemoryStat {
    pub mem_total: u64,
    pub mem_free: u64,
    /// Estimation of the memory available for starting new applications without swapping
    pub mem_available: u64,
    pub buffers: u64,
    pub cached: u64,
    pub swap_cached: u64,
    pub swap_total: u64,
    pub swap_free: u64,
}

/// Reads the memory usage of the machine
pub struct MemoryStatReader {
    source: Box<dyn ReadPseudoFile + Send>,
}

impl MemoryStatReader {
    pub fn new() -> Self {
        Self::from_source(Box::new(PseudoFileReader::new(MEMINFO_PATH, MEMINFO_BUFFER_SIZE)))
    }

    pub fn from_source(source: Box<dyn ReadPseudoFile + Send>) -> Self {
        MemoryStatReader { source }
    }

    pub fn read(&mut self, stat: &mut MemoryStat) -> Result<(), ProcfsError> {
        let content = self.source.read()?;
        *stat = parse_meminfo(content)?;
        Ok(())
    }
}

impl Default for MemoryStatReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Keys are looked up in the order in which the kernel lists them
fn parse_meminfo(content: &[u8]) -> Result<MemoryStat, ProcfsError> {
    let mut values = KeyedValues { remaining: content };

    Ok(MemoryStat {
        mem_total: values.next_kb(b"MemTotal:")?,
        mem_free: values.next_kb(b"MemFree:")?,
        mem_available: values.next_kb(b"MemAvailable:")?,
        buffers: values.next_kb(b"Buffers:")?,
        cached: values.next_kb(b"Cached:")?,
        swap_cached: values.next_kb(b"SwapCached:")?,
        swap_total: values.next_kb(b"SwapTotal:")?,
        swap_free: values.next_kb(b"SwapFree:")?,
    })
}

struct KeyedValues<'a> {
    remaining: &'a [u8],
}

impl<'a> KeyedValues<'a> {
    /// Finds the next line starting with `key`, and returns its value converted from kB to bytes
    fn next_kb(&mut self, key: &[u8]) -> Result<u64, ProcfsError> {
        let (line, rest) = find_line_by_prefix(self.remaining, key).ok_or_else(|| {
            let err_msg = format!("Missing key '{}'", String::from_utf8_lossy(key));
            ProcfsError::InvalidFileFormat(err_msg)
        })?;

        let (start, end) = nth_field(line, 1)?;
        let kb = decode_u64(&line[start..end])?;
        self.remaining = rest;

        Ok(kb * 1024)
    }
}
