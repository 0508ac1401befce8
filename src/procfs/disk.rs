//! Block devices I/O, from `/proc/diskstats`

use crate::procfs::counters::{CounterLayout, CounterReader, RateRecord};
use crate::procfs::parsers::{next_field, nth_field, TokenParser};
use crate::procfs::rates::per_sec;
use crate::procfs::reader::{PseudoFileReader, ReadPseudoFile, COUNTERS_BUFFER_SIZE};
use crate::procfs::ProcfsError;

const DISKSTATS_PATH: &str = "/proc/diskstats";
/// Position of the device name in a line, after the major and minor numbers
const DEV_NAME_FIELD: usize = 2;
/// Size of the sectors counted in `/proc/diskstats`, whatever the actual device sector size
pub const SECTOR_SIZE: u64 = 512;

/// I/O rates of a block device
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DiskStat {
    pub dev_name: String,
    pub read_count_per_sec: f64,
    pub read_merged_per_sec: f64,
    pub read_bytes_per_sec: f64,
    pub written_count_per_sec: f64,
    pub written_merged_per_sec: f64,
    pub written_bytes_per_sec: f64,
}

impl DiskStat {
    /// Creates a record to be filled with the rates of the given device
    pub fn new(dev_name: &str) -> Self {
        DiskStat {
            dev_name: dev_name.to_string(),
            ..Default::default()
        }
    }
}

/// I/O counters of a block device
///
/// See `Documentation/admin-guide/iostats.rst` in the kernel sources.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RawDiskStat {
    /// Reads completed successfully
    pub rd_ios: u64,
    /// Reads merged with adjacent ones
    pub rd_merges: u64,
    pub rd_sectors: u64,
    /// Time spent reading, in milliseconds
    pub rd_ticks: u64,
    pub wr_ios: u64,
    pub wr_merges: u64,
    pub wr_sectors: u64,
    pub wr_ticks: u64,
}

pub struct DiskLayout;

impl CounterLayout for DiskLayout {
    type Raw = RawDiskStat;

    fn split_key(line: &[u8]) -> Result<Option<(&[u8], &[u8])>, ProcfsError> {
        if next_field(line).is_none() {
            return Ok(None);
        }

        let (start, end) = nth_field(line, DEV_NAME_FIELD)?;
        Ok(Some((&line[start..end], &line[end..])))
    }

    fn decode(tokens: &mut TokenParser) -> Result<Self::Raw, ProcfsError> {
        Ok(RawDiskStat {
            rd_ios: tokens.next_u64()?,
            rd_merges: tokens.next_u64()?,
            rd_sectors: tokens.next_u64()?,
            rd_ticks: tokens.next_u64()?,
            wr_ios: tokens.next_u64()?,
            wr_merges: tokens.next_u64()?,
            wr_sectors: tokens.next_u64()?,
            wr_ticks: tokens.next_u64()?,
        })
    }
}

impl RateRecord for DiskStat {
    type Raw = RawDiskStat;

    fn entity(&self) -> &str {
        &self.dev_name
    }

    fn fill(&mut self, curr: &RawDiskStat, prev: &RawDiskStat, interval_secs: f64) {
        let sector_size = SECTOR_SIZE as f64;

        self.read_count_per_sec = per_sec(prev.rd_ios, curr.rd_ios, interval_secs);
        self.read_merged_per_sec = per_sec(prev.rd_merges, curr.rd_merges, interval_secs);
        self.read_bytes_per_sec = per_sec(prev.rd_sectors, curr.rd_sectors, interval_secs) * sector_size;
        self.written_count_per_sec = per_sec(prev.wr_ios, curr.wr_ios, interval_secs);
        self.written_merged_per_sec = per_sec(prev.wr_merges, curr.wr_merges, interval_secs);
        self.written_bytes_per_sec = per_sec(prev.wr_sectors, curr.wr_sectors, interval_secs) * sector_size;
    }
}

/// Reads the I/O rates of a set of block devices
///
/// Devices are never discovered: only the devices given at construction are tracked. Note that
/// partitions (e.g. `sda1`) are reported separately from their disk (e.g. `sda`).
pub struct DiskStatReader {
    counters: CounterReader<DiskLayout>,
}

impl DiskStatReader {
    /// Creates a reader of `/proc/diskstats` tracking the given devices, and performs an initial read
    pub fn new(dev_names: &[&str]) -> Result<Self, ProcfsError> {
        let source = PseudoFileReader::new(DISKSTATS_PATH, COUNTERS_BUFFER_SIZE);
        Self::from_source(Box::new(source), dev_names)
    }

    pub fn from_source(source: Box<dyn ReadPseudoFile + Send>, dev_names: &[&str]) -> Result<Self, ProcfsError> {
        Ok(DiskStatReader {
            counters: CounterReader::new(source, dev_names)?,
        })
    }

    /// Returns the names of the tracked devices
    pub fn dev_names(&self) -> impl Iterator<Item = &str> {
        self.counters.entities()
    }

    /// Fills each record with the rates of the device it names, since the previous read
    pub fn read(&mut self, stats: &mut [DiskStat]) -> Result<(), ProcfsError> {
        self.counters.read_records(stats)
    }
}
