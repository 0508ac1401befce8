//! CPU usage, from `/proc/stat`

use crate::procfs::counters::{CounterLayout, CounterReader};
use crate::procfs::parsers::{next_field, TokenParser};
use crate::procfs::rates::per_sec;
use crate::procfs::reader::{PseudoFileReader, ReadPseudoFile, COUNTERS_BUFFER_SIZE};
use crate::procfs::{sysconf, ProcfsError};

const STAT_PATH: &str = "/proc/stat";
/// Key of the line aggregating the time of all CPUs
const CPU_KEY: &str = "cpu";

/// Usage of the CPU, in percent of one CPU
///
/// On a machine with 4 logical CPUs, a value of 100 means that the equivalent of one CPU was
/// fully spent in the given state.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct CpuStat {
    pub user_percent: f64,
    pub nice_percent: f64,
    pub sys_percent: f64,
    pub iowait_percent: f64,
    pub irq_percent: f64,
    pub softirq_percent: f64,
    pub steal_percent: f64,
    pub idle_percent: f64,
}

/// Time spent by all CPUs in each state, in clock ticks
///
/// See `Documentation/filesystems/proc.rst` in the kernel sources.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RawCpuStat {
    /// Time spent in user mode, guest time included
    pub user: u64,
    /// Time spent in user mode with low priority, guest_nice time included
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    /// Time spent waiting for I/O to complete
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    /// Time stolen by the hypervisor for other virtual machines
    pub steal: u64,
    /// Time spent running a virtual CPU for guest operating systems
    pub guest: u64,
    pub guest_nice: u64,
}

impl RawCpuStat {
    /// Time spent in user mode, excluding the time spent running guests
    fn user_only(&self) -> u64 {
        self.user.saturating_sub(self.guest)
    }

    fn nice_only(&self) -> u64 {
        self.nice.saturating_sub(self.guest_nice)
    }
}

pub struct CpuLayout;

impl CounterLayout for CpuLayout {
    type Raw = RawCpuStat;

    fn split_key(line: &[u8]) -> Result<Option<(&[u8], &[u8])>, ProcfsError> {
        Ok(next_field(line).map(|(start, end)| (&line[start..end], &line[end..])))
    }

    fn decode(tokens: &mut TokenParser) -> Result<Self::Raw, ProcfsError> {
        Ok(RawCpuStat {
            user: tokens.next_u64()?,
            nice: tokens.next_u64()?,
            system: tokens.next_u64()?,
            idle: tokens.next_u64()?,
            iowait: tokens.next_u64()?,
            irq: tokens.next_u64()?,
            softirq: tokens.next_u64()?,
            steal: tokens.next_u64()?,
            guest: tokens.next_u64()?,
            guest_nice: tokens.next_u64()?,
        })
    }
}

/// Reads the CPU usage of the whole machine
pub struct CpuStatReader {
    counters: CounterReader<CpuLayout>,
    cpu_count: usize,
}

impl CpuStatReader {
    /// Creates a reader of `/proc/stat`, and performs an initial read
    pub fn new() -> Result<Self, ProcfsError> {
        let source = PseudoFileReader::new(STAT_PATH, COUNTERS_BUFFER_SIZE);
        Self::from_source(Box::new(source), sysconf::cpu_count()?)
    }

    /// Creates a reader of CPU usage from any source formatted as `/proc/stat`
    ///
    /// # Arguments
    ///  * `source`: The source of `/proc/stat` content
    ///  * `cpu_count`: The amount of logical CPUs by which to divide the machine usage
    pub fn from_source(source: Box<dyn ReadPseudoFile + Send>, cpu_count: usize) -> Result<Self, ProcfsError> {
        Ok(CpuStatReader {
            counters: CounterReader::new(source, &[CPU_KEY])?,
            cpu_count: cpu_count.max(1),
        })
    }

    pub fn cpu_count(&self) -> usize {
        self.cpu_count
    }

    /// Reads the CPU usage since the previous read
    pub fn read(&mut self, stat: &mut CpuStat) -> Result<(), ProcfsError> {
        let cpu_count = self.cpu_count;

        self.counters.read_with(|snapshots| {
            let (curr, prev) = snapshots.get(CPU_KEY)?;
            stat.fill(curr, prev, snapshots.interval_secs(), cpu_count);
            Ok(())
        })
    }
}

impl CpuStat {
    fn fill(&mut self, curr: &RawCpuStat, prev: &RawCpuStat, interval_secs: f64, cpu_count: usize) {
        let percent = |prev: u64, curr: u64| per_sec(prev, curr, interval_secs) / cpu_count as f64;

        self.user_percent = percent(prev.user_only(), curr.user_only());
        self.nice_percent = percent(prev.nice_only(), curr.nice_only());
        self.sys_percent = percent(prev.system, curr.system);
        self.iowait_percent = percent(prev.iowait, curr.iowait);
        self.irq_percent = percent(prev.irq, curr.irq);
        self.softirq_percent = percent(prev.softirq, curr.softirq);
        self.steal_percent = percent(prev.steal, curr.steal);
        self.idle_percent = percent(prev.idle, curr.idle);
    }
}
