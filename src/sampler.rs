//! Periodic sampling of every system statistic
//!
//! The [`Sampler`] owns one reader per category, and reads all of them each time it receives an
//! impulse trigger.

use std::path::PathBuf;
use std::sync::mpsc::{Receiver, RecvError};

use log::info;
use thiserror::Error;

use crate::procfs::cpu::{CpuStat, CpuStatReader};
use crate::procfs::disk::{DiskStat, DiskStatReader};
use crate::procfs::filesystem::{FileSystemStat, FileSystemStatReader};
use crate::procfs::loadavg::{LoadAvg, LoadAvgReader};
use crate::procfs::meminfo::{MemoryStat, MemoryStatReader};
use crate::procfs::network::{NetworkStat, NetworkStatReader};
use crate::procfs::uptime::{Uptime, UptimeReader};
use crate::procfs::ProcfsError;
use crate::triggers::Trigger;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Error reading {0} statistics")]
    ReaderError(&'static str, #[source] ProcfsError),
    #[error("Trigger channel was closed")]
    ChannelError(#[from] RecvError),
}

/// Entities to sample, on top of machine-wide statistics
#[derive(Debug, Default, Clone)]
pub struct SamplerConfig {
    pub dev_names: Vec<String>,
    pub iface_names: Vec<String>,
    pub fs_paths: Vec<PathBuf>,
}

/// The values of the last sample
#[derive(Debug, Default, Clone)]
pub struct Sample {
    pub cpu: CpuStat,
    pub disks: Vec<DiskStat>,
    pub interfaces: Vec<NetworkStat>,
    pub memory: MemoryStat,
    pub load: LoadAvg,
    pub uptime: Uptime,
    /// Capacity of each filesystem, in the order of [`SamplerConfig::fs_paths`]
    pub filesystems: Vec<FileSystemStat>,
}

pub struct Sampler {
    cpu_reader: CpuStatReader,
    disk_reader: DiskStatReader,
    net_reader: NetworkStatReader,
    mem_reader: MemoryStatReader,
    load_reader: LoadAvgReader,
    uptime_reader: UptimeReader,
    fs_readers: Vec<FileSystemStatReader>,
    sample: Sample,
}

impl Sampler {
    /// Creates the readers of every statistic
    ///
    /// Rates of the first sample are computed against the values read here.
    pub fn new(config: &SamplerConfig) -> Result<Self, Error> {
        let dev_names: Vec<&str> = config.dev_names.iter().map(String::as_str).collect();
        let iface_names: Vec<&str> = config.iface_names.iter().map(String::as_str).collect();

        let sample = Sample {
            disks: dev_names.iter().map(|name| DiskStat::new(name)).collect(),
            interfaces: iface_names.iter().map(|name| NetworkStat::new(name)).collect(),
            filesystems: vec![FileSystemStat::default(); config.fs_paths.len()],
            ..Default::default()
        };

        Ok(Sampler {
            cpu_reader: CpuStatReader::new().map_err(|e| Error::ReaderError("CPU", e))?,
            disk_reader: DiskStatReader::new(&dev_names).map_err(|e| Error::ReaderError("disk", e))?,
            net_reader: NetworkStatReader::new(&iface_names).map_err(|e| Error::ReaderError("network", e))?,
            mem_reader: MemoryStatReader::new(),
            load_reader: LoadAvgReader::new(),
            uptime_reader: UptimeReader::new(),
            fs_readers: config.fs_paths.iter().map(FileSystemStatReader::new).collect(),
            sample,
        })
    }

    /// Takes samples on each impulse, until an exit trigger is received
    pub fn run(mut self, receiver: Receiver<Trigger>) -> Result<(), Error> {
        loop {
            match receiver.recv()? {
                Trigger::Exit => break,
                Trigger::Impulse => {
                    self.sample()?;
                    self.log_sample();
                }
            }
        }

        Ok(())
    }

    /// Reads every statistic
    pub fn sample(&mut self) -> Result<&Sample, Error> {
        let sample = &mut self.sample;

        self.cpu_reader
            .read(&mut sample.cpu)
            .map_err(|e| Error::ReaderError("CPU", e))?;
        self.disk_reader
            .read(&mut sample.disks)
            .map_err(|e| Error::ReaderError("disk", e))?;
        self.net_reader
            .read(&mut sample.interfaces)
            .map_err(|e| Error::ReaderError("network", e))?;
        self.mem_reader
            .read(&mut sample.memory)
            .map_err(|e| Error::ReaderError("memory", e))?;
        self.load_reader
            .read(&mut sample.load)
            .map_err(|e| Error::ReaderError("load average", e))?;
        self.uptime_reader
            .read(&mut sample.uptime)
            .map_err(|e| Error::ReaderError("uptime", e))?;

        for (reader, stat) in self.fs_readers.iter_mut().zip(sample.filesystems.iter_mut()) {
            reader.read(stat).map_err(|e| Error::ReaderError("filesystem", e))?;
        }

        Ok(&self.sample)
    }

    fn log_sample(&self) {
        let sample = &self.sample;
        let cpu = &sample.cpu;

        info!(
            "cpu: user {:.1}% nice {:.1}% sys {:.1}% iowait {:.1}% irq {:.1}% softirq {:.1}% steal {:.1}% idle {:.1}%",
            cpu.user_percent,
            cpu.nice_percent,
            cpu.sys_percent,
            cpu.iowait_percent,
            cpu.irq_percent,
            cpu.softirq_percent,
            cpu.steal_percent,
            cpu.idle_percent
        );

        for disk in &sample.disks {
            info!(
                "disk {}: read {:.1}/s ({:.1}/s merged, {:.0} B/s) written {:.1}/s ({:.1}/s merged, {:.0} B/s)",
                disk.dev_name,
                disk.read_count_per_sec,
                disk.read_merged_per_sec,
                disk.read_bytes_per_sec,
                disk.written_count_per_sec,
                disk.written_merged_per_sec,
                disk.written_bytes_per_sec
            );
        }

        for iface in &sample.interfaces {
            info!(
                "net {}: recv {:.0} B/s {:.1} pkt/s {:.1} errs/s {:.1} drops/s, trans {:.0} B/s {:.1} pkt/s {:.1} errs/s {:.1} drops/s {:.1} colls/s",
                iface.dev_name,
                iface.recv_bytes_per_sec,
                iface.recv_packets_per_sec,
                iface.recv_errs_per_sec,
                iface.recv_drops_per_sec,
                iface.trans_bytes_per_sec,
                iface.trans_packets_per_sec,
                iface.trans_errs_per_sec,
                iface.trans_drops_per_sec,
                iface.trans_colls_per_sec
            );
        }

        let mem = &sample.memory;
        info!(
            "memory: total {} B free {} B available {} B buffers {} B cached {} B, swap: total {} B free {} B cached {} B",
            mem.mem_total,
            mem.mem_free,
            mem.mem_available,
            mem.buffers,
            mem.cached,
            mem.swap_total,
            mem.swap_free,
            mem.swap_cached
        );

        let load = &sample.load;
        info!(
            "load: {:.2} {:.2} {:.2} ({}/{} running), up {}s",
            load.load1,
            load.load5,
            load.load15,
            load.running,
            load.total,
            sample.uptime.uptime.as_secs()
        );

        for (reader, fs) in self.fs_readers.iter().zip(sample.filesystems.iter()) {
            info!(
                "fs {}: {} B available, {} B free of {} B, {}/{} inodes free",
                reader.path().display(),
                fs.available_bytes(),
                fs.free_bytes(),
                fs.total_bytes(),
                fs.free_inodes,
                fs.total_inodes
            );
        }
    }
}
