use std::fs;
use std::thread::sleep;
use std::time::Duration;

use rstest::{fixture, rstest};

use sysstat::procfs::cpu::{CpuStat, CpuStatReader};
use sysstat::procfs::disk::{DiskStat, DiskStatReader};
use sysstat::procfs::filesystem::{FileSystemStat, FileSystemStatReader};
use sysstat::procfs::loadavg::{LoadAvg, LoadAvgReader};
use sysstat::procfs::meminfo::{MemoryStat, MemoryStatReader};
use sysstat::procfs::network::{NetworkStat, NetworkStatReader};
use sysstat::procfs::uptime::{Uptime, UptimeReader};

/// Names of the block devices currently listed in /proc/diskstats
#[fixture]
fn dev_names() -> Vec<String> {
    fs::read_to_string("/proc/diskstats")
        .expect("Could not read /proc/diskstats")
        .lines()
        .filter_map(|line| line.split_whitespace().nth(2).map(str::to_string))
        .take(16)
        .collect()
}

#[rstest]
fn test_cpu_percents_should_be_positive_and_bounded() {
    let mut reader = CpuStatReader::new().expect("Could not create CPU reader");
    let mut stat = CpuStat::default();

    sleep(Duration::from_millis(200));
    reader.read(&mut stat).expect("Could not read CPU usage");

    for percent in [
        stat.user_percent,
        stat.nice_percent,
        stat.sys_percent,
        stat.iowait_percent,
        stat.irq_percent,
        stat.softirq_percent,
        stat.steal_percent,
        stat.idle_percent,
    ] {
        assert!(percent.is_finite());
        assert!(percent >= 0.);
    }
}

#[rstest]
fn test_should_read_every_listed_device(dev_names: Vec<String>) {
    let names: Vec<&str> = dev_names.iter().map(String::as_str).collect();
    let mut reader = DiskStatReader::new(&names).expect("Could not create disk reader");
    let mut stats: Vec<DiskStat> = names.iter().map(|name| DiskStat::new(name)).collect();

    sleep(Duration::from_millis(100));
    reader.read(&mut stats).expect("Could not read disk stats");

    assert!(stats.iter().all(|stat| stat.read_bytes_per_sec >= 0. && stat.written_bytes_per_sec >= 0.));
}

#[rstest]
fn test_should_measure_loopback_traffic() {
    let mut reader = NetworkStatReader::new(&["lo"]).expect("Could not create network reader");
    let mut stats = vec![NetworkStat::new("lo")];

    sleep(Duration::from_millis(100));
    reader.read(&mut stats).expect("Could not read network stats");

    assert!(stats[0].recv_bytes_per_sec >= 0.);
    assert!(stats[0].trans_colls_per_sec >= 0.);
}

#[rstest]
fn test_whole_value_readers_should_read_consistent_values() {
    let mut memory = MemoryStat::default();
    let mut load = LoadAvg::default();
    let mut uptime = Uptime::default();
    let mut fs = FileSystemStat::default();

    MemoryStatReader::new().read(&mut memory).expect("Could not read memory stats");
    LoadAvgReader::new().read(&mut load).expect("Could not read load average");
    UptimeReader::new().read(&mut uptime).expect("Could not read uptime");
    FileSystemStatReader::new("/").read(&mut fs).expect("Could not read filesystem stats");

    assert!(memory.mem_free <= memory.mem_total);
    assert!(memory.swap_free <= memory.swap_total);
    assert!(load.running <= load.total);
    assert!(uptime.uptime > Duration::ZERO);
    assert!(fs.available_bytes() <= fs.total_bytes());
}

#[rstest]
fn test_should_not_leak_file_descriptors_over_many_reads(dev_names: Vec<String>) {
    let names: Vec<&str> = dev_names.iter().map(String::as_str).collect();
    let mut cpu_reader = CpuStatReader::new().expect("Could not create CPU reader");
    let mut disk_reader = DiskStatReader::new(&names).expect("Could not create disk reader");
    let mut net_reader = NetworkStatReader::new(&["lo"]).expect("Could not create network reader");
    let mut fs_reader = FileSystemStatReader::new("/");

    let mut cpu = CpuStat::default();
    let mut disks: Vec<DiskStat> = names.iter().map(|name| DiskStat::new(name)).collect();
    let mut ifaces = vec![NetworkStat::new("lo")];
    let mut fs = FileSystemStat::default();

    (0..5000).for_each(|_| {
        cpu_reader.read(&mut cpu).expect("Could not read CPU usage");
        disk_reader.read(&mut disks).expect("Could not read disk stats");
        net_reader.read(&mut ifaces).expect("Could not read network stats");
        fs_reader.read(&mut fs).expect("Could not read filesystem stats");
    });
}
