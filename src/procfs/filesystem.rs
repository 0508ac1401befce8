//! Capacity of mounted filesystems, from `fstatfs()`

use std::fs::File;
use std::io;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use libc::{fstatfs, statfs};

use crate::procfs::ProcfsError;

/// Capacity of a filesystem, in blocks and inodes
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FileSystemStat {
    pub block_size: u64,
    pub total_blocks: u64,
    pub free_blocks: u64,
    /// Free blocks available to unprivileged users
    pub available_blocks: u64,
    pub total_inodes: u64,
    pub free_inodes: u64,
}

impl FileSystemStat {
    pub fn total_bytes(&self) -> u64 {
        self.total_blocks.saturating_mul(self.block_size)
    }

    pub fn free_bytes(&self) -> u64 {
        self.free_blocks.saturating_mul(self.block_size)
    }

    pub fn available_bytes(&self) -> u64 {
        self.available_blocks.saturating_mul(self.block_size)
    }
}

/// Reads the capacity of the filesystem holding a given path
pub struct FileSystemStatReader {
    path: PathBuf,
}

impl FileSystemStatReader {
    /// # Arguments
    ///  * `path`: Any file or directory of the filesystem, usually its mount point
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        FileSystemStatReader { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    pub fn read(&mut self, stat: &mut FileSystemStat) -> Result<(), ProcfsError> {
        // The descriptor is closed when `file` is dropped, whether fstatfs() succeeds or not
        let file = File::open(&self.path)?;
        let raw = fstatfs_of(&file)?;

        *stat = FileSystemStat {
            block_size: raw.f_bsize as u64,
            total_blocks: raw.f_blocks as u64,
            free_blocks: raw.f_bfree as u64,
            available_blocks: raw.f_bavail as u64,
            total_inodes: raw.f_files as u64,
            free_inodes: raw.f_ffree as u64,
        };

        Ok(())
    }
}

fn fstatfs_of(file: &File) -> Result<statfs, ProcfsError> {
    let return_value;
    let mut buf: statfs = unsafe { std::mem::zeroed() };

    unsafe {
        return_value = fstatfs(file.as_raw_fd(), &mut buf);
    }

    match return_value {
        0 => Ok(buf),
        _ => Err(io::Error::last_os_error().into()),
    }
}

#[cfg(test)]
mod test_filesystem_stat_reader {
    use rstest::rstest;

    use crate::procfs::filesystem::{FileSystemStat, FileSystemStatReader};
    use crate::procfs::ProcfsError;

    #[test]
    fn test_should_read_capacity_of_temporary_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut reader = FileSystemStatReader::new(dir.path());
        let mut stat = FileSystemStat::default();

        reader.read(&mut stat).unwrap();

        assert!(stat.block_size > 0);
        assert!(stat.free_blocks <= stat.total_blocks);
        assert!(stat.available_blocks <= stat.free_blocks);
        assert!(stat.free_inodes <= stat.total_inodes);
    }

    #[test]
    fn test_should_fail_on_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut reader = FileSystemStatReader::new(dir.path().join("missing"));

        let result = reader.read(&mut FileSystemStat::default());

        assert!(matches!(result, Err(ProcfsError::IoError(_))));
    }

    #[rstest]
    #[case(4096, 1000, 4096000)]
    #[case(512, 0, 0)]
    #[case(4096, u64::MAX, u64::MAX)]
    fn test_total_bytes(#[case] block_size: u64, #[case] total_blocks: u64, #[case] expected: u64) {
        let stat = FileSystemStat {
            block_size,
            total_blocks,
            ..Default::default()
        };

        assert_eq!(stat.total_bytes(), expected);
    }

    #[test]
    fn test_free_and_available_bytes() {
        let stat = FileSystemStat {
            block_size: 4096,
            total_blocks: 100,
            free_blocks: 50,
            available_blocks: 40,
            total_inodes: 10,
            free_inodes: 5,
        };

        assert_eq!(stat.free_bytes(), 204800);
        assert_eq!(stat.available_bytes(), 163840);
    }
}
