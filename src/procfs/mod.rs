//! Readers of system statistics, based on the /proc filesystem
//!
//! Counters which only ever increase (CPU ticks, disk I/O, network traffic) are read by
//! double-buffered readers which compute per-second rates between two consecutive reads.
//! Other values (memory, load average, uptime, filesystem capacity) are read as they are.

use std::io;

use thiserror::Error;

pub mod counters;
pub mod cpu;
pub mod disk;
pub mod filesystem;
pub mod loadavg;
pub mod meminfo;
pub mod network;
pub mod parsers;
pub mod rates;
pub mod reader;
mod sysconf;
pub mod uptime;

#[derive(Error, Debug)]
pub enum ProcfsError {
    #[error(transparent)]
    IoError(#[from] io::Error),
    #[error("Unexpected file format: {0}")]
    InvalidFileFormat(String),
    #[error("Unexpected file content: {0}")]
    InvalidFileContent(String),
    #[error("Entity is not tracked by this reader: '{0}'")]
    EntityNotFound(String),
    #[error("Entity is tracked more than once: '{0}'")]
    DuplicateEntity(String),
    #[error("Could not query system configuration")]
    SysconfError,
}

impl ProcfsError {
    /// Indicates that the read content did not have the expected shape
    ///
    /// Such errors may be transient, whereas other errors denote either an OS failure or a bug in
    /// the way the reader is used.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            ProcfsError::InvalidFileFormat(_) | ProcfsError::InvalidFileContent(_)
        )
    }
}

#[cfg(test)]
mod test_procfs_error {
    use std::io;

    use rstest::rstest;

    use crate::procfs::ProcfsError;

    #[rstest]
    #[case(ProcfsError::InvalidFileFormat("missing field".to_string()), true)]
    #[case(ProcfsError::InvalidFileContent("not a number".to_string()), true)]
    #[case(ProcfsError::EntityNotFound("sdc".to_string()), false)]
    #[case(ProcfsError::IoError(io::Error::new(io::ErrorKind::NotFound, "oh no!")), false)]
    #[case(ProcfsError::SysconfError, false)]
    fn test_should_classify_format_errors(#[case] error: ProcfsError, #[case] expected: bool) {
        assert_eq!(error.is_format_error(), expected);
    }

    #[test]
    fn test_entity_not_found_message_should_name_entity() {
        let error = ProcfsError::EntityNotFound("sdc".to_string());

        assert_eq!(error.to_string(), "Entity is not tracked by this reader: 'sdc'");
    }
}
