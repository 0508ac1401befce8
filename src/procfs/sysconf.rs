use libc::{sysconf, _SC_NPROCESSORS_ONLN};

use crate::procfs::ProcfsError;

/// Returns the amount of logical CPUs currently online
pub(crate) fn cpu_count() -> Result<usize, ProcfsError> {
    let cpu_count_value;

    unsafe {
        cpu_count_value = sysconf(_SC_NPROCESSORS_ONLN);
    }

    match cpu_count_value {
        n if n < 1 => Err(ProcfsError::SysconfError),
        n => Ok(n as usize),
    }
}
