//! Single-read access to the content of pseudo-files

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use log::warn;

use crate::procfs::ProcfsError;

/// Capacity of the buffers used for `/proc/stat`, `/proc/diskstats` and `/proc/net/dev`
pub const COUNTERS_BUFFER_SIZE: usize = 8192;
/// Capacity of the buffer used for `/proc/meminfo`
pub const MEMINFO_BUFFER_SIZE: usize = 4096;
/// Capacity of the buffers used for single-line files such as `/proc/uptime`
pub const LINE_BUFFER_SIZE: usize = 80;

/// Type which can provide the current content of a pseudo-file
pub trait ReadPseudoFile {
    /// Returns the content of the file, as read at the moment of this call
    fn read(&mut self) -> Result<&[u8], ProcfsError>;
}

/// Reads a file from the /proc filesystem into a buffer of fixed capacity
///
/// The file is opened and closed at each read, and is read with a single `read()` call: kernel
/// pseudo-files are generated in one go, so a short read is treated as the whole content.
/// Files larger than the buffer capacity (e.g. `/proc/diskstats` on machines with hundreds of block
/// devices) get truncated.
pub struct PseudoFileReader {
    path: PathBuf,
    buf: Box<[u8]>,
}

impl PseudoFileReader {
    pub fn new<P: Into<PathBuf>>(path: P, capacity: usize) -> Self {
        PseudoFileReader {
            path: path.into(),
            buf: vec![0; capacity].into_boxed_slice(),
        }
    }

    pub fn path(&self) -> &Path {
        self.path.as_path()
    }
}

impl ReadPseudoFile for PseudoFileReader {
    fn read(&mut self) -> Result<&[u8], ProcfsError> {
        let mut file = File::open(&self.path)?;
        let len = read_once(&mut file, &mut self.buf)?;

        if len == self.buf.len() {
            warn!("Content of {:?} may exceed the {} bytes buffer", self.path, self.buf.len());
        }

        Ok(&self.buf[..len])
    }
}

/// Issues exactly one `read()` on `src`, retrying only if it was interrupted by a signal
fn read_once<R: Read>(src: &mut R, buf: &mut [u8]) -> Result<usize, ProcfsError> {
    loop {
        match src.read(buf) {
            Ok(len) => return Ok(len),
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

#[cfg(test)]
pub mod fakes {
    use std::collections::VecDeque;

    use crate::procfs::reader::ReadPseudoFile;
    use crate::procfs::ProcfsError;

    /// A fake pseudo-file whose content changes at each read, following a predefined sequence
    pub struct FakePseudoFile {
        content_sequence: VecDeque<Vec<u8>>,
        current: Vec<u8>,
    }

    impl FakePseudoFile {
        pub fn from_sequence(sequence: Vec<&str>) -> Self {
            Self {
                content_sequence: sequence.into_iter().map(|s| s.as_bytes().to_vec()).collect(),
                current: Vec::new(),
            }
        }

        pub fn from_content(content: &str) -> Self {
            Self::from_sequence(vec![content])
        }
    }

    impl ReadPseudoFile for FakePseudoFile {
        fn read(&mut self) -> Result<&[u8], ProcfsError> {
            self.current = self
                .content_sequence
                .pop_front()
                .expect("The fake pseudo-file has nothing to return");

            Ok(&self.current)
        }
    }
}

#[cfg(test)]
mod test_read_once {
    use std::io::{Cursor, Read};

    use crate::procfs::reader::read_once;

    /// Hands out its content in chunks, like a pipe would
    struct ChunkedSource {
        content: Cursor<Vec<u8>>,
        chunk: usize,
    }

    impl Read for ChunkedSource {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let len = buf.len().min(self.chunk);
            self.content.read(&mut buf[..len])
        }
    }

    #[test]
    fn test_should_read_whole_content_when_it_fits() {
        let mut src = Cursor::new(b"1.31 1.39 1.43 2/1081 24188\n".to_vec());
        let mut buf = [0u8; 80];

        let len = read_once(&mut src, &mut buf).unwrap();

        assert_eq!(&buf[..len], b"1.31 1.39 1.43 2/1081 24188\n");
    }

    #[test]
    fn test_should_truncate_content_to_buffer_capacity() {
        let mut src = Cursor::new(vec![b'x'; 100]);
        let mut buf = [0u8; 80];

        assert_eq!(read_once(&mut src, &mut buf).unwrap(), 80);
    }

    #[test]
    fn test_should_not_loop_on_short_reads() {
        let mut src = ChunkedSource {
            content: Cursor::new(b"0123456789".to_vec()),
            chunk: 4,
        };
        let mut buf = [0u8; 80];

        assert_eq!(read_once(&mut src, &mut buf).unwrap(), 4);
    }
}
