//! Parsers to extract lines, fields and numbers from the raw content of /proc files
//!
//! Nothing in here allocates on the success path: lines and fields are sub-slices of the buffer
//! the pseudo-file was read into, and numbers are decoded in place.

use std::str::FromStr;

use crate::procfs::ProcfsError;

/// Returns true if `b` is one of `'\t'`, `'\n'`, `'\v'`, `'\f'`, `'\r'` or `' '`
pub fn is_space(b: u8) -> bool {
    matches!(b, b'\t' | b'\n' | 0x0b | 0x0c | b'\r' | b' ')
}

/// Returns the first line of `buf`, including its trailing `'\n'` if there is one
pub fn get_line(buf: &[u8]) -> &[u8] {
    match buf.iter().position(|&b| b == b'\n') {
        Some(pos) => &buf[..=pos],
        None => buf,
    }
}

/// Locates the first whitespace-delimited field of `buf`
///
/// Returns the half-open `[start, end)` offsets of the field, or `None` if `buf` only contains
/// whitespace. The end of the buffer is treated as a delimiter.
pub fn next_field(buf: &[u8]) -> Option<(usize, usize)> {
    let start = buf.iter().position(|&b| !is_space(b))?;
    let end = buf[start..]
        .iter()
        .position(|&b| is_space(b))
        .map_or(buf.len(), |len| start + len);

    Some((start, end))
}

/// Locates the field at the zero-based position `n` of `line`
///
/// # Arguments
///  * `line`: The line in which to look for the field
///  * `n`: The position of the field (e.g. 1 for field 'b' in line 'a b c')
pub fn nth_field(line: &[u8], n: usize) -> Result<(usize, usize), ProcfsError> {
    let mut offset = 0;

    for pos in 0..=n {
        let (start, end) = next_field(&line[offset..]).ok_or_else(|| {
            ProcfsError::InvalidFileFormat(format!("Could not get field {} (line has {} fields)", n, pos))
        })?;

        if pos == n {
            return Ok((offset + start, offset + end));
        }

        offset += end;
    }

    unreachable!()
}

/// Finds the first line of `buf` starting with `prefix`
///
/// Returns the line along with the content following it, so that consecutive lookups of keys
/// stored in a known order do not rescan the beginning of the buffer.
pub fn find_line_by_prefix<'a>(buf: &'a [u8], prefix: &[u8]) -> Option<(&'a [u8], &'a [u8])> {
    let mut consumed = 0;

    for line in Lines::new(buf) {
        consumed += line.len();

        if line.starts_with(prefix) {
            return Some((line, &buf[consumed..]));
        }
    }

    None
}

/// Iterates over the lines of a buffer, each line including its trailing `'\n'`
pub struct Lines<'a> {
    remaining: &'a [u8],
}

impl<'a> Lines<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Lines { remaining: buf }
    }
}

impl<'a> Iterator for Lines<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining.is_empty() {
            return None;
        }

        let line = get_line(self.remaining);
        self.remaining = &self.remaining[line.len()..];

        Some(line)
    }
}

/// Decodes a field holding an unsigned decimal integer
pub fn decode_u64(field: &[u8]) -> Result<u64, ProcfsError> {
    decode(field)
}

/// Decodes a field holding a decimal floating point number
pub fn decode_f64(field: &[u8]) -> Result<f64, ProcfsError> {
    decode(field)
}

fn decode<T>(field: &[u8]) -> Result<T, ProcfsError>
where
    T: FromStr,
{
    std::str::from_utf8(field)
        .ok()
        .and_then(|s| s.parse::<T>().ok())
        .ok_or_else(|| {
            let err_msg = format!("Could not parse field '{}'", String::from_utf8_lossy(field));
            ProcfsError::InvalidFileContent(err_msg)
        })
}

/// Consumes the whitespace-separated tokens of a line from left to right
pub struct TokenParser<'a> {
    remaining: &'a [u8],
    consumed: usize,
}

impl<'a> TokenParser<'a> {
    /// Builds a token parser from the content of a line
    ///
    /// # Arguments
    ///  * `line` The bytes from which to parse tokens
    pub fn new(line: &'a [u8]) -> TokenParser<'a> {
        TokenParser {
            remaining: line,
            consumed: 0,
        }
    }

    /// Returns the next token, or an error if the line has no token left
    pub fn next_token(&mut self) -> Result<&'a [u8], ProcfsError> {
        let (start, end) = next_field(self.remaining).ok_or_else(|| {
            let err_msg = format!("Could not get token at position {}", self.consumed);
            ProcfsError::InvalidFileFormat(err_msg)
        })?;

        let token = &self.remaining[start..end];
        self.remaining = &self.remaining[end..];
        self.consumed += 1;

        Ok(token)
    }

    /// Discards the next `count` tokens
    pub fn skip(&mut self, count: usize) -> Result<(), ProcfsError> {
        for _ in 0..count {
            self.next_token()?;
        }

        Ok(())
    }

    pub fn next_u64(&mut self) -> Result<u64, ProcfsError> {
        decode_u64(self.next_token()?)
    }

    pub fn next_f64(&mut self) -> Result<f64, ProcfsError> {
        decode_f64(self.next_token()?)
    }
}
