//! Byte-for-byte file comparison.
//!
//! Used right before cloning when verification is enabled, to catch a file
//! that changed after it was hashed (or, in theory, a digest collision).

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

const COMPARE_CHUNK: usize = 64 * 1024;

/// Whether two files have identical content.
///
/// Sizes are compared first; contents are then streamed in lockstep and
/// the comparison stops at the first differing chunk.
///
/// # Errors
///
/// Any I/O error opening or reading either file.
pub fn files_identical(a: &Path, b: &Path) -> io::Result<bool> {
    let file_a = File::open(a)?;
    let file_b = File::open(b)?;

    if file_a.metadata()?.len() != file_b.metadata()?.len() {
        return Ok(false);
    }

    let mut reader_a = BufReader::with_capacity(COMPARE_CHUNK, file_a);
    let mut reader_b = BufReader::with_capacity(COMPARE_CHUNK, file_b);
    let mut buf_a = vec![0u8; COMPARE_CHUNK];
    let mut buf_b = vec![0u8; COMPARE_CHUNK];

    loop {
        let n_a = fill(&mut reader_a, &mut buf_a)?;
        let n_b = fill(&mut reader_b, &mut buf_b)?;
        if n_a != n_b || buf_a[..n_a] != buf_b[..n_b] {
            return Ok(false);
        }
        if n_a == 0 {
            return Ok(true);
        }
    }
}

/// Read until `buf` is full or the reader is exhausted.
fn fill(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
