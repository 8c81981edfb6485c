use std::io::{self, BufRead, Write};
use std::path::Path;

use chrono::NaiveDateTime;
use log::debug;

use crate::envelope::Envelope;
use crate::file::MappedFile;

/// Largest read issued while copying a message body.
pub const CHUNK_SIZE: usize = 2048;

/// A single `.emlx` message: a decimal byte count on the first line,
/// followed by the raw message.
pub struct EmlxFile {
    file: MappedFile,
}

impl EmlxFile {
    pub fn from_file(path: &Path) -> io::Result<Self> {
        Ok(EmlxFile {
            file: MappedFile::from_file(path)?,
        })
    }

    pub fn as_slice(&self) -> &[u8] {
        self.file.as_slice()
    }

    /// Builds the `From ` line for this message, falling back to `now` for
    /// a missing or unreadable date.
    pub fn envelope(&self, now: NaiveDateTime) -> io::Result<Envelope> {
        Envelope::from_reader(self.as_slice(), now)
    }

    /// Copies the message body to `output`, returning the number of bytes
    /// written.
    pub fn copy_body<W: Write>(&self, output: &mut W) -> io::Result<u64> {
        copy_message(&mut self.as_slice(), output)
    }
}

/// Parses the byte count line.
///
/// Leading whitespace and a `+` sign are accepted; parsing stops at the
/// first non-digit. Anything without leading digits counts as zero.
pub fn byte_count(line: &[u8]) -> u64 {
    let mut digits = line.iter().skip_while(|b| b.is_ascii_whitespace()).peekable();
    if digits.peek() == Some(&&b'+') {
        digits.next();
    }
    digits
        .take_while(|b| b.is_ascii_digit())
        .fold(0u64, |n, b| n.saturating_mul(10).saturating_add(u64::from(b - b'0')))
}

/// Consumes the byte count line of `input` and copies that many bytes to
/// `output`, at most `CHUNK_SIZE` per read.
///
/// Copying stops early if `input` runs out; the count line itself is never
/// written.
pub fn copy_message<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<u64> {
    let mut line = Vec::new();
    input.read_until(b'\n', &mut line)?;
    let declared = byte_count(&line);

    let mut buf = [0u8; CHUNK_SIZE];
    let mut remaining = declared;
    let mut copied = 0;
    while remaining > 0 {
        let want = remaining.min(CHUNK_SIZE as u64) as usize;
        let n = match input.read(&mut buf[..want]) {
            Ok(0) => break,
            Ok(n) => n,
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        output.write_all(&buf[..n])?;
        remaining -= n as u64;
        copied += n as u64;
    }

    if copied < declared {
        debug!("declared {} bytes but only {} were available", declared, copied);
    }
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn emlx(count: &str, body: &[u8]) -> Vec<u8> {
        let mut data = format!("{}\n", count).into_bytes();
        data.extend_from_slice(body);
        data
    }

    fn copy(data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        copy_message(&mut Cursor::new(data), &mut out).unwrap();
        out
    }

    #[test]
    fn byte_count_parses_leading_digits() {
        assert_eq!(byte_count(b"11\n"), 11);
        assert_eq!(byte_count(b"  42\r\n"), 42);
        assert_eq!(byte_count(b"+7"), 7);
        assert_eq!(byte_count(b"12abc"), 12);
        assert_eq!(byte_count(b"abc"), 0);
        assert_eq!(byte_count(b"-5"), 0);
        assert_eq!(byte_count(b""), 0);
    }

    #[test]
    fn copies_declared_bytes_only() {
        let data = emlx("11", b"Hello World<plist>trailer</plist>");
        assert_eq!(copy(&data), b"Hello World".to_vec());
    }

    #[test]
    fn zero_count_copies_nothing() {
        assert!(copy(&emlx("0", b"ignored")).is_empty());
        assert!(copy(&emlx("garbage", b"ignored")).is_empty());
        assert!(copy(b"").is_empty());
    }

    #[test]
    fn chunk_boundaries_are_exact() {
        let body: Vec<u8> = (0..5000u32).map(|i| (i % 251) as u8).collect();
        for &n in &[CHUNK_SIZE - 1, CHUNK_SIZE, CHUNK_SIZE + 1, 2 * CHUNK_SIZE] {
            let data = emlx(&n.to_string(), &body);
            assert_eq!(copy(&data), &body[..n], "count {}", n);
        }
    }

    #[test]
    fn short_input_copies_what_is_there() {
        let data = emlx("4096", b"only this");
        assert_eq!(copy(&data), b"only this".to_vec());
    }

    struct ChunkRecorder {
        writes: Vec<usize>,
    }

    impl Write for ChunkRecorder {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.writes.push(buf.len());
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn writes_never_exceed_chunk_size() {
        let body = vec![b'x'; 5000];
        let mut out = ChunkRecorder { writes: Vec::new() };
        let copied = copy_message(&mut Cursor::new(emlx("5000", &body)), &mut out).unwrap();
        assert_eq!(copied, 5000);
        assert!(out.writes.iter().all(|&len| len <= CHUNK_SIZE));
        assert_eq!(out.writes.iter().sum::<usize>(), 5000);
    }

    #[test]
    fn write_errors_propagate() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::Other, "disk full"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let err = copy_message(&mut Cursor::new(emlx("3", b"abc")), &mut Broken).unwrap_err();
        assert_eq!(err.to_string(), "disk full");
    }
}
