use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;

use crate::parser::Parser;
use memmap::Mmap;

/// A read-only memory map of a whole file.
///
/// Zero-length files cannot be mapped, so they are represented without a
/// mapping and read back as an empty slice.
pub(crate) struct MappedFile {
    mmap: Option<Mmap>,
}

impl MappedFile {
    pub(crate) fn from_file(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        let meta = file.metadata()?;
        if !meta.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "not a regular file",
            ));
        }
        if meta.len() == 0 {
            return Ok(MappedFile { mmap: None });
        }
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(MappedFile { mmap: Some(mmap) })
    }

    pub(crate) fn as_slice(&self) -> &[u8] {
        match &self.mmap {
            Some(mmap) => &mmap[..],
            None => &[],
        }
    }
}

/// An mbox archive as written by the converter.
pub struct Mboxfile {
    file: MappedFile,
}

impl Mboxfile {
    pub fn from_file(path: &Path) -> io::Result<Self> {
        Ok(Mboxfile {
            file: MappedFile::from_file(path)?,
        })
    }

    pub fn as_slice(&self) -> &[u8] {
        self.file.as_slice()
    }

    pub fn iter(&self) -> MboxReader {
        MboxReader::new(self)
    }
}

/// One message of an archive: its `From ` line and the raw message bytes.
pub struct Entry<'a> {
    data: &'a [u8],
    idx: usize,
}

impl<'a> Entry<'a> {
    pub fn new(data: &'a [u8], idx: usize) -> Entry<'a> {
        Entry { data, idx }
    }

    pub fn index(&self) -> usize {
        self.idx
    }

    /// The envelope line, without its line terminator.
    pub fn envelope(&self) -> &'a [u8] {
        match self.data.iter().position(|&b| b == b'\n') {
            Some(end) => &self.data[..end],
            None => self.data,
        }
    }

    /// Everything after the envelope line.
    pub fn body(&self) -> &'a [u8] {
        match self.data.iter().position(|&b| b == b'\n') {
            Some(end) => &self.data[end + 1..],
            None => &[],
        }
    }
}

impl<'a> fmt::Debug for Entry<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Entry {} {} ({} bytes)",
            self.idx,
            String::from_utf8_lossy(self.envelope()),
            self.body().len()
        )
    }
}

pub struct MboxReader<'a> {
    parser: Parser<'a>,
    count: usize,
}

impl<'a> MboxReader<'a> {
    pub fn new(file: &Mboxfile) -> MboxReader {
        MboxReader {
            parser: Parser::new(file.as_slice()),
            count: 0,
        }
    }
}

impl<'a> Iterator for MboxReader<'a> {
    type Item = Entry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = Entry::new(self.parser.next()?, self.count);
        self.count += 1;
        Some(entry)
    }
}
