/// Splits an archive into entries.
///
/// RFC 4155 leaves the separator line loosely defined; the archives written
/// here always start an entry with "From " and end it with two newlines, so
/// a new entry starts at the beginning of the buffer or at a "From " line
/// preceded by a blank line. Message bodies are not escaped, so a body
/// containing such a line will be split there.
pub struct Parser<'a> {
    buf: &'a [u8],
}

impl<'a> Parser<'a> {
    pub fn new(buf: &'a [u8]) -> Parser {
        Parser { buf }
    }
}

const SEPARATOR: &[u8] = b"\n\nFrom ";
const TRAILER: &[u8] = b"\n\n";

/// Offset of the first occurrence of `needle` in `buf`.
pub fn find(buf: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > buf.len() {
        return None;
    }
    buf.windows(needle.len()).position(|window| window == needle)
}

impl<'a> Iterator for Parser<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        if self.buf.is_empty() {
            return None;
        }
        match find(self.buf, SEPARATOR) {
            Some(end) => {
                let res = &self.buf[..end];
                self.buf = &self.buf[end + TRAILER.len()..];
                Some(res)
            }
            None => {
                let mut res = self.buf;
                if res.ends_with(TRAILER) {
                    res = &res[..res.len() - TRAILER.len()];
                }
                self.buf = &self.buf[self.buf.len()..];
                Some(res)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_locates_needle() {
        assert_eq!(find(b"abc\n\nFrom x", SEPARATOR), Some(3));
        assert_eq!(find(b"From x", SEPARATOR), None);
        assert_eq!(find(b"", b"a"), None);
    }

    #[test]
    fn empty_messages_keep_their_envelope() {
        let archive = b"From a d\n\n\nFrom b d\n\n\n";
        let entries: Vec<_> = Parser::new(archive).collect();
        assert_eq!(entries, vec![&b"From a d\n"[..], &b"From b d\n"[..]]);
    }

    #[test]
    fn trailing_newline_of_message_is_kept() {
        let archive = b"From a d\nbody\n\n\nFrom b d\nlast\n\n";
        let entries: Vec<_> = Parser::new(archive).collect();
        assert_eq!(entries[0], &b"From a d\nbody\n"[..]);
        assert_eq!(entries[1], &b"From b d\nlast"[..]);
    }
}
