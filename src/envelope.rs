//! The `From <address> <date>` separator line written before each message.
//!
//! Both values come from the message's own `From:` and `Date:` fields. The
//! scan does not stop at the end of the header block: it reads the whole
//! message until both fields have been seen, and the first occurrence of
//! each wins.

use std::fmt;
use std::io::{self, BufRead};

use chrono::{DateTime, NaiveDateTime};
use regex::Regex;

/// Address used when a message has no `From:` field.
pub const MISSING_ADDRESS: &str = "EMLX-2-MBOX";

const ASCTIME: &str = "%a %b %e %H:%M:%S %Y";

/// Reasons an envelope had to use a substitute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    MissingFrom,
    MissingDate,
    InvalidDate(String),
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Warning::MissingFrom => write!(f, "Using {} for missing 'From' field", MISSING_ADDRESS),
            Warning::MissingDate => write!(f, "Using current date for missing 'Date' field"),
            Warning::InvalidDate(value) => {
                write!(f, "Using current date for invalid 'Date' field {:?}", value)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    address: String,
    date: String,
    warnings: Vec<Warning>,
}

impl Envelope {
    /// Scans `input` for the `From:` and `Date:` fields and builds the
    /// envelope, substituting [`MISSING_ADDRESS`] or `now` where needed.
    pub fn from_reader<R: BufRead>(input: R, now: NaiveDateTime) -> io::Result<Envelope> {
        let fields = Fields::scan(input)?;
        let mut warnings = Vec::new();

        let address = match fields.from {
            Some(raw) => resolve_address(&raw),
            None => {
                warnings.push(Warning::MissingFrom);
                MISSING_ADDRESS.to_string()
            }
        };

        let date = match fields.date {
            Some(raw) => match parse_date(&raw) {
                Some(date) => date.format(ASCTIME).to_string(),
                None => {
                    warnings.push(Warning::InvalidDate(raw));
                    now.format(ASCTIME).to_string()
                }
            },
            None => {
                warnings.push(Warning::MissingDate);
                now.format(ASCTIME).to_string()
            }
        };

        Ok(Envelope {
            address,
            date,
            warnings,
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "From {} {}", self.address, self.date)
    }
}

#[derive(Debug, Default)]
struct Fields {
    from: Option<String>,
    date: Option<String>,
}

impl Fields {
    fn scan<R: BufRead>(mut input: R) -> io::Result<Fields> {
        let mut fields = Fields::default();
        let mut line = Vec::new();
        while fields.from.is_none() || fields.date.is_none() {
            line.clear();
            if input.read_until(b'\n', &mut line)? == 0 {
                break;
            }
            if fields.from.is_none() {
                if let Some(value) = field(&line, b"from:") {
                    fields.from = value;
                    continue;
                }
            }
            if fields.date.is_none() {
                if let Some(value) = field(&line, b"date:") {
                    fields.date = value;
                }
            }
        }
        Ok(fields)
    }
}

/// Matches `label` (case-insensitive) followed by a whitespace character
/// and returns the trimmed value, `Some(None)` when that value is empty.
fn field(line: &[u8], label: &[u8]) -> Option<Option<String>> {
    if line.len() <= label.len()
        || !line[..label.len()].eq_ignore_ascii_case(label)
        || !line[label.len()].is_ascii_whitespace()
    {
        return None;
    }
    let value = String::from_utf8_lossy(&line[label.len() + 1..]);
    let value = value.trim();
    if value.is_empty() {
        Some(None)
    } else {
        Some(Some(value.to_string()))
    }
}

/// Parses an RFC 2822 date, keeping the wall-clock time it was written in.
///
/// A weekday that does not match the date is ignored.
fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(date) = DateTime::parse_from_rfc2822(raw) {
        return Some(date.naive_local());
    }
    let (weekday, rest) = raw.split_at(raw.find(',')?);
    if !weekday.trim().chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    DateTime::parse_from_rfc2822(rest[1..].trim_start())
        .ok()
        .map(|date| date.naive_local())
}

fn address_pattern() -> &'static Regex {
    static PATTERN: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    // Greedy: with several bracketed parts the last one is used.
    PATTERN.get_or_init(|| Regex::new(r".* <(.*@.*)>").expect("valid address pattern"))
}

fn resolve_address(raw: &str) -> String {
    let mut address = match address_pattern().captures(raw) {
        Some(captures) => captures.get(1).map_or(raw, |m| m.as_str()).trim(),
        None => raw,
    };
    address = strip_prefix_ignore_case(address, "smtp:");
    address = strip_prefix_ignore_case(address, "mailto:");
    address.to_string()
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> &'a str {
    match s.as_bytes().get(..prefix.len()) {
        Some(head) if head.eq_ignore_ascii_case(prefix.as_bytes()) => &s[prefix.len()..],
        _ => s,
    }
}
