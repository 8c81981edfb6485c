use std::fmt;
use std::ops::{Add, AddAssign};

/// What happened to a single message unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Converted,
    /// Written to the archive, but with a substituted envelope field.
    ConvertedWithWarning,
    Failed,
}

/// Success, warning and error counts for a run.
///
/// Warnings are a subset of successes: a message converted with a
/// substituted field counts towards both.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub success: usize,
    pub warning: usize,
    pub error: usize,
}

impl Tally {
    pub fn new() -> Tally {
        Tally::default()
    }

    /// Every one of `count` messages failed.
    pub fn failed(count: usize) -> Tally {
        Tally {
            error: count,
            ..Tally::default()
        }
    }

    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Converted => self.success += 1,
            Outcome::ConvertedWithWarning => {
                self.success += 1;
                self.warning += 1;
            }
            Outcome::Failed => self.error += 1,
        }
    }
}

impl AddAssign for Tally {
    fn add_assign(&mut self, other: Tally) {
        self.success += other.success;
        self.warning += other.warning;
        self.error += other.error;
    }
}

impl Add for Tally {
    type Output = Tally;

    fn add(mut self, other: Tally) -> Tally {
        self += other;
        self
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let max = self.success.max(self.warning).max(self.error);
        let width = max.to_string().len();
        writeln!(f)?;
        writeln!(f, "    {:>w$} messages were converted", self.success, w = width)?;
        writeln!(f, "    {:>w$} of those had warnings", self.warning, w = width)?;
        writeln!(
            f,
            "    {:>w$} messages could not be converted",
            self.error,
            w = width
        )
    }
}
