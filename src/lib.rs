//! Convert trees of `.emlx` message folders into legacy mbox archives.
//!
//! Every `<name>.mbox` directory holding a `Messages` subdirectory of
//! `.emlx` files becomes a single `<name>-mbox` archive, and the directory
//! layout around those folders is mirrored under the destination.

mod archive;
mod emlx;
mod envelope;
mod file;
mod parser;
mod tally;
mod walk;

pub use crate::archive::{build_archive, MailFolder};
pub use crate::emlx::{byte_count, copy_message, EmlxFile, CHUNK_SIZE};
pub use crate::envelope::{Envelope, Warning, MISSING_ADDRESS};
pub use crate::file::{Entry, Mboxfile, MboxReader};
pub use crate::parser::Parser;
pub use crate::tally::{Outcome, Tally};
pub use crate::walk::{trim_separators, Converter, SourceRoot};
