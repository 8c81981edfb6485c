use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use log::{debug, error, warn};

use crate::emlx::EmlxFile;
use crate::tally::{Outcome, Tally};
use crate::walk::SourceRoot;

const FOLDER_SUFFIX: &str = ".mbox";
const MESSAGES_DIR: &str = "Messages";
const MESSAGE_SUFFIX: &str = ".emlx";
const ARCHIVE_SUFFIX: &str = "-mbox";

/// A `<name>.mbox` directory with a `Messages` subdirectory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailFolder {
    path: PathBuf,
}

impl MailFolder {
    /// Whether a directory name marks a mail folder, regardless of its
    /// contents.
    pub fn has_folder_suffix(name: &str) -> bool {
        name.ends_with(FOLDER_SUFFIX)
    }

    /// Recognises `path` as a mail folder. Folders without a `Messages`
    /// directory are not.
    pub fn detect(path: &Path) -> Option<MailFolder> {
        let name = path.file_name()?.to_string_lossy();
        if Self::has_folder_suffix(&name) && path.join(MESSAGES_DIR).is_dir() {
            Some(MailFolder {
                path: path.to_path_buf(),
            })
        } else {
            None
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Inbox.mbox` becomes `Inbox-mbox`.
    pub fn archive_name(&self) -> OsString {
        let mut name = self.path.file_stem().unwrap_or_default().to_os_string();
        name.push(ARCHIVE_SUFFIX);
        name
    }

    /// The `.emlx` files of this folder, in directory order.
    pub fn messages(&self) -> io::Result<Vec<PathBuf>> {
        let mut messages = Vec::new();
        for entry in fs::read_dir(self.path.join(MESSAGES_DIR))? {
            let entry = entry?;
            if entry.file_name().to_string_lossy().ends_with(MESSAGE_SUFFIX) {
                messages.push(entry.path());
            }
        }
        Ok(messages)
    }
}

/// Writes every message of `folder` into a single archive in `dest`.
///
/// A destination that cannot be created, or that exists but is not a
/// directory, fails every message of the folder and writes nothing. Other
/// failures only affect the message they happen on.
pub fn build_archive<W: Write>(
    folder: &MailFolder,
    dest: &Path,
    root: &SourceRoot,
    progress: &mut W,
) -> Tally {
    let messages = match folder.messages() {
        Ok(messages) => messages,
        Err(e) => {
            error!("Error reading {}: {}", root.relative(folder.path()), e);
            return Tally::new();
        }
    };

    if let Err(e) = ensure_dir(dest) {
        error!("Error creating {}: {}", dest.display(), e);
        error!("{} messages are being skipped.", messages.len());
        return Tally::failed(messages.len());
    }

    let name = folder.archive_name();
    let _ = writeln!(
        progress,
        "  Building {} ({} messages)...",
        Path::new(&name).display(),
        messages.len()
    );

    let file = match File::create(dest.join(&name)) {
        Ok(file) => file,
        Err(e) => {
            error!("Error creating {}: {}", dest.join(&name).display(), e);
            error!("{} messages are being skipped.", messages.len());
            return Tally::failed(messages.len());
        }
    };
    let mut out = BufWriter::new(file);

    let mut tally = Tally::new();
    for path in &messages {
        let outcome = match convert_message(path, &mut out, root) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Error converting {}: {}", root.relative(path), e);
                Outcome::Failed
            }
        };
        tally.record(outcome);
    }
    tally
}

fn ensure_dir(dir: &Path) -> io::Result<()> {
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(io::Error::new(io::ErrorKind::AlreadyExists, "File exists")),
        Err(ref e) if e.kind() == io::ErrorKind::NotFound => fs::create_dir(dir),
        Err(e) => Err(e),
    }
}

/// Appends one message: envelope line, body, blank line.
///
/// The writer is flushed afterwards so a failure is attributed to the
/// message that caused it.
fn convert_message<W: Write>(path: &Path, out: &mut W, root: &SourceRoot) -> io::Result<Outcome> {
    let message = EmlxFile::from_file(path)?;
    let envelope = message.envelope(Local::now().naive_local())?;
    for warning in envelope.warnings() {
        warn!("{} in {}", warning, root.relative(path));
    }

    writeln!(out, "{}", envelope)?;
    let copied = message.copy_body(out)?;
    out.write_all(b"\n\n")?;
    out.flush()?;
    debug!("{}: {} bytes", envelope, copied);

    if envelope.has_warnings() {
        Ok(Outcome::ConvertedWithWarning)
    } else {
        Ok(Outcome::Converted)
    }
}
