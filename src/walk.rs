use std::env;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use log::error;

use crate::archive::{build_archive, MailFolder};
use crate::tally::Tally;

/// The directory containing the conversion source, used to print paths
/// relative to it.
#[derive(Debug, Clone)]
pub struct SourceRoot {
    root: PathBuf,
}

impl SourceRoot {
    pub fn new(root: &Path) -> SourceRoot {
        SourceRoot {
            root: root.to_path_buf(),
        }
    }

    /// The root for a run starting at `source`: its parent directory, so
    /// printed paths include the source directory's own name.
    pub fn for_source(source: &Path) -> SourceRoot {
        SourceRoot::new(source.parent().unwrap_or(source))
    }

    pub fn relative<'a>(&self, path: &'a Path) -> impl fmt::Display + 'a {
        path.strip_prefix(&self.root).unwrap_or(path).display()
    }
}

/// Drops trailing separators (and `.` components) from a path given on the
/// command line.
pub fn trim_separators(path: &Path) -> PathBuf {
    path.components().collect()
}

/// Makes `path` absolute against the working directory, resolving `.` and
/// `..` lexically.
fn absolute(path: &Path) -> io::Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()?.join(path)
    };
    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    Ok(out)
}

/// Walks a source tree and converts every mail folder found in it.
pub struct Converter {
    root: SourceRoot,
    source: PathBuf,
}

impl Converter {
    pub fn new(source: &Path) -> io::Result<Converter> {
        let source = absolute(source)?;
        Ok(Converter {
            root: SourceRoot::for_source(&source),
            source,
        })
    }

    /// Converts the whole source tree into `dest`, writing progress lines
    /// to `progress`.
    pub fn convert<W: Write>(&self, dest: &Path, progress: &mut W) -> Tally {
        self.convert_dir(&self.source, dest, progress)
    }

    /// Archives the mail folders directly inside `source` into `dest`, then
    /// descends into the remaining visible subdirectories.
    fn convert_dir<W: Write>(&self, source: &Path, dest: &Path, progress: &mut W) -> Tally {
        let _ = writeln!(progress, "Processing {}...", self.root.relative(source));

        let children = match subdirectories(source) {
            Ok(children) => children,
            Err(e) => {
                error!("Error reading {}: {}", self.root.relative(source), e);
                return Tally::new();
            }
        };

        let mut tally = Tally::new();
        for child in &children {
            if let Some(folder) = MailFolder::detect(child) {
                tally += build_archive(&folder, dest, &self.root, progress);
            }
        }

        for child in &children {
            let name = match child.file_name() {
                Some(name) => name,
                None => continue,
            };
            let visible = name.to_string_lossy();
            if visible.starts_with('.') || MailFolder::has_folder_suffix(&visible) {
                continue;
            }
            tally += self.convert_dir(child, &dest.join(name), progress);
        }
        tally
    }
}

fn subdirectories(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_separators_are_dropped() {
        assert_eq!(trim_separators(Path::new("Mail/")), PathBuf::from("Mail"));
        assert_eq!(trim_separators(Path::new("/a/b//")), PathBuf::from("/a/b"));
        assert_eq!(trim_separators(Path::new("/")), PathBuf::from("/"));
    }

    #[test]
    fn absolute_resolves_dots() {
        assert_eq!(
            absolute(Path::new("/a/./b/../c")).unwrap(),
            PathBuf::from("/a/c")
        );
        assert!(absolute(Path::new("rel")).unwrap().is_absolute());
    }

    #[test]
    fn relative_paths_include_source_name() {
        let root = SourceRoot::for_source(Path::new("/home/me/Mail"));
        assert_eq!(
            root.relative(Path::new("/home/me/Mail/Inbox.mbox")).to_string(),
            "Mail/Inbox.mbox"
        );
        assert_eq!(root.relative(Path::new("/elsewhere")).to_string(), "/elsewhere");
    }

    fn add_message(folder: &Path) {
        fs::create_dir_all(folder.join("Messages")).unwrap();
        fs::write(folder.join("Messages").join("1.emlx"), "2\nhi").unwrap();
    }

    #[test]
    fn progress_lines_name_directories_and_archives() {
        let dir = tempfile::TempDir::new().unwrap();
        let mail = dir.path().join("Mail");
        add_message(&mail.join("Inbox.mbox"));
        add_message(&mail.join(".hidden").join("Secret.mbox"));
        fs::create_dir_all(mail.join("Work")).unwrap();
        let dest = dir.path().join("out");

        let mut progress = Vec::new();
        let tally = Converter::new(&mail).unwrap().convert(&dest, &mut progress);

        let progress = String::from_utf8(progress).unwrap();
        let mut lines: Vec<_> = progress.lines().collect();
        lines.sort();
        assert_eq!(
            lines,
            vec![
                "  Building Inbox-mbox (1 messages)...",
                "Processing Mail...",
                "Processing Mail/Work...",
            ]
        );
        assert_eq!(tally.success, 1);
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_names_are_mirrored_exactly() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::TempDir::new().unwrap();
        let name = OsStr::from_bytes(b"Caf\xe9");
        let source = dir.path().join("src");
        add_message(&source.join(name).join("Inbox.mbox"));
        let dest = dir.path().join("out");
        fs::create_dir(&dest).unwrap();

        let tally = Converter::new(&source).unwrap().convert(&dest, &mut io::sink());

        assert_eq!(tally.success, 1);
        assert!(dest.join(name).join("Inbox-mbox").is_file());
    }
}
