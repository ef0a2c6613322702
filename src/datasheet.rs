//! Datasheet links: turning a chosen file into a path relative to the base
//! directory, resolving it back, and handing it to a document viewer.

use std::io;
use std::path::{Component as PathPart, Path, PathBuf};
use std::process::{Command, Stdio};

use log::info;
use thiserror::Error;

/// Failures around linking or viewing a datasheet. None of them touch the
/// store.
#[derive(Debug, Error)]
pub enum DatasheetError {
    #[error("No datasheet linked.")]
    NotLinked,
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Could not resolve {}: {source}", .path.display())]
    Resolve {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Could not open {}: {source}", .path.display())]
    Launch {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Something that can show a document to the user.
pub trait DocumentViewer {
    /// Launch the viewer for `path` without waiting for it to exit.
    fn open(&self, path: &Path) -> io::Result<()>;

    /// Short label for status messages and logs.
    fn name(&self) -> String;
}

/// Hand documents to whatever the OS associates with them.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemViewer;

impl DocumentViewer for SystemViewer {
    fn open(&self, path: &Path) -> io::Result<()> {
        open::that_detached(path)
    }

    fn name(&self) -> String {
        "system viewer".to_string()
    }
}

/// Spawn a specific program with the document path as its only argument.
#[derive(Debug, Clone)]
pub struct CommandViewer {
    program: PathBuf,
}

impl CommandViewer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl DocumentViewer for CommandViewer {
    fn open(&self, path: &Path) -> io::Result<()> {
        Command::new(&self.program)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_| ())
    }

    fn name(&self) -> String {
        self.program.display().to_string()
    }
}

/// Pick the viewer backend. `program` is either a bare command looked up on
/// `PATH` or a path; relative paths that exist beneath `base_dir` win over the
/// `PATH` lookup so a bundled viewer keeps working.
pub fn select_viewer(program: Option<&str>, base_dir: &Path) -> Box<dyn DocumentViewer> {
    match program.map(str::trim).filter(|p| !p.is_empty()) {
        Some(program) => {
            let bundled = base_dir.join(program);
            if Path::new(program).is_relative() && bundled.is_file() {
                Box::new(CommandViewer::new(bundled))
            } else {
                Box::new(CommandViewer::new(program))
            }
        }
        None => Box::new(SystemViewer),
    }
}

/// Validate a file chosen by the user and express it relative to `base_dir`.
/// Relative input is taken relative to the current directory.
pub fn link_path(base_dir: &Path, chosen: &Path) -> Result<String, DatasheetError> {
    let absolute = if chosen.is_absolute() {
        chosen.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|source| DatasheetError::Resolve {
                path: chosen.to_path_buf(),
                source,
            })?
            .join(chosen)
    };

    if !absolute.is_file() {
        return Err(DatasheetError::NotFound(absolute));
    }

    let file = absolute
        .canonicalize()
        .map_err(|source| DatasheetError::Resolve {
            path: absolute.clone(),
            source,
        })?;
    let base = base_dir
        .canonicalize()
        .unwrap_or_else(|_| base_dir.to_path_buf());

    Ok(relative_to(&file, &base).to_string_lossy().into_owned())
}

/// Resolve a stored link back to an absolute path.
pub fn resolve(base_dir: &Path, stored: &str) -> PathBuf {
    normalize(&base_dir.join(stored))
}

/// Open the datasheet stored for a row. Returns the absolute path that was
/// handed to the viewer.
pub fn view(
    base_dir: &Path,
    stored: &str,
    viewer: &dyn DocumentViewer,
) -> Result<PathBuf, DatasheetError> {
    let stored = stored.trim();
    if stored.is_empty() {
        return Err(DatasheetError::NotLinked);
    }

    let path = resolve(base_dir, stored);
    if !path.exists() {
        return Err(DatasheetError::NotFound(path));
    }

    viewer.open(&path).map_err(|source| DatasheetError::Launch {
        path: path.clone(),
        source,
    })?;
    info!("opened {} with {}", path.display(), viewer.name());
    Ok(path)
}

/// Path of `path` as seen from `base`, walking up with `..` where the two
/// diverge. Both are expected to be absolute and normalized.
fn relative_to(path: &Path, base: &Path) -> PathBuf {
    let path_parts: Vec<PathPart<'_>> = path.components().collect();
    let base_parts: Vec<PathPart<'_>> = base.components().collect();

    // Different roots (e.g. another drive): nothing relative to express.
    if path_parts.first() != base_parts.first() {
        return path.to_path_buf();
    }

    let shared = path_parts
        .iter()
        .zip(&base_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in shared..base_parts.len() {
        relative.push("..");
    }
    for part in &path_parts[shared..] {
        relative.push(part.as_os_str());
    }
    relative
}

/// Collapse `.` and `..` without touching the file system.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for part in path.components() {
        match part {
            PathPart::CurDir => {}
            PathPart::ParentDir => {
                if !normalized.pop() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::fs;

    use super::*;

    #[derive(Default)]
    struct RecordingViewer {
        opened: RefCell<Vec<PathBuf>>,
        fail: bool,
    }

    impl DocumentViewer for RecordingViewer {
        fn open(&self, path: &Path) -> io::Result<()> {
            if self.fail {
                return Err(io::Error::new(io::ErrorKind::NotFound, "no viewer"));
            }
            self.opened.borrow_mut().push(path.to_path_buf());
            Ok(())
        }

        fn name(&self) -> String {
            "recorder".to_string()
        }
    }

    #[test]
    fn relative_inside_base() {
        let rel = relative_to(
            Path::new("/app/datasheets/ne555.pdf"),
            Path::new("/app"),
        );
        assert_eq!(rel, Path::new("datasheets/ne555.pdf"));
    }

    #[test]
    fn relative_outside_base_walks_up() {
        let rel = relative_to(
            Path::new("/home/me/docs/ne555.pdf"),
            Path::new("/home/me/labparts"),
        );
        assert_eq!(rel, Path::new("../docs/ne555.pdf"));
    }

    #[test]
    fn resolve_collapses_parent_segments() {
        let resolved = resolve(Path::new("/home/me/labparts"), "../docs/ne555.pdf");
        assert_eq!(resolved, Path::new("/home/me/docs/ne555.pdf"));
    }

    #[test]
    fn link_then_view_opens_the_same_file() {
        let base = tempfile::tempdir().unwrap();
        let sheets = base.path().join("datasheets");
        fs::create_dir_all(&sheets).unwrap();
        let file = sheets.join("bc547.pdf");
        fs::write(&file, b"%PDF-1.4").unwrap();

        let stored = link_path(base.path(), &file).unwrap();
        assert_eq!(Path::new(&stored), Path::new("datasheets/bc547.pdf"));

        let viewer = RecordingViewer::default();
        let opened = view(base.path(), &stored, &viewer).unwrap();
        assert_eq!(opened, base.path().join("datasheets").join("bc547.pdf"));
        assert_eq!(viewer.opened.borrow().len(), 1);
    }

    #[test]
    fn linking_a_missing_file_fails() {
        let base = tempfile::tempdir().unwrap();
        let err = link_path(base.path(), &base.path().join("nope.pdf")).unwrap_err();
        assert!(matches!(err, DatasheetError::NotFound(_)));
    }

    #[test]
    fn empty_link_reports_not_linked() {
        let base = tempfile::tempdir().unwrap();
        let viewer = RecordingViewer::default();
        let err = view(base.path(), "  ", &viewer).unwrap_err();
        assert!(matches!(err, DatasheetError::NotLinked));
        assert!(viewer.opened.borrow().is_empty());
    }

    #[test]
    fn missing_datasheet_reports_not_found_without_launching() {
        let base = tempfile::tempdir().unwrap();
        let viewer = RecordingViewer::default();
        let err = view(base.path(), "datasheets/gone.pdf", &viewer).unwrap_err();
        assert!(matches!(err, DatasheetError::NotFound(_)));
        assert!(err.to_string().starts_with("File not found"));
        assert!(viewer.opened.borrow().is_empty());
    }

    #[test]
    fn launch_failure_is_reported() {
        let base = tempfile::tempdir().unwrap();
        fs::write(base.path().join("x.pdf"), b"").unwrap();
        let viewer = RecordingViewer {
            fail: true,
            ..RecordingViewer::default()
        };
        let err = view(base.path(), "x.pdf", &viewer).unwrap_err();
        assert!(matches!(err, DatasheetError::Launch { .. }));
    }

    #[test]
    fn bundled_viewer_resolves_against_base() {
        let base = tempfile::tempdir().unwrap();
        fs::create_dir_all(base.path().join("thirdParty")).unwrap();
        fs::write(base.path().join("thirdParty/viewer"), b"").unwrap();

        let viewer = select_viewer(Some("thirdParty/viewer"), base.path());
        assert_eq!(
            viewer.name(),
            base.path().join("thirdParty/viewer").display().to_string()
        );

        let fallback = select_viewer(Some("zathura"), base.path());
        assert_eq!(fallback.name(), "zathura");
        assert_eq!(select_viewer(None, base.path()).name(), "system viewer");
    }
}
