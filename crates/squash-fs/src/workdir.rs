use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::primitives::{AtomicWriteOptions, atomic_read, atomic_write_from, remove_if_exists};
use crate::sanitize::sanitize_file_name;
use crate::{Error, Result};

/// Suffix appended to a staged input path to form its output path.
pub const OUTPUT_SUFFIX: &str = ".compressed";

#[cfg(unix)]
const DIR_MODE: u32 = 0o700;
#[cfg(unix)]
const FILE_MODE: u32 = 0o600;

/// The dedicated directory transient files are staged in.
///
/// Cheap to clone; holds no open handles. Several requests may stage into the
/// same `WorkDir` concurrently.
#[derive(Clone, Debug)]
pub struct WorkDir {
    root: PathBuf,
}

impl WorkDir {
    /// Open `root`, creating it (private to the current user on unix) when
    /// it does not exist yet.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.exists() {
            create_private_dir(&root)?;
            debug!(path = %root.display(), "created working directory");
        }
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Stream `reader` into a fresh `<uuid>-<sanitized name>` file.
    pub fn stage(&self, reader: &mut dyn Read, source_name: &str) -> Result<StagedFile> {
        let name = sanitize_file_name(source_name)?;
        let id = Uuid::new_v4();
        let input = self.root.join(format!("{id}-{name}"));
        let output = self.root.join(format!("{id}-{name}{OUTPUT_SUFFIX}"));

        let options = AtomicWriteOptions::new();
        #[cfg(unix)]
        let options = options.permissions(FILE_MODE);

        // The guard exists before the write so a failed rename is cleaned too.
        let mut staged = StagedFile {
            id,
            name,
            input,
            output,
            size: 0,
        };
        staged.size = atomic_write_from(&staged.input, reader, options)?;

        debug!(
            request_id = %staged.id,
            path = %staged.input.display(),
            bytes = staged.size,
            "staged input"
        );
        Ok(staged)
    }
}

fn create_private_dir(path: &Path) -> Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(DIR_MODE);
    }
    builder.create(path).map_err(|e| Error::CreateDir {
        path: path.to_path_buf(),
        source: e,
    })
}

/// A staged input and its sibling output path, owned by one request.
///
/// Both files are removed when the value is dropped, whatever the request's
/// outcome was.
#[derive(Debug)]
pub struct StagedFile {
    id: Uuid,
    name: String,
    input: PathBuf,
    output: PathBuf,
    size: u64,
}

impl StagedFile {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The sanitized form of the caller's file name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn input_path(&self) -> &Path {
        &self.input
    }

    pub fn output_path(&self) -> &Path {
        &self.output
    }

    /// Bytes written to the input file.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Read the output file into memory. `Ok(None)` when it was never
    /// produced.
    pub fn read_output(&self) -> Result<Option<Vec<u8>>> {
        match atomic_read(&self.output) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Remove both files now instead of at drop.
    pub fn cleanup(self) {
        drop(self)
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        for path in [&self.input, &self.output] {
            match remove_if_exists(path) {
                Ok(true) => {
                    debug!(request_id = %self.id, path = %path.display(), "removed staged file")
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(request_id = %self.id, error = %e, "failed to clean up staged file")
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_creates_missing_root() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("nested/work");
        let workdir = WorkDir::open(&root).unwrap();
        assert!(root.is_dir());
        assert_eq!(workdir.path(), root);
    }

    #[cfg(unix)]
    #[test]
    fn test_open_creates_private_root() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let root = dir.path().join("work");
        WorkDir::open(&root).unwrap();
        let mode = fs::metadata(&root).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, DIR_MODE);
    }

    #[test]
    fn test_stage_layout() {
        let dir = tempdir().unwrap();
        let workdir = WorkDir::open(dir.path()).unwrap();
        let staged = workdir.stage(&mut &b"payload"[..], "notes.txt").unwrap();

        let expected = format!("{}-notes.txt", staged.id());
        assert_eq!(staged.input_path(), dir.path().join(&expected));
        assert_eq!(
            staged.output_path(),
            dir.path().join(format!("{expected}{OUTPUT_SUFFIX}"))
        );
        assert_eq!(staged.name(), "notes.txt");
        assert_eq!(staged.size(), 7);
        assert_eq!(fs::read(staged.input_path()).unwrap(), b"payload");
    }

    #[test]
    fn test_stage_same_name_twice_is_distinct() {
        let dir = tempdir().unwrap();
        let workdir = WorkDir::open(dir.path()).unwrap();
        let a = workdir.stage(&mut &b"a"[..], "same.txt").unwrap();
        let b = workdir.stage(&mut &b"b"[..], "same.txt").unwrap();
        assert_ne!(a.input_path(), b.input_path());
        assert_ne!(a.output_path(), b.output_path());
    }

    #[test]
    fn test_stage_rejects_traversal_without_writing() {
        let dir = tempdir().unwrap();
        let workdir = WorkDir::open(dir.path()).unwrap();
        let err = workdir.stage(&mut &b"x"[..], "../escape.txt").unwrap_err();
        assert!(matches!(err, Error::InvalidName { .. }));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_drop_removes_input_and_output() {
        let dir = tempdir().unwrap();
        let workdir = WorkDir::open(dir.path()).unwrap();
        {
            let staged = workdir.stage(&mut &b"data"[..], "file.bin").unwrap();
            fs::write(staged.output_path(), b"out").unwrap();
            assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
        }
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_cleanup_tolerates_already_removed_files() {
        let dir = tempdir().unwrap();
        let workdir = WorkDir::open(dir.path()).unwrap();
        let staged = workdir.stage(&mut &b"data"[..], "file.bin").unwrap();
        fs::remove_file(staged.input_path()).unwrap();
        staged.cleanup();
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_read_output() {
        let dir = tempdir().unwrap();
        let workdir = WorkDir::open(dir.path()).unwrap();
        let staged = workdir.stage(&mut &b"data"[..], "file.bin").unwrap();
        assert_eq!(staged.read_output().unwrap(), None);
        fs::write(staged.output_path(), b"packed").unwrap();
        assert_eq!(staged.read_output().unwrap().as_deref(), Some(&b"packed"[..]));
    }
}
