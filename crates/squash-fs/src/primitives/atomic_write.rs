use crate::{Error, Result};
use std::fs;
use std::io::{self, BufWriter, Read};
use std::path::Path;

#[derive(Clone, Copy, Debug, Default)]
pub struct AtomicWriteOptions {
    pub permissions: Option<u32>,
    pub sync: bool,
}

impl AtomicWriteOptions {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn permissions(mut self, mode: u32) -> Self {
        self.permissions = Some(mode);
        self
    }
    pub fn sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }
}

/// Stream `reader` into a hidden sibling of `path`, then rename it into place.
///
/// Readers of `path` never observe a partially written file. Returns the
/// number of bytes written.
pub fn atomic_write_from(
    path: impl AsRef<Path>,
    reader: &mut dyn Read,
    options: AtomicWriteOptions,
) -> Result<u64> {
    let path = path.as_ref();
    let parent = path.parent().ok_or_else(|| Error::Write {
        path: path.to_path_buf(),
        source: io::Error::other("no parent directory"),
    })?;

    let tmp_path = parent.join(format!(".tmp.{}.squash", uuid::Uuid::new_v4()));

    let written = write_tmp(&tmp_path, reader, options).inspect_err(|_| {
        let _ = fs::remove_file(&tmp_path);
    })?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        Error::Write {
            path: path.to_path_buf(),
            source: e,
        }
    })?;

    Ok(written)
}

fn write_tmp(tmp_path: &Path, reader: &mut dyn Read, options: AtomicWriteOptions) -> Result<u64> {
    let wrap = |e: io::Error| Error::Write {
        path: tmp_path.to_path_buf(),
        source: e,
    };

    let file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(tmp_path)
        .map_err(wrap)?;

    let mut writer = BufWriter::new(file);
    let written = io::copy(reader, &mut writer).map_err(wrap)?;
    let file = writer.into_inner().map_err(|e| wrap(e.into_error()))?;

    #[cfg(unix)]
    if let Some(mode) = options.permissions {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(tmp_path, fs::Permissions::from_mode(mode)).map_err(wrap)?;
    }

    if options.sync {
        file.sync_all().map_err(wrap)?;
    }

    Ok(written)
}

pub fn atomic_read(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    fs::read(path).map_err(|e| Error::Read {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Remove a file, treating an already-missing file as success.
///
/// Returns whether a file was actually removed.
pub fn remove_if_exists(path: impl AsRef<Path>) -> Result<bool> {
    let path = path.as_ref();
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::Remove {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_atomic_write_from() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.txt");
        let written =
            atomic_write_from(&path, &mut &b"hello world"[..], AtomicWriteOptions::new()).unwrap();
        assert_eq!(written, 11);
        assert_eq!(fs::read(&path).unwrap(), b"hello world");
    }

    #[test]
    fn test_atomic_write_empty_input() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.bin");
        let written =
            atomic_write_from(&path, &mut io::empty(), AtomicWriteOptions::new()).unwrap();
        assert_eq!(written, 0);
        assert!(path.exists());
        assert!(fs::read(&path).unwrap().is_empty());
    }

    #[test]
    fn test_atomic_write_leaves_no_tmp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.bin");
        atomic_write_from(&path, &mut &[7u8; 4096][..], AtomicWriteOptions::new().sync(true))
            .unwrap();
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("data.bin")]);
    }

    #[test]
    fn test_atomic_write_failing_reader_cleans_up() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::other("upload interrupted"))
            }
        }

        let dir = tempdir().unwrap();
        let path = dir.path().join("data.bin");
        let result = atomic_write_from(&path, &mut Broken, AtomicWriteOptions::new());
        assert!(matches!(result, Err(Error::Write { .. })));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_atomic_write_with_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("test.txt");
        atomic_write_from(&path, &mut &b"data"[..], AtomicWriteOptions::new().permissions(0o600))
            .unwrap();
        let metadata = fs::metadata(&path).unwrap();
        assert_eq!(metadata.permissions().mode() & 0o777, 0o600);
    }

    #[test]
    fn test_remove_if_exists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gone.txt");
        fs::write(&path, "x").unwrap();
        assert!(remove_if_exists(&path).unwrap());
        assert!(!remove_if_exists(&path).unwrap());
    }

    #[test]
    fn test_atomic_read_missing() {
        let dir = tempdir().unwrap();
        let err = atomic_read(dir.path().join("missing")).unwrap_err();
        assert!(err.is_not_found());
    }
}
