//! Scoped writes: every artifact is written next to its destination under a
//! `.part` name and renamed into place only once it is complete.

use std::fs;
use std::path::{Path, PathBuf};
use lopdf::Document;
use crate::error::{Error, Result};

fn part_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}

fn access_error(path: &Path, source: std::io::Error) -> Error {
    Error::FileAccess {
        path: path.to_path_buf(),
        source,
    }
}

/// Write `bytes` to `path` so that `path` either holds all of them or is untouched
pub fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let part = part_path(path);

    if let Err(source) = fs::write(&part, bytes) {
        let _ = fs::remove_file(&part);
        return Err(access_error(path, source));
    }

    fs::rename(&part, path).map_err(|source| {
        let _ = fs::remove_file(&part);
        access_error(path, source)
    })
}

/// Copy `from` to `to` through a `.part` file
pub fn copy_atomically(from: &Path, to: &Path) -> Result<()> {
    let bytes = fs::read(from).map_err(|source| access_error(from, source))?;
    write_atomically(to, &bytes)
}

/// Drop unreachable objects, compress streams and write the document
///
/// Returns the number of bytes written.
pub fn save_document(doc: &mut Document, path: &Path) -> Result<usize> {
    doc.prune_objects();
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)?;

    write_atomically(path, &buffer)?;
    Ok(buffer.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_path() {
        assert_eq!(part_path(Path::new("out/a.pdf")), PathBuf::from("out/a.pdf.part"));
    }

    #[test]
    fn test_write_atomically_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.pdf");

        write_atomically(&path, b"first").unwrap();
        write_atomically(&path, b"second").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"second");
        assert!(!part_path(&path).exists());
    }

    #[test]
    fn test_write_into_missing_directory_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("a.pdf");

        let err = write_atomically(&path, b"data").unwrap_err();
        assert!(matches!(err, Error::FileAccess { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_copy_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("from.pdf");
        let to = dir.path().join("to.pdf");
        fs::write(&from, b"%PDF-1.5").unwrap();

        copy_atomically(&from, &to).unwrap();
        assert_eq!(fs::read(&to).unwrap(), b"%PDF-1.5");
    }
}
