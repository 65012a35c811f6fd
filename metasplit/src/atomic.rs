//! All-or-nothing output files.
//!
//! The extractor writes to a sibling temp file which is renamed over the
//! destination only once extraction succeeded.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Generate a temp path next to `final_path`.
/// Format: {dir}/.tmp.{random}.{filename}
pub fn temp_path(final_path: &Path) -> PathBuf {
    let filename = final_path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let random: u64 = rand::random();
    let temp_name = format!(".tmp.{:016x}.{}", random, filename);
    final_path.with_file_name(temp_name)
}

/// Rename a finished temp file over `final_path`.
pub fn persist(temp_path: &Path, final_path: &Path) -> io::Result<()> {
    fs::rename(temp_path, final_path).inspect_err(|_| discard(temp_path))
}

/// Remove a temp file left by a failed write, if any.
pub fn discard(temp_path: &Path) {
    let _ = fs::remove_file(temp_path);
}

/// Produce `final_path` through `write`, which receives the temp path.
///
/// On error the temp file is removed and `final_path` is left untouched.
pub fn write_with<E, F>(final_path: &Path, write: F) -> Result<(), E>
where
    F: FnOnce(&Path) -> Result<(), E>,
    E: From<io::Error>,
{
    let temp = temp_path(final_path);
    match write(&temp) {
        Ok(()) => Ok(persist(&temp, final_path)?),
        Err(e) => {
            discard(&temp);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_files(dir: &Path) -> Vec<PathBuf> {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_str().unwrap_or("").starts_with(".tmp."))
            .map(|e| e.path())
            .collect()
    }

    #[test]
    fn test_temp_path() {
        let final_path = Path::new("/tmp/test/out.csv");
        let temp = temp_path(final_path);

        // Temp path should be in same directory
        assert_eq!(temp.parent(), final_path.parent());

        let filename = temp.file_name().unwrap().to_str().unwrap();
        assert!(filename.starts_with(".tmp."));
        assert!(filename.ends_with(".out.csv"));
    }

    #[test]
    fn test_write_with_success() {
        let tmp = TempDir::new().unwrap();
        let final_path = tmp.path().join("out.csv");

        let result: io::Result<()> = write_with(&final_path, |temp| fs::write(temp, b"a,b\n"));
        assert!(result.is_ok());

        assert_eq!(fs::read(&final_path).unwrap(), b"a,b\n");
        assert!(temp_files(tmp.path()).is_empty(), "No temp files should remain");
    }

    #[test]
    fn test_write_with_overwrites() {
        let tmp = TempDir::new().unwrap();
        let final_path = tmp.path().join("out.csv");
        fs::write(&final_path, b"old").unwrap();

        let result: io::Result<()> = write_with(&final_path, |temp| fs::write(temp, b"new"));
        assert!(result.is_ok());
        assert_eq!(fs::read(&final_path).unwrap(), b"new");
    }

    #[test]
    fn test_write_with_failure_leaves_nothing() {
        let tmp = TempDir::new().unwrap();
        let final_path = tmp.path().join("out.csv");

        let result: io::Result<()> = write_with(&final_path, |temp| {
            fs::write(temp, b"partial")?;
            Err(io::Error::new(io::ErrorKind::Other, "extraction failed"))
        });

        assert!(result.is_err());
        assert!(!final_path.exists());
        assert!(temp_files(tmp.path()).is_empty(), "No temp files should remain");
    }
}
