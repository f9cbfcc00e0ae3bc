use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

pub fn absolute_path(path: PathBuf) -> crate::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(get_current_dir()?.join(path))
    }
}

pub fn get_current_dir() -> crate::Result<PathBuf> {
    Ok(std::env::current_dir()?)
}

/// Writes `content` into a temporary file next to `path` and then renames it over `path`,
/// so that readers never observe a partially written file.
pub fn write_atomically(path: &Path, content: &[u8]) -> crate::Result<()> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(directory)?;
    file.write_all(content)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::write_atomically;
    use tempfile::TempDir;

    #[test]
    fn test_write_atomically_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("record");
        write_atomically(&path, b"first").unwrap();
        write_atomically(&path, b"second").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
