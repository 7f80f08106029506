use crate::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Writes `content` to `dir/file_name` through a `.part` file, so the target
/// either holds the full export or doesn't exist.
pub fn write_atomically(dir: &Path, file_name: &str, content: &[u8]) -> Result<PathBuf> {
    let target = dir.join(file_name);
    let part = dir.join(format!("{file_name}.part"));
    let res = fs::write(&part, content).and_then(|_| fs::rename(&part, &target));
    if let Err(e) = res {
        if part.exists() {
            if let Err(e) = fs::remove_file(&part) {
                warn!(path = %part.display(), error = %e, "Failed to remove partial export");
            }
        }
        return Err(Error::ExportFailed(format!("{}: {e}", target.display())));
    }
    Ok(target)
}

#[cfg(test)]
mod test {
    use super::write_atomically;
    use crate::{Error, Result};
    use std::fs;
    use std::path::PathBuf;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("routesync-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn writes_full_file() -> Result<()> {
        let dir = temp_dir("write");
        let path = write_atomically(&dir, "Vehicle_7(2024-05-01).csv", b"a,b\n1,2\n")?;
        assert_eq!(dir.join("Vehicle_7(2024-05-01).csv"), path);
        assert_eq!("a,b\n1,2\n", fs::read_to_string(&path)?);
        assert!(!dir.join("Vehicle_7(2024-05-01).csv.part").exists());
        fs::remove_dir_all(&dir)?;
        Ok(())
    }

    #[test]
    fn missing_dir_leaves_nothing() {
        let dir = temp_dir("missing").join("nope");
        let res = write_atomically(&dir, "x.csv", b"x");
        assert!(matches!(res, Err(Error::ExportFailed(_))));
        assert!(!dir.join("x.csv").exists());
        assert!(!dir.join("x.csv.part").exists());
    }
}
