// Temporary file guard

use std::path::{Path, PathBuf};

/// Deletes the files it tracks when dropped, on every exit path of a job.
#[derive(Debug, Default)]
pub struct TempFiles {
    paths: Vec<PathBuf>,
}

impl TempFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, path: impl Into<PathBuf>) {
        self.paths.push(path.into());
    }
}

impl Drop for TempFiles {
    fn drop(&mut self) {
        for path in &self.paths {
            remove_quietly(path);
        }
    }
}

fn remove_quietly(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => log::debug!("Removed temp file {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("Failed to remove temp file {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_removes_existing_and_ignores_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let present = tmp.path().join("in.mp4");
        std::fs::write(&present, b"x").unwrap();
        let missing = tmp.path().join("never-written.mp4");

        {
            let mut guard = TempFiles::new();
            guard.track(&present);
            guard.track(&missing);
        }

        assert!(!present.exists());
    }
}
