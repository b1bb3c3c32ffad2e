//! File-system loader for local resource directories.

use std::path::{Component, Path, PathBuf};

use cogtask_core::error::LoadError;
use cogtask_core::traits::ResourceLoader;

/// A resource loader that serves references relative to a base directory.
///
/// References are bundle-relative paths of the form `{bundle}/{name}`, laid
/// out as subdirectories under the base. References that would escape the
/// base directory are treated as not found.
pub struct FileSystemLoader {
    base_dir: PathBuf,
}

impl FileSystemLoader {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// The on-disk path for a reference, or `None` when the reference is
    /// absolute or contains traversal components.
    fn path_for(&self, reference: &str) -> Option<PathBuf> {
        let relative = Path::new(reference);
        if relative.is_absolute() {
            return None;
        }
        if !relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
        {
            return None;
        }
        Some(self.base_dir.join(relative))
    }
}

impl ResourceLoader for FileSystemLoader {
    fn name(&self) -> &str {
        "files"
    }

    fn load(&self, reference: &str) -> Result<Vec<u8>, LoadError> {
        let Some(path) = self.path_for(reference) else {
            return Err(LoadError::NotFound(reference.to_string()));
        };
        tracing::trace!("loading `{reference}` from {}", path.display());

        match std::fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(LoadError::NotFound(reference.to_string()))
            }
            Err(e) => Err(LoadError::Read {
                reference: reference.to_string(),
                message: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("main")).unwrap();
        std::fs::write(dir.path().join("main").join("logo.png"), b"png bytes").unwrap();
        dir
    }

    #[test]
    fn serves_files_under_the_base_dir() {
        let dir = resource_dir();
        let loader = FileSystemLoader::new(dir.path());

        assert_eq!(loader.load("main/logo.png").unwrap(), b"png bytes");
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = resource_dir();
        let loader = FileSystemLoader::new(dir.path());

        let err = loader.load("main/missing.png").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn escaping_references_are_rejected() {
        let dir = resource_dir();
        let loader = FileSystemLoader::new(dir.path().join("main"));

        assert!(loader.load("../main/logo.png").unwrap_err().is_not_found());
        assert!(loader.load("/etc/hostname").unwrap_err().is_not_found());
    }
}
