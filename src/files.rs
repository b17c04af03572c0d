//! Attachment storage seam and the extension allow-list
//!
//! The lifecycle only records filenames; bytes go through a [`FileStore`].

use crate::config::AttachmentSettings;
use crate::core::AttachmentKind;
use crate::error::{HelpdeskError, Result};
use std::fs;
use std::path::PathBuf;

/// Stores and retrieves uploaded attachment bytes by filename
#[cfg_attr(test, mockall::automock)]
pub trait FileStore: Send + Sync {
    fn store(&self, filename: &str, bytes: &[u8]) -> Result<()>;

    fn load(&self, filename: &str) -> Result<Vec<u8>>;

    /// Delete a stored file; a missing file is not an error
    fn remove(&self, filename: &str) -> Result<()>;
}

/// File store rooted at a local directory
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, filename: &str) -> Result<PathBuf> {
        let safe = secure_filename(filename);
        if safe.is_empty() || safe != filename {
            return Err(HelpdeskError::validation(format!("Unsafe attachment filename: {filename}")));
        }
        Ok(self.root.join(safe))
    }
}

impl FileStore for LocalFileStore {
    fn store(&self, filename: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(filename)?;
        fs::create_dir_all(&self.root)
            .and_then(|()| fs::write(&path, bytes))
            .map_err(|e| HelpdeskError::TransientDependency(format!("Failed to store {filename}: {e}")))
    }

    fn load(&self, filename: &str) -> Result<Vec<u8>> {
        let path = self.path_for(filename)?;
        if !path.exists() {
            return Err(HelpdeskError::not_found("Attachment", filename));
        }
        fs::read(&path)
            .map_err(|e| HelpdeskError::TransientDependency(format!("Failed to read {filename}: {e}")))
    }

    fn remove(&self, filename: &str) -> Result<()> {
        let path = self.path_for(filename)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(HelpdeskError::TransientDependency(format!("Failed to remove {filename}: {e}"))),
        }
    }
}

/// Reduce a client-supplied filename to a safe, flat ASCII name
#[must_use]
pub fn secure_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();
    cleaned.trim_start_matches(['.', '_']).to_string()
}

/// Lowercased extension of a filename, if it has one
#[must_use]
pub fn extension(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .filter(|ext| !ext.is_empty())
}

/// Decides which uploads are accepted and which render as images
#[derive(Debug, Clone)]
pub struct AttachmentPolicy {
    allowed: Vec<String>,
    images: Vec<String>,
}

impl AttachmentPolicy {
    #[must_use]
    pub fn from_settings(settings: &AttachmentSettings) -> Self {
        let lower = |v: &[String]| v.iter().map(|e| e.trim_start_matches('.').to_lowercase()).collect();
        Self {
            allowed: lower(&settings.allowed_extensions),
            images: lower(&settings.image_extensions),
        }
    }

    #[must_use]
    pub fn is_allowed(&self, filename: &str) -> bool {
        extension(filename).is_some_and(|ext| self.allowed.contains(&ext))
    }

    #[must_use]
    pub fn kind_of(&self, filename: &str) -> AttachmentKind {
        match extension(filename) {
            Some(ext) if self.images.contains(&ext) => AttachmentKind::Image,
            _ => AttachmentKind::Document,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_secure_filename() {
        assert_eq!(secure_filename("../../etc/passwd"), "passwd");
        assert_eq!(secure_filename("C:\\Users\\me\\My Screen.png"), "My_Screen.png");
        assert_eq!(secure_filename(".hidden"), "hidden");
        assert_eq!(secure_filename("résumé.pdf"), "rsum.pdf");
    }

    #[test]
    fn test_policy_allow_list() {
        let policy = AttachmentPolicy::from_settings(&AttachmentSettings::default());
        assert!(policy.is_allowed("screen.PNG"));
        assert!(policy.is_allowed("report.xlsx"));
        assert!(!policy.is_allowed("installer.exe"));
        assert!(!policy.is_allowed("README"));

        assert_eq!(policy.kind_of("photo.jpeg"), AttachmentKind::Image);
        assert_eq!(policy.kind_of("notes.pdf"), AttachmentKind::Document);
    }

    #[test]
    fn test_local_file_store_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalFileStore::new(temp_dir.path().join("uploads"));

        store.store("20240101_090000_log.txt", b"paper jam").unwrap();
        assert_eq!(store.load("20240101_090000_log.txt").unwrap(), b"paper jam");

        assert!(matches!(
            store.load("missing.txt"),
            Err(HelpdeskError::NotFound { .. })
        ));
        assert!(store.store("../escape.txt", b"x").is_err());
    }

    #[test]
    fn test_local_file_store_remove() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalFileStore::new(temp_dir.path().join("uploads"));

        store.store("20240101_090000_log.txt", b"paper jam").unwrap();
        store.remove("20240101_090000_log.txt").unwrap();
        assert!(matches!(
            store.load("20240101_090000_log.txt"),
            Err(HelpdeskError::NotFound { .. })
        ));

        store.remove("20240101_090000_log.txt").unwrap();
        assert!(store.remove("../escape.txt").is_err());
    }
}
