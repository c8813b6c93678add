//! The uploads directory: name confinement, listing and removal.

use std::fs::Metadata;
use std::io;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::ErrorKind;

use crate::atomic::AtomicFile;

/// Flat directory of uploaded photos.
#[derive(Clone, Debug)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    /// Creates a store rooted at `root`; nothing is touched on disk.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Creates the root directory if it does not exist.
    pub async fn ensure_root(&self) -> io::Result<()> {
        fs::create_dir_all(&self.root).await
    }

    /// Returns the uploads directory.
    pub fn root_path(&self) -> &Path {
        &self.root
    }

    /// Maps a client-supplied filename to a direct child of the root.
    ///
    /// Only a single plain component is accepted: separators, `.`/`..` and
    /// hidden names (in-flight temp files) are rejected.
    pub fn resolve_name(&self, name: &str) -> Result<PathBuf, StorageError> {
        if name.is_empty() || name.starts_with('.') || name.contains(['/', '\\']) {
            return Err(StorageError::InvalidName);
        }
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(segment)), None) => Ok(self.root.join(segment)),
            _ => Err(StorageError::InvalidName),
        }
    }

    /// Resolves `name` and requires it to be an existing regular file.
    ///
    /// Symlinks are refused rather than followed so a link planted in the
    /// directory cannot expose files outside it.
    pub async fn resolve_existing(&self, name: &str) -> Result<(PathBuf, Metadata), StorageError> {
        let target = self.resolve_name(name)?;
        let metadata = fs::symlink_metadata(&target).await?;
        if metadata.file_type().is_symlink() {
            return Err(StorageError::InvalidName);
        }
        if !metadata.is_file() {
            return Err(StorageError::Io(io::Error::from(ErrorKind::NotFound)));
        }
        Ok((target, metadata))
    }

    /// Lists uploaded filenames, sorted so positions are stable for a given
    /// directory state.
    pub async fn list_files(&self) -> Result<Vec<String>, StorageError> {
        let mut dir = fs::read_dir(&self.root).await?;
        let mut names = Vec::new();

        while let Some(entry) = dir.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') {
                continue;
            }
            // Races with a concurrent delete are skipped, not reported.
            let file_type = match entry.file_type().await {
                Ok(file_type) => file_type,
                Err(err) if err.kind() == ErrorKind::NotFound => continue,
                Err(err) => return Err(StorageError::Io(err)),
            };
            if file_type.is_file() {
                names.push(name);
            }
        }

        names.sort();
        Ok(names)
    }

    /// Opens a temp file that becomes `name` on [`AtomicFile::finalize`].
    pub async fn create(&self, name: &str) -> Result<AtomicFile, StorageError> {
        let target = self.resolve_name(name)?;
        Ok(AtomicFile::new(&target).await?)
    }

    /// Removes an existing regular file by name.
    pub async fn delete(&self, name: &str) -> Result<(), StorageError> {
        let (target, _) = self.resolve_existing(name).await?;
        fs::remove_file(target).await?;
        Ok(())
    }
}

/// Errors raised by [`UploadStore`].
#[derive(Debug)]
pub enum StorageError {
    InvalidName,
    Io(io::Error),
}

impl From<io::Error> for StorageError {
    fn from(err: io::Error) -> Self {
        StorageError::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::{StorageError, UploadStore};
    use std::io::ErrorKind;
    use tempfile::tempdir;
    use tokio::io::AsyncWriteExt;

    fn make_store() -> (tempfile::TempDir, UploadStore) {
        let temp = tempdir().expect("tempdir");
        let root = temp.path().join("uploads");
        std::fs::create_dir_all(&root).expect("create uploads");
        (temp, UploadStore::new(root))
    }

    #[test]
    fn resolve_name_rejects_traversal() {
        let (_temp, store) = make_store();
        for name in ["..", "../secret.txt", "a/b.png", "a\\b.png", ".", "", ".hidden"] {
            assert!(
                matches!(store.resolve_name(name), Err(StorageError::InvalidName)),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn resolve_name_accepts_plain_file() {
        let (_temp, store) = make_store();
        let path = store.resolve_name("photo_1.png").expect("resolve");
        assert_eq!(path, store.root_path().join("photo_1.png"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn resolve_existing_rejects_symlink() {
        use std::os::unix::fs::symlink;

        let (temp, store) = make_store();
        let outside = temp.path().join("outside.txt");
        std::fs::write(&outside, b"secret").expect("write outside file");
        symlink(&outside, store.root_path().join("link")).expect("symlink");

        let result = store.resolve_existing("link").await;
        assert!(matches!(result, Err(StorageError::InvalidName)));
    }

    #[tokio::test]
    async fn resolve_existing_treats_directory_as_missing() {
        let (_temp, store) = make_store();
        std::fs::create_dir(store.root_path().join("nested")).expect("mkdir");
        let result = store.resolve_existing("nested").await;
        assert!(matches!(result, Err(StorageError::Io(err)) if err.kind() == ErrorKind::NotFound));
    }

    #[tokio::test]
    async fn list_files_is_sorted_and_skips_hidden_and_dirs() {
        let (_temp, store) = make_store();
        let root = store.root_path();
        std::fs::write(root.join("photo_2.png"), b"b").expect("write");
        std::fs::write(root.join("photo_1.jpg"), b"a").expect("write");
        std::fs::write(root.join(".photo_3.png.tmp.x"), b"c").expect("write");
        std::fs::create_dir(root.join("nested")).expect("mkdir");

        let names = store.list_files().await.expect("list");
        assert_eq!(names, vec!["photo_1.jpg", "photo_2.png"]);
    }

    #[tokio::test]
    async fn list_files_fails_when_root_missing() {
        let temp = tempdir().expect("tempdir");
        let store = UploadStore::new(temp.path().join("absent"));
        assert!(matches!(store.list_files().await, Err(StorageError::Io(_))));
    }

    #[tokio::test]
    async fn create_then_delete() {
        let (_temp, store) = make_store();
        let mut file = store.create("photo_9.png").await.expect("create");
        file.file_mut().write_all(b"pixels").await.expect("write");
        file.finalize().await.expect("finalize");
        assert_eq!(
            std::fs::read(store.root_path().join("photo_9.png")).expect("read"),
            b"pixels"
        );

        store.delete("photo_9.png").await.expect("delete");
        let again = store.delete("photo_9.png").await;
        assert!(matches!(again, Err(StorageError::Io(err)) if err.kind() == ErrorKind::NotFound));
    }
}
