use std::path::PathBuf;

use anyhow::Result;
use tokio::fs;
use tracing::{info, warn};
use uuid::Uuid;

/// Extensions accepted for publication images.
const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

/// On-disk storage for uploaded publication images. Each upload is stored
/// flat under the storage dir as `{uuid}.{ext}`; the generated name is what
/// gets persisted on the publication row and used in image URLs.
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    pub async fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Image storage directory: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub fn extension_allowed(name: &str) -> bool {
        extension(name)
            .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false)
    }

    /// Persist an upload under a generated name, keeping the original
    /// extension (lowercased) so the whitelist check and content-type
    /// negotiation see the same thing.
    pub async fn save(&self, original_name: &str, data: &[u8]) -> Result<String> {
        let name = match extension(original_name) {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };
        fs::write(self.path_for(&name), data).await?;
        Ok(name)
    }

    pub async fn delete(&self, name: &str) -> Result<()> {
        match fs::remove_file(self.path_for(name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("image {} already gone", name);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Read a stored image. Returns None when absent; names that try to
    /// escape the storage dir are treated as absent.
    pub async fn read(&self, name: &str) -> Result<Option<Vec<u8>>> {
        if name.contains('/') || name.contains('\\') || name.contains("..") {
            warn!("rejected image name {:?}", name);
            return Ok(None);
        }
        match fs::read(self.path_for(name)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn content_type(name: &str) -> &'static str {
        match extension(name).as_deref() {
            Some("png") => "image/png",
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("gif") => "image/gif",
            _ => "application/octet-stream",
        }
    }
}

fn extension(name: &str) -> Option<String> {
    name.rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_storage_dir() -> PathBuf {
        std::env::temp_dir().join(format!("mingle-storage-test-{}", Uuid::new_v4()))
    }

    #[test]
    fn extension_whitelist() {
        assert!(Storage::extension_allowed("photo.png"));
        assert!(Storage::extension_allowed("photo.JPEG"));
        assert!(Storage::extension_allowed("photo.jpg"));
        assert!(Storage::extension_allowed("anim.gif"));
        assert!(!Storage::extension_allowed("malware.exe"));
        assert!(!Storage::extension_allowed("archive.tar.bz2"));
        assert!(!Storage::extension_allowed("no-extension"));
    }

    #[test]
    fn content_types() {
        assert_eq!(Storage::content_type("a.png"), "image/png");
        assert_eq!(Storage::content_type("a.JPG"), "image/jpeg");
        assert_eq!(Storage::content_type("weird"), "application/octet-stream");
    }

    #[tokio::test]
    async fn save_read_delete_roundtrip() {
        let storage = Storage::new(temp_storage_dir()).await.unwrap();

        let name = storage.save("selfie.PNG", b"fake png bytes").await.unwrap();
        assert!(name.ends_with(".png"));

        let bytes = storage.read(&name).await.unwrap().unwrap();
        assert_eq!(bytes, b"fake png bytes");

        storage.delete(&name).await.unwrap();
        assert!(storage.read(&name).await.unwrap().is_none());
        // Deleting again is fine
        storage.delete(&name).await.unwrap();
    }

    #[tokio::test]
    async fn read_rejects_escaping_names() {
        let storage = Storage::new(temp_storage_dir()).await.unwrap();
        assert!(storage.read("../etc/passwd").await.unwrap().is_none());
        assert!(storage.read("a/b.png").await.unwrap().is_none());
    }
}
