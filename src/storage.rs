use std::path::{Component, Path, PathBuf};

use anyhow::Context;
use axum::async_trait;
use bytes::Bytes;

/// URL prefix under which stored uploads are served.
pub const PUBLIC_PREFIX: &str = "/uploads";

#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn put_object(&self, key: &str, body: Bytes) -> anyhow::Result<()>;
    async fn delete_object(&self, key: &str) -> anyhow::Result<()>;
    fn public_url(&self, key: &str) -> String;
}

/// Uploads kept on the local filesystem under `root`.
#[derive(Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub async fn new(root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .with_context(|| format!("create upload dir {}", root.display()))?;
        Ok(Self { root })
    }

    fn resolve(&self, key: &str) -> anyhow::Result<PathBuf> {
        let rel = Path::new(key);
        let clean = rel
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        anyhow::ensure!(clean && !key.is_empty(), "invalid object key {:?}", key);
        Ok(self.root.join(rel))
    }
}

#[async_trait]
impl StorageClient for LocalStorage {
    async fn put_object(&self, key: &str, body: Bytes) -> anyhow::Result<()> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create dir {}", parent.display()))?;
        }
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        let path = self.resolve(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("remove {}", path.display())),
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", PUBLIC_PREFIX, key)
    }
}

/// Per-user object key for a new upload.
pub fn upload_key(user_id: i64, content_type: Option<&str>, file_name: &str) -> String {
    let ext = content_type
        .and_then(ext_from_mime)
        .or_else(|| ext_from_file_name(file_name))
        .unwrap_or("bin");
    format!("{}/{}.{}", user_id, uuid::Uuid::new_v4(), ext)
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/bmp" => Some("bmp"),
        _ => None,
    }
}

fn ext_from_file_name(name: &str) -> Option<&'static str> {
    let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("jpg"),
        "png" => Some("png"),
        "bmp" => Some("bmp"),
        _ => None,
    }
}
