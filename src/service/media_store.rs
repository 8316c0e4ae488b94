use std::path::{Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

/// Where uploaded deliverable media ends up.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Returns the public URL of the stored file.
    async fn store(&self, file_name: &str, bytes: &[u8]) -> Result<String, std::io::Error>;

    /// Deletes a file previously returned by `store`. Missing files are not an error.
    async fn remove(&self, url: &str) -> Result<(), std::io::Error>;
}

#[derive(Debug, Clone)]
pub struct LocalMediaStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalMediaStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Keeps ASCII alphanumerics, `.`, `-` and `_`; everything else becomes `_`.
pub fn sanitize_file_name(file_name: &str) -> String {
    let base = Path::new(file_name)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("upload");

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn store(&self, file_name: &str, bytes: &[u8]) -> Result<String, std::io::Error> {
        if bytes.is_empty() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is empty", file_name),
            ));
        }

        tokio::fs::create_dir_all(&self.root).await?;

        let stored_name = format!("{}-{}", Uuid::new_v4(), sanitize_file_name(file_name));
        tokio::fs::write(self.root.join(&stored_name), bytes).await?;

        tracing::debug!("Stored media {} ({} bytes)", stored_name, bytes.len());
        Ok(format!("{}/{}", self.public_base_url, stored_name))
    }

    async fn remove(&self, url: &str) -> Result<(), std::io::Error> {
        let stored_name = url
            .strip_prefix(&self.public_base_url)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|name| sanitize_file_name(name) == *name)
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("{} is not a stored media URL", url),
                )
            })?;

        match tokio::fs::remove_file(self.root.join(stored_name)).await {
            Ok(()) => {
                tracing::debug!("Removed media {}", stored_name);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}
