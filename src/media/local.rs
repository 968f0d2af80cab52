use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{sanitize_file_name, MediaError, MediaHost, StoredMedia};

/// Keeps blobs in a flat directory served back under `/media`.
pub struct LocalMediaHost {
    root: PathBuf,
    public_url: String,
}

impl LocalMediaHost {
    pub fn new(root: PathBuf, public_url: String) -> Self {
        Self {
            root,
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl MediaHost for LocalMediaHost {
    async fn store(&self, file: &Path, file_name: &str) -> Result<StoredMedia, MediaError> {
        tokio::fs::create_dir_all(&self.root).await?;

        let stored_name = format!(
            "{}-{}",
            uuid::Uuid::now_v7().simple(),
            sanitize_file_name(file_name)
        );
        tokio::fs::copy(file, self.root.join(&stored_name)).await?;

        tracing::debug!(%stored_name, "Stored media locally");
        Ok(StoredMedia {
            url: format!("{}/media/{}", self.public_url, stored_name),
            file_path: format!("/{stored_name}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn store_copies_file_under_unique_name() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("source.bin");
        std::fs::write(&source, b"pixels").unwrap();

        let host = LocalMediaHost::new(tmp.path().join("media"), "http://localhost:8000/".into());
        let first = host.store(&source, "cat.png").await.unwrap();
        let second = host.store(&source, "cat.png").await.unwrap();

        assert_ne!(first.stored_name(), second.stored_name());
        assert!(first.stored_name().ends_with("-cat.png"));
        assert_eq!(
            first.url,
            format!("http://localhost:8000/media/{}", first.stored_name())
        );

        let copied = std::fs::read(host.root().join(first.stored_name())).unwrap();
        assert_eq!(copied, b"pixels");
        // the source is left for the caller to clean up
        assert!(source.exists());
    }

    #[tokio::test]
    async fn store_missing_source_fails() {
        let tmp = TempDir::new().unwrap();
        let host = LocalMediaHost::new(tmp.path().join("media"), "http://localhost".into());
        let result = host.store(&tmp.path().join("absent"), "a.png").await;
        assert!(matches!(result, Err(MediaError::Io(_))));
    }
}
