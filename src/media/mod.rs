mod imagekit;
mod local;
pub mod scratch;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{Config, MediaProvider};

pub use self::imagekit::ImageKitMediaHost;
pub use self::local::LocalMediaHost;

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("media host rejected upload ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("invalid media host response: {0}")]
    InvalidResponse(String),
}

/// Where the media host put a blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMedia {
    /// Public URL clients fetch the blob from
    pub url: String,
    /// Host-side path of the blob, e.g. `/posts/cat_x1Y2.png`
    pub file_path: String,
}

impl StoredMedia {
    /// The name the host stored the blob under: the last segment of `file_path`.
    pub fn stored_name(&self) -> &str {
        self.file_path
            .rsplit('/')
            .next()
            .unwrap_or(self.file_path.as_str())
    }
}

/// Stores an uploaded file and reports where it can be fetched.
#[async_trait]
pub trait MediaHost: Send + Sync {
    async fn store(&self, file: &Path, file_name: &str) -> Result<StoredMedia, MediaError>;
}

pub type DynMediaHost = Arc<dyn MediaHost>;

pub fn from_config(config: &Config) -> Result<DynMediaHost, MediaError> {
    match config.media.provider {
        MediaProvider::Local => Ok(Arc::new(LocalMediaHost::new(
            config.local_media_path(),
            config.local_public_url(),
        ))),
        MediaProvider::Imagekit => Ok(Arc::new(ImageKitMediaHost::new(&config.media.imagekit)?)),
    }
}

/// Reduce a client-supplied filename to a safe single path segment.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(name);
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
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(path: &str) -> StoredMedia {
        StoredMedia {
            url: "https://cdn/x".into(),
            file_path: path.into(),
        }
    }

    #[test]
    fn stored_name_is_last_path_segment() {
        assert_eq!(stored("/posts/2026/cat_x1Y2.png").stored_name(), "cat_x1Y2.png");
        assert_eq!(stored("/cat.png").stored_name(), "cat.png");
        assert_eq!(stored("cat.png").stored_name(), "cat.png");
    }

    #[test]
    fn sanitize_keeps_plain_names() {
        assert_eq!(sanitize_file_name("cat.png"), "cat.png");
        assert_eq!(sanitize_file_name("my-video_01.mp4"), "my-video_01.mp4");
    }

    #[test]
    fn sanitize_strips_directories_and_odd_characters() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\photos\\me.jpg"), "me.jpg");
        assert_eq!(sanitize_file_name("hello world!.png"), "hello_world_.png");
        assert_eq!(sanitize_file_name(".hidden"), "hidden");
        assert_eq!(sanitize_file_name(""), "upload");
        assert_eq!(sanitize_file_name(".."), "upload");
    }

    #[test]
    fn from_config_builds_local_host_by_default() {
        let config = Config::default();
        assert!(from_config(&config).is_ok());
    }
}
