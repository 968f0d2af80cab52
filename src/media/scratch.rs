use std::io::Write;
use std::path::Path;

use bytes::Bytes;
use tempfile::TempPath;

/// Stage an upload on disk. The returned path deletes the file when dropped,
/// whichever way the request ends.
pub async fn stage(dir: &Path, original_name: &str, data: Bytes) -> std::io::Result<TempPath> {
    let dir = dir.to_path_buf();
    let suffix = Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();

    tokio::task::spawn_blocking(move || -> std::io::Result<TempPath> {
        std::fs::create_dir_all(&dir)?;
        let mut file = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(&suffix)
            .tempfile_in(&dir)?;
        file.write_all(&data)?;
        file.flush()?;
        Ok(file.into_temp_path())
    })
    .await
    .map_err(std::io::Error::other)?
}
