use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::NamedTempFile;
use tokio::time::timeout;

/// Upper bound for a single blocking write + rename
const BLOCKING_WRITE_TIMEOUT: Duration = Duration::from_secs(30);

/// Write `content` to `path` atomically.
///
/// The bytes go to a temp file in the target's own directory, which is then
/// renamed over `path`. Readers see either the old file or the new one, never
/// a torn write.
pub async fn write_atomic(path: &Path, content: Vec<u8>) -> io::Result<()> {
    let target: PathBuf = path.to_path_buf();
    let parent = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let blocking_task = tokio::task::spawn_blocking(move || -> io::Result<()> {
        let mut temp_file = NamedTempFile::new_in(&parent)?;
        temp_file.write_all(&content)?;
        temp_file.as_file().sync_all()?;
        temp_file.persist(&target).map_err(|e| e.error)?;
        Ok(())
    });

    match timeout(BLOCKING_WRITE_TIMEOUT, blocking_task).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => Err(io::Error::other(format!("blocking write task panicked: {e}"))),
        Err(_) => {
            log::warn!(
                "Blocking write timeout for {} after {:?}",
                path.display(),
                BLOCKING_WRITE_TIMEOUT
            );
            Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("write to {} timed out", path.display()),
            ))
        }
    }
}
