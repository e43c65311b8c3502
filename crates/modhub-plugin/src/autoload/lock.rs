//! Exclusive access to the autoload manifest and atomic replacement.
//!
//! Writers inside one process serialize on an async mutex keyed by the
//! manifest path. On Unix an advisory `flock` on a sibling lock file also
//! serializes against other processes (CLI vs. server).

use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use dashmap::DashMap;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;
use uuid::Uuid;

use modhub_core::error::{AppError, ErrorKind};
use modhub_core::result::AppResult;

static PROCESS_LOCKS: LazyLock<DashMap<PathBuf, Arc<Mutex<()>>>> = LazyLock::new(DashMap::new);

/// Held for the whole read-modify-write of the manifest.
#[derive(Debug)]
pub struct ManifestLock {
    _guard: OwnedMutexGuard<()>,
    #[cfg(unix)]
    _file: std::fs::File,
}

impl ManifestLock {
    /// Waits for exclusive access to `path`.
    pub async fn acquire(path: &Path) -> AppResult<Self> {
        let key = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        let mutex = PROCESS_LOCKS
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = mutex.lock_owned().await;

        #[cfg(unix)]
        {
            let file = lock_file(&key).await?;
            debug!(path = %key.display(), "Autoload manifest locked");
            Ok(Self {
                _guard: guard,
                _file: file,
            })
        }

        #[cfg(not(unix))]
        {
            debug!(path = %key.display(), "Autoload manifest locked");
            Ok(Self { _guard: guard })
        }
    }
}

/// Sibling lock file for `path`, e.g. `.composer.json.lock`.
fn lock_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "manifest".to_string());
    path.with_file_name(format!(".{name}.lock"))
}

#[cfg(unix)]
async fn lock_file(path: &Path) -> AppResult<std::fs::File> {
    let lock_path = lock_path(path);
    tokio::task::spawn_blocking(move || -> std::io::Result<std::fs::File> {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)?;
        rustix::fs::flock(&file, rustix::fs::FlockOperation::LockExclusive)
            .map_err(std::io::Error::from)?;
        Ok(file)
    })
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Internal, "Manifest lock task failed", e))?
    .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to lock autoload manifest", e))
}

/// Replace `path` with `contents` via a temp file in the same directory.
///
/// Readers see either the old or the new document, never a partial one.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> AppResult<()> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| AppError::storage(format!("Invalid manifest path {}", path.display())))?;
    let tmp = path.with_file_name(format!(".{name}.{}.tmp", Uuid::new_v4()));

    let result = async {
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(contents).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&tmp, path).await
    }
    .await;

    if let Err(e) = result {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to write {}", path.display()),
            e,
        ));
    }
    Ok(())
}
