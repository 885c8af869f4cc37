//! File system helpers for JSON files.

use serde::{Serialize, de::DeserializeOwned};
use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};
use tokio::{fs, io::AsyncWriteExt};

use filedb_core::error::StoreResult;

/// Returns `true` if `path` exists.
pub async fn exists(path: impl AsRef<Path>) -> StoreResult<bool> {
    Ok(fs::try_exists(path).await?)
}

/// Creates `path` and any missing parents (`mkdir -p`).
pub async fn ensure_dir(path: impl AsRef<Path>) -> StoreResult<()> {
    fs::create_dir_all(path).await?;
    Ok(())
}

/// Writes `default` to `path` unless the file already exists.
///
/// Creates the parent directory if needed. Returns `true` if the file was created.
pub async fn ensure_json_file<T: Serialize + ?Sized>(path: impl AsRef<Path>, default: &T) -> StoreResult<bool> {
    let path = path.as_ref();

    if exists(path).await? {
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        ensure_dir(parent).await?;
    }
    write_json(path, default).await?;

    Ok(true)
}

/// Reads and parses a JSON file.
pub async fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> StoreResult<T> {
    let raw = fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&raw)?)
}

/// Serializes `value` with two-space indentation and overwrites `path` in place.
///
/// A crash part-way through leaves a truncated file behind.
pub async fn write_json<T: Serialize + ?Sized>(path: impl AsRef<Path>, value: &T) -> StoreResult<()> {
    let content = serde_json::to_string_pretty(value)?;
    fs::write(path, content).await?;
    Ok(())
}

/// Like [`write_json`], but writes a sibling temp file, syncs it and renames it
/// over `path`, so readers see either the old or the new contents.
///
/// Every call uses its own temp file, so overlapping writes to the same path
/// each land whole and the last rename wins.
pub async fn write_json_atomic<T: Serialize + ?Sized>(path: impl AsRef<Path>, value: &T) -> StoreResult<()> {
    let path = path.as_ref();
    let content = serde_json::to_string_pretty(value)?;
    let temp_path = temp_path_for(path);

    {
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(content.as_bytes()).await?;
        file.sync_all().await?;
    }

    fs::rename(&temp_path, path).await?;
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    static NEXT: AtomicU64 = AtomicU64::new(0);

    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(format!(
        ".{}.{}.tmp",
        std::process::id(),
        NEXT.fetch_add(1, Ordering::Relaxed)
    ));
    path.with_file_name(name)
}
