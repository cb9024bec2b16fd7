//! Debounced, crash-safe persistence for the two JSON roots (§3
//! lifecycle, §4.6, §8 scenarios 5 and 6): a flush happens no sooner
//! than 3s after the most recent mutation and no later than 30s after
//! the first unflushed one, whichever comes first. Every flush writes a
//! temp file in the same directory, fsyncs it, then renames it over the
//! target — so a crash mid-write never leaves a torn file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{error, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::time::Instant;

pub const MIN_FLUSH_DELAY: Duration = Duration::from_secs(3);
pub const MAX_FLUSH_DELAY: Duration = Duration::from_secs(30);

/// Write `value` to `path` atomically: serialize to a sibling `.tmp`
/// file, fsync it, then rename over `path` (§4.6, §8 property 4).
pub async fn write_atomic<T: Serialize>(path: &Path, value: &T) -> std::io::Result<()> {
    let body = serde_json::to_string_pretty(value)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    let mut body = body;
    body.push('\n');

    let tmp_path = path.with_extension("tmp");
    let mut file = tokio::fs::File::create(&tmp_path).await?;
    file.write_all(body.as_bytes()).await?;
    file.sync_all().await?;
    drop(file);
    tokio::fs::rename(&tmp_path, path).await?;
    Ok(())
}

/// Load `path` as JSON, falling back to `T::default()` on any parse
/// failure. A corrupt file is quarantined alongside as
/// `*.corrupt-<unix-seconds>.json` rather than overwritten in place, so
/// the bad data survives for inspection (§8 scenario 6).
pub async fn load_or_recover<T>(path: &Path) -> (T, bool)
where
    T: DeserializeOwned + Default,
{
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return (T::default(), false),
        Err(e) => {
            warn!("{}: read failed, using defaults: {e}", path.display());
            return (T::default(), false);
        }
    };

    match serde_json::from_slice::<T>(&bytes) {
        Ok(value) => (value, false),
        Err(e) => {
            error!("{}: corrupt JSON, quarantining: {e}", path.display());
            quarantine(path).await;
            (T::default(), true)
        }
    }
}

async fn quarantine(path: &Path) {
    let epoch_secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let quarantine_path = path.with_extension(format!("corrupt-{epoch_secs}.json"));
    if let Err(e) = tokio::fs::rename(path, &quarantine_path).await {
        error!("{}: failed to quarantine corrupt file: {e}", path.display());
    }
}

/// One debounced writer for one JSON root. `mark_dirty` hands in the
/// latest full snapshot; the background task decides when to flush it.
pub struct DebouncedWriter<T> {
    tx: mpsc::UnboundedSender<T>,
}

impl<T> DebouncedWriter<T>
where
    T: Serialize + Send + 'static,
{
    pub fn spawn(path: PathBuf) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(path, rx));
        Self { tx }
    }

    /// Record a new snapshot as the owning root's latest dirty state.
    /// Never blocks; the write itself happens on the background task.
    pub fn mark_dirty(&self, snapshot: T) {
        let _ = self.tx.send(snapshot);
    }
}

async fn run<T: Serialize>(path: PathBuf, mut rx: mpsc::UnboundedReceiver<T>) {
    let mut latest: Option<T> = None;
    let mut last_mutation: Option<Instant> = None;
    let mut first_dirty: Option<Instant> = None;

    loop {
        let deadline = match (last_mutation, first_dirty) {
            (Some(last), Some(first)) => Some((last + MIN_FLUSH_DELAY).min(first + MAX_FLUSH_DELAY)),
            _ => None,
        };

        let timed_out = match deadline {
            Some(deadline) => tokio::select! {
                maybe = rx.recv() => {
                    match maybe {
                        Some(snapshot) => {
                            let now = Instant::now();
                            if first_dirty.is_none() { first_dirty = Some(now); }
                            last_mutation = Some(now);
                            latest = Some(snapshot);
                            false
                        }
                        None => return,
                    }
                }
                _ = tokio::time::sleep_until(deadline) => true,
            },
            None => match rx.recv().await {
                Some(snapshot) => {
                    let now = Instant::now();
                    first_dirty = Some(now);
                    last_mutation = Some(now);
                    latest = Some(snapshot);
                    false
                }
                None => return,
            },
        };

        if timed_out {
            if let Some(snapshot) = latest.take() {
                match write_atomic(&path, &snapshot).await {
                    Ok(()) => info!("{}: flushed", path.display()),
                    Err(e) => error!("{}: flush failed: {e}", path.display()),
                }
            }
            last_mutation = None;
            first_dirty = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, Default, PartialEq)]
    struct Sample {
        value: u32,
    }

    #[tokio::test]
    async fn write_atomic_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pool-config.json");
        write_atomic(&path, &Sample { value: 42 }).await.unwrap();
        let (loaded, corrupt): (Sample, bool) = load_or_recover(&path).await;
        assert!(!corrupt);
        assert_eq!(loaded, Sample { value: 42 });
    }

    #[tokio::test]
    async fn corrupt_file_is_quarantined_and_default_returned() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pool-config.json");
        tokio::fs::write(&path, b"not json").await.unwrap();
        let (loaded, corrupt): (Sample, bool) = load_or_recover(&path).await;
        assert!(corrupt);
        assert_eq!(loaded, Sample::default());

        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        let mut saw_quarantine = false;
        while let Some(entry) = entries.next_entry().await.unwrap() {
            if entry.file_name().to_string_lossy().contains("corrupt-") {
                saw_quarantine = true;
            }
        }
        assert!(saw_quarantine);
    }

    #[tokio::test]
    async fn debounced_writer_flushes_within_max_delay() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pool-state.json");
        let writer = DebouncedWriter::spawn(path.clone());
        writer.mark_dirty(Sample { value: 7 });
        tokio::time::sleep(MIN_FLUSH_DELAY + Duration::from_millis(500)).await;
        let (loaded, _): (Sample, bool) = load_or_recover(&path).await;
        assert_eq!(loaded, Sample { value: 7 });
    }
}
