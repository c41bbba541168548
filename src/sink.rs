//! Periodic snapshot file for consumers that poll a file instead of the HTTP endpoint.
//!
//! The file is replaced atomically: the document is written to a sibling temporary file
//! which is then renamed over the target, so readers never see a partial document.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::snapshot::{Collector, Snapshot};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write `{path}`: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("snapshot writer task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Writes a fresh snapshot to a file on every tick.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    interval: Duration,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>, interval: Duration) -> Self {
        Self {
            path: path.into(),
            interval,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Polls and writes forever. Failed writes are logged and retried on the next tick.
    pub async fn run(self, collector: Arc<Collector>) {
        log::info!(
            "writing snapshots to `{}` every {:?}",
            self.path.display(),
            self.interval
        );
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let snapshot = collector.poll().await;
            if let Err(err) = self.write(&snapshot).await {
                log::warn!("{err}");
            }
        }
    }

    /// Serializes `snapshot` and atomically replaces the target file with it.
    pub async fn write(&self, snapshot: &Snapshot) -> Result<(), Error> {
        let mut body = serde_json::to_vec_pretty(snapshot)?;
        body.push(b'\n');
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&path, &body)).await?
    }
}

fn write_atomic(path: &Path, body: &[u8]) -> Result<(), Error> {
    let tmp = temp_path(path);
    let io_err = |source| Error::Write {
        path: tmp.clone(),
        source,
    };

    let mut file = std::fs::File::create(&tmp).map_err(io_err)?;
    file.write_all(body).map_err(io_err)?;
    file.sync_all().map_err(io_err)?;
    drop(file);

    std::fs::rename(&tmp, path).map_err(|source| Error::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// `<dir>/.<name>.tmp`, next to the target so the rename stays on one filesystem.
fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "sysinfo".to_owned());
    path.with_file_name(format!(".{name}.tmp"))
}
