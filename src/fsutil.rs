use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Error that occurs when opening a file fails.
#[derive(Debug, thiserror::Error)]
#[error("failed to open file `{path}`: {source}")]
pub struct FileOpenError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Error that occurs when reading a pseudo-file fails or takes too long.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error(transparent)]
    Open(#[from] FileOpenError),
    #[error("failed to read file `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("reading file `{path}` timed out after {timeout:?}")]
    TimedOut { path: PathBuf, timeout: Duration },
    #[error("reader task for `{path}` failed: {reason}")]
    Task { path: PathBuf, reason: String },
}

/// Opens a file at the given path and wraps it in a [`BufReader`].
///
/// # Errors
///
/// Returns a [`FileOpenError`] if the file cannot be opened.
///
/// # Example
/// ```no_run
/// # use docker_sysinfo::fsutil;
/// let reader = fsutil::open_file_reader("/proc/meminfo")?;
/// # Ok::<(), fsutil::FileOpenError>(())
/// ```
pub fn open_file_reader(path: impl AsRef<Path>) -> Result<BufReader<File>, FileOpenError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| FileOpenError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufReader::new(file))
}

/// Reads at most `limit` bytes from the file at `path` in a single pass.
///
/// Pseudo-files under `/proc` and `/sys/fs/cgroup` are generated on open, so one bounded
/// read is all that is ever attempted. Content is decoded lossily.
///
/// # Errors
///
/// Returns [`ReadError::Open`] or [`ReadError::Read`] on I/O failure.
pub fn read_bounded(path: impl AsRef<Path>, limit: u64) -> Result<String, ReadError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| FileOpenError {
        path: path.to_path_buf(),
        source,
    })?;
    let mut buf = Vec::with_capacity(limit.min(4096) as usize);
    file.take(limit)
        .read_to_end(&mut buf)
        .map_err(|source| ReadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Like [`read_bounded`], but runs the read on the blocking pool and gives up after
/// `timeout`.
///
/// A read that outlives the timeout is abandoned, not cancelled; its result is dropped.
///
/// # Errors
///
/// Returns [`ReadError::TimedOut`] if the deadline passes first, otherwise the errors of
/// [`read_bounded`].
pub async fn read_bounded_with_timeout(
    path: PathBuf,
    limit: u64,
    timeout: Duration,
) -> Result<String, ReadError> {
    let task_path = path.clone();
    let task = tokio::task::spawn_blocking(move || read_bounded(task_path, limit));
    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(ReadError::Task {
            path,
            reason: join_err.to_string(),
        }),
        Err(_) => Err(ReadError::TimedOut { path, timeout }),
    }
}
