//! Detection of the cgroup v2 mount point from a `mountinfo` file.
//!
//! See [`proc_pid_mountinfo(5)`](https://man7.org/linux/man-pages/man5/proc_pid_mountinfo.5.html)
//! for the line format. Only the mount point (field 5) and the filesystem type (first
//! field after the ` - ` separator) are needed here.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use crate::fsutil;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    FileOpen(#[from] fsutil::FileOpenError),
    #[error("failed to read line for file `{path}`: {source}")]
    ReadLine {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed mountinfo line in `{path}`: `{line}`")]
    Malformed { path: PathBuf, line: String },
    #[error("failed to detect cgroup v2 mount point in file `{path}`")]
    MissingCgroup2Mount { path: PathBuf },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Returns the first `cgroup2` mount point listed in the given `mountinfo` file.
///
/// # Errors
///
/// - [`Error::FileOpen`] if the file can't be opened.
/// - [`Error::ReadLine`] if reading from the file fails.
/// - [`Error::Malformed`] if a line lacks the mount point or filesystem type.
/// - [`Error::MissingCgroup2Mount`] if no `cgroup2` mount is listed.
///
/// # Example
///
/// ```no_run
/// use docker_sysinfo::cgroup::detect_cgroup2_mount_point;
///
/// let root = detect_cgroup2_mount_point("/proc/1/mountinfo").unwrap();
/// println!("cgroup2 root: {}", root.display());
/// ```
pub fn detect_cgroup2_mount_point(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let reader = fsutil::open_file_reader(path)?;
    detect_from_reader(reader, path)
}

/// Resolves the cgroup hierarchy root to read from.
///
/// An explicit root wins. Otherwise the mount point is detected from
/// `<rootfs>/proc/1/mountinfo` and rebased under `rootfs`; if detection fails the
/// conventional `<rootfs>/sys/fs/cgroup` is used and a warning logged.
pub fn resolve_cgroup_root(rootfs: &Path, explicit: Option<&Path>) -> PathBuf {
    if let Some(root) = explicit {
        return root.to_path_buf();
    }

    let mount_point = match detect_cgroup2_mount_point(rootfs.join("proc/1/mountinfo")) {
        Ok(mount_point) => mount_point,
        Err(err) => {
            log::warn!("{err}; falling back to /sys/fs/cgroup");
            PathBuf::from("/sys/fs/cgroup")
        }
    };
    rootfs.join(mount_point.strip_prefix("/").unwrap_or(&mount_point))
}

fn detect_from_reader<R: BufRead>(mut reader: R, origin: &Path) -> Result<PathBuf> {
    let mut line = String::with_capacity(256);

    while reader
        .read_line(&mut line)
        .map_err(|source| Error::ReadLine {
            path: origin.to_path_buf(),
            source,
        })?
        != 0
    {
        let (mount_point, fs_type) =
            mount_point_and_fs_type(&line).ok_or_else(|| Error::Malformed {
                path: origin.to_path_buf(),
                line: line.trim_end().to_owned(),
            })?;
        if fs_type == "cgroup2" {
            log::debug!("Found `cgroup2` mount point: {mount_point}");
            return Ok(PathBuf::from(mount_point));
        }

        line.clear();
    }

    Err(Error::MissingCgroup2Mount {
        path: origin.to_path_buf(),
    })
}

fn mount_point_and_fs_type(line: &str) -> Option<(&str, &str)> {
    let (pre, post) = line.split_once(" - ")?;
    let mount_point = pre.split_whitespace().nth(4)?;
    let fs_type = post.split_whitespace().next()?;
    Some((mount_point, fs_type))
}
