//! Per-container resource accounting through the cgroup v2 filesystem.
//!
//! # Key Components
//!
//! - [`StatReader`]: reads and parses the accounting files of one container scope.
//! - [`stats`]: lossy parsers for the individual file formats.
//! - [`resolve_cgroup_root`]: finds the hierarchy root, explicitly configured or detected
//!   from `mountinfo`.
//!
//! # Supported Stats
//!
//! The following files are read from `<root>/<slice>/docker-<id>.scope/`:
//!
//! - `memory.current` and `memory.stat`
//! - `cpu.stat`
//! - `io.stat`
//!
//! # Platform Requirements
//!
//! - Linux with cgroup v2 (unified hierarchy).
//! - Read access to the hierarchy, e.g. `/sys/fs/cgroup`.
mod mount;
mod reader;
pub mod stats;

pub use mount::{Error as MountError, detect_cgroup2_mount_point, resolve_cgroup_root};
pub use reader::{CPU_STAT, IO_STAT, MEMORY_CURRENT, MEMORY_STAT, StatReader};
