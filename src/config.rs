use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::snapshot::CollectorOptions;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("`{0}` must be at least 1")]
    ZeroLimit(&'static str),
    #[error("target process name must not be empty")]
    EmptyTarget,
    #[error("target process name `{0}` is longer than the kernel's 15-byte comm limit")]
    TargetTooLong(String),
}

/// Maximum length of a kernel task name (`comm`) without its NUL terminator.
const TASK_COMM_MAX_LEN: usize = 15;

/// Docker container resource collector.
///
/// Finds supervising processes with the target name, maps them to their Docker container
/// and serves host plus per-container usage as JSON.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Address of the HTTP endpoint
    #[arg(long, env = "SYSINFO_LISTEN", default_value = "0.0.0.0:3000")]
    pub listen: SocketAddr,

    /// Short process name (comm) of the workload to report
    #[arg(short, long, env = "SYSINFO_TARGET_PROCESS", default_value = "stress")]
    pub target_process: String,

    /// Host root mount; `/proc` and the cgroup hierarchy are looked up beneath it
    #[arg(long, env = "ROOTFS_MOUNT_PATH", default_value = "/")]
    pub rootfs: PathBuf,

    /// cgroup v2 hierarchy root, detected from mountinfo when unset
    #[arg(long, env = "SYSINFO_CGROUP_ROOT")]
    pub cgroup_root: Option<PathBuf>,

    /// Slice directory holding `docker-<id>.scope` groups
    #[arg(long, env = "SYSINFO_CGROUP_SLICE", default_value = "system.slice")]
    pub cgroup_slice: String,

    /// Timeout for a single accounting file read, in milliseconds
    #[arg(long, env = "SYSINFO_READ_TIMEOUT_MS", default_value_t = 250)]
    pub read_timeout_ms: u64,

    /// Deadline for one poll, in milliseconds
    #[arg(long, env = "SYSINFO_POLL_TIMEOUT_MS", default_value_t = 2000)]
    pub poll_timeout_ms: u64,

    /// Maximum number of containers reported per poll
    #[arg(long, env = "SYSINFO_MAX_CONTAINERS", default_value_t = 128)]
    pub max_containers: usize,

    /// Number of containers whose stats are read concurrently
    #[arg(short, long, env = "SYSINFO_WORKERS", default_value_t = 8)]
    pub workers: usize,

    /// Also write every snapshot to this file
    #[arg(short, long, env = "SYSINFO_OUTPUT_FILE")]
    pub output_file: Option<PathBuf>,

    /// Period of the file writer, in seconds
    #[arg(long, env = "SYSINFO_INTERVAL_SECS", default_value_t = 10)]
    pub interval_secs: u64,
}

impl Config {
    pub fn validate(&self) -> Result<(), Error> {
        if self.target_process.is_empty() {
            return Err(Error::EmptyTarget);
        }
        if self.target_process.len() > TASK_COMM_MAX_LEN {
            return Err(Error::TargetTooLong(self.target_process.clone()));
        }
        for (name, value) in [
            ("workers", self.workers as u64),
            ("max-containers", self.max_containers as u64),
            ("read-timeout-ms", self.read_timeout_ms),
            ("poll-timeout-ms", self.poll_timeout_ms),
            ("interval-secs", self.interval_secs),
        ] {
            if value == 0 {
                return Err(Error::ZeroLimit(name));
            }
        }
        Ok(())
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn collector_options(&self) -> CollectorOptions {
        CollectorOptions {
            max_containers: self.max_containers,
            workers: self.workers,
            poll_timeout: Duration::from_millis(self.poll_timeout_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        Config::try_parse_from(std::iter::once("docker-sysinfo").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]);
        assert_eq!(config.listen, "0.0.0.0:3000".parse().unwrap());
        assert_eq!(config.target_process, "stress");
        assert_eq!(config.cgroup_slice, "system.slice");
        assert_eq!(config.read_timeout(), Duration::from_millis(250));
        assert_eq!(config.max_containers, 128);
        assert_eq!(config.workers, 8);
        assert!(config.cgroup_root.is_none());
        assert!(config.output_file.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = parse(&[
            "--target-process",
            "yes",
            "--max-containers",
            "4",
            "--cgroup-root",
            "/tmp/cg",
            "--poll-timeout-ms",
            "500",
        ]);
        assert_eq!(config.target_process, "yes");
        assert_eq!(config.cgroup_root, Some(PathBuf::from("/tmp/cg")));
        let options = config.collector_options();
        assert_eq!(options.max_containers, 4);
        assert_eq!(options.poll_timeout, Duration::from_millis(500));
    }

    #[test]
    fn test_validation() {
        assert!(matches!(
            parse(&["--workers", "0"]).validate(),
            Err(Error::ZeroLimit("workers"))
        ));
        assert!(matches!(
            parse(&["--max-containers", "0"]).validate(),
            Err(Error::ZeroLimit("max-containers"))
        ));
        assert!(matches!(
            parse(&["--target-process", ""]).validate(),
            Err(Error::EmptyTarget)
        ));
        assert!(matches!(
            parse(&["--target-process", "a-very-long-process-name"]).validate(),
            Err(Error::TargetTooLong(_))
        ));
    }

    #[test]
    fn test_rejects_bad_listen_address() {
        assert!(
            Config::try_parse_from(["docker-sysinfo", "--listen", "not-an-address"]).is_err()
        );
    }
}
