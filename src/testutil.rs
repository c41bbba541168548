//! Synthetic `/proc` and cgroup trees for tests.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

/// A throwaway host filesystem: `<tmp>/proc` and `<tmp>/sys/fs/cgroup`.
pub struct FakeHost {
    dir: TempDir,
}

impl FakeHost {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create tempdir");
        std::fs::create_dir_all(dir.path().join("proc")).unwrap();
        std::fs::create_dir_all(dir.path().join("sys/fs/cgroup/system.slice")).unwrap();
        Self { dir }
    }

    pub fn rootfs(&self) -> &Path {
        self.dir.path()
    }

    pub fn proc_root(&self) -> PathBuf {
        self.dir.path().join("proc")
    }

    pub fn cgroup_root(&self) -> PathBuf {
        self.dir.path().join("sys/fs/cgroup")
    }

    /// Adds a process; `container` places it in `docker-<id>.scope`, otherwise in a
    /// `<name>.service` unit.
    pub fn add_process(
        &self,
        pid: u32,
        ppid: u32,
        name: &str,
        cmdline: &str,
        container: Option<&str>,
    ) {
        let dir = self.proc_root().join(pid.to_string());
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("stat"),
            format!("{pid} ({name}) S {ppid} {pid} {ppid} 0 -1 4194560 94 0 0 0 0 0\n"),
        )
        .unwrap();
        std::fs::write(dir.join("cmdline"), cmdline).unwrap();
        let cgroup = match container {
            Some(id) => format!("0::/system.slice/docker-{id}.scope\n"),
            None => format!("0::/system.slice/{name}.service\n"),
        };
        std::fs::write(dir.join("cgroup"), cgroup).unwrap();
    }

    /// Writes one accounting file of a container scope.
    pub fn write_container_file(&self, id: &str, file: &str, content: &str) {
        let dir = self
            .cgroup_root()
            .join("system.slice")
            .join(format!("docker-{id}.scope"));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(file), content).unwrap();
    }

    /// Replaces one accounting file of a container scope with a FIFO that has no writer, so
    /// opening it for reading blocks indefinitely.
    pub fn block_container_file(&self, id: &str, file: &str) {
        let dir = self
            .cgroup_root()
            .join("system.slice")
            .join(format!("docker-{id}.scope"));
        std::fs::create_dir_all(&dir).unwrap();
        make_fifo(&dir.join(file));
    }

    /// Writes a complete, consistent set of accounting files for a container.
    pub fn set_container_stats(&self, id: &str, memory_bytes: u64, usage_usec: u64, io: &str) {
        self.write_container_file(id, "memory.current", &format!("{memory_bytes}\n"));
        self.write_container_file(id, "memory.stat", "anon 4096\nkernel 8192\nkernel_stack 1024\n");
        self.write_container_file(
            id,
            "cpu.stat",
            &format!("usage_usec {usage_usec}\nuser_usec 0\nsystem_usec 0\n"),
        );
        self.write_container_file(id, "io.stat", io);
    }

    pub fn set_meminfo(&self, total_kb: u64, free_kb: u64) {
        std::fs::write(
            self.proc_root().join("meminfo"),
            format!(
                "MemTotal:       {total_kb} kB\nMemFree:        {free_kb} kB\nMemAvailable:   {free_kb} kB\n"
            ),
        )
        .unwrap();
    }

    pub fn set_proc_stat(&self, user: u64, nice: u64, system: u64, idle: u64) {
        std::fs::write(
            self.proc_root().join("stat"),
            format!(
                "cpu  {user} {nice} {system} {idle} 0 0 0 0 0 0\ncpu0 {user} {nice} {system} {idle} 0 0 0 0 0 0\nctxt 1\n"
            ),
        )
        .unwrap();
    }
}

/// Creates a named pipe at `path`, replacing any existing file.
pub fn make_fifo(path: &Path) {
    let _ = std::fs::remove_file(path);
    let status = Command::new("mkfifo").arg(path).status().expect("run mkfifo");
    assert!(status.success(), "mkfifo failed for {}", path.display());
}

/// Runs `future` on a dedicated runtime that is shut down without waiting for blocking
/// tasks, which a read stuck on a FIFO would otherwise hold open forever.
pub fn block_on_abandoning_blocked_reads<F: Future>(future: F) -> F::Output {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("build runtime");
    let output = runtime.block_on(future);
    runtime.shutdown_background();
    output
}
