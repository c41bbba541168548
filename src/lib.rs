//! Docker Sysinfo: reports host memory and CPU plus per-container resource usage of
//! Docker workloads, read from `/proc` and the cgroup v2 hierarchy.
//!
//! A poll finds supervising processes with a configured name, maps each to the Docker
//! container it runs in, reads the container's accounting files and turns cumulative
//! counters into rates. Snapshots are served over HTTP and can also be written to a file.

pub mod api;
pub mod cgroup;
pub mod config;
pub mod container;
pub mod error;
pub mod fixed;
pub mod fsutil;
pub mod host;
pub mod process;
pub mod sink;
pub mod snapshot;
pub mod tracker;

#[cfg(test)]
mod testutil;

use std::sync::Arc;

pub use config::Config;

/// Runs the collector service until the HTTP server stops.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the listen address cannot be bound.
pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;
    log::info!("configuration: {:?}", config);

    let proc_root = config.rootfs.join("proc");
    let cgroup_root = cgroup::resolve_cgroup_root(&config.rootfs, config.cgroup_root.as_deref());
    log::info!(
        "reading processes from `{}`, cgroups from `{}`",
        proc_root.display(),
        cgroup_root.join(&config.cgroup_slice).display()
    );

    let collector = Arc::new(snapshot::Collector::new(
        Arc::new(process::ProcFs::new(&proc_root)),
        host::HostReader::new(&proc_root),
        process::ProcessScanner::new(config.target_process.clone()),
        cgroup::StatReader::new(
            cgroup_root,
            config.cgroup_slice.clone(),
            config.read_timeout(),
        ),
        config.collector_options(),
    ));

    if let Some(path) = config.output_file.clone() {
        let sink = sink::FileSink::new(path, config.interval());
        tokio::spawn(sink.run(Arc::clone(&collector)));
    }

    api::APIServer::new(collector).listen(config.listen).await?;
    Ok(())
}
