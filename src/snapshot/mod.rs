//! One poll cycle: discover containers, read their accounting files, derive rates and
//! assemble the [`Snapshot`] document.
//!
//! Discovery (process scan plus identity resolution) runs on the blocking pool. Each unique
//! container then gets its own task reading its stats; a semaphore bounds how many run at
//! once. The whole container phase is bounded by the poll deadline, and containers still
//! pending when it elapses are left out of the snapshot.

mod models;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub use models::{CMDLINE_UNAVAILABLE, ContainerRecord, Snapshot};

use crate::cgroup::StatReader;
use crate::container::{ContainerID, IdentityResolver};
use crate::host::{HostReader, HostSnapshot};
use crate::process::{ProcessProvider, ProcessScanner, ScannedProcess};
use crate::tracker::{Counters, RateTracker};

/// Tuning knobs of a [`Collector`].
#[derive(Debug, Clone, Copy)]
pub struct CollectorOptions {
    /// Maximum distinct containers reported per poll; extra ones are dropped.
    pub max_containers: usize,
    /// Maximum containers whose stats are read concurrently.
    pub workers: usize,
    /// Deadline for one poll.
    pub poll_timeout: Duration,
}

impl Default for CollectorOptions {
    fn default() -> Self {
        Self {
            max_containers: 128,
            workers: 8,
            poll_timeout: Duration::from_secs(2),
        }
    }
}

/// A container selected for this poll together with its representative process.
#[derive(Debug, Clone)]
struct Target {
    process: ScannedProcess,
    container_id: ContainerID,
}

/// Produces snapshots. Shared by every exposition adapter; the rate tracker inside is the
/// only state carried from one poll to the next.
pub struct Collector {
    provider: Arc<dyn ProcessProvider>,
    host: HostReader,
    scanner: ProcessScanner,
    resolver: IdentityResolver,
    stats: StatReader,
    tracker: RateTracker,
    workers: Semaphore,
    options: CollectorOptions,
}

impl std::fmt::Debug for Collector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collector")
            .field("target", &self.scanner.target())
            .field("cgroup_root", &self.stats.root())
            .field("tracked", &self.tracker.len())
            .field("options", &self.options)
            .finish()
    }
}

impl Collector {
    pub fn new(
        provider: Arc<dyn ProcessProvider>,
        host: HostReader,
        scanner: ProcessScanner,
        stats: StatReader,
        options: CollectorOptions,
    ) -> Self {
        Self {
            provider,
            host,
            scanner,
            resolver: IdentityResolver,
            stats,
            tracker: RateTracker::new(),
            workers: Semaphore::new(options.workers.max(1)),
            options,
        }
    }

    pub fn tracker(&self) -> &RateTracker {
        &self.tracker
    }

    /// Runs one poll cycle.
    ///
    /// Never fails: every collection problem degrades to zeros, omitted containers and log
    /// lines. Host figures are always present.
    pub async fn poll(self: &Arc<Self>) -> Snapshot {
        let started = Instant::now();
        let deadline = tokio::time::Instant::now() + self.options.poll_timeout;

        let host = {
            let this = Arc::clone(self);
            tokio::task::spawn_blocking(move || this.host.snapshot())
        };
        let discovery = {
            let this = Arc::clone(self);
            tokio::time::timeout_at(
                deadline,
                tokio::task::spawn_blocking(move || this.discover()),
            )
        };
        let (host, discovery) = tokio::join!(host, discovery);

        let host = host.unwrap_or_else(|err| {
            log::warn!("host collection task failed: {err}");
            HostSnapshot::default()
        });
        let targets = match discovery {
            Ok(Ok(targets)) => targets,
            Ok(Err(err)) => {
                log::warn!("container discovery task failed: {err}");
                Vec::new()
            }
            Err(_) => {
                log::warn!(
                    "container discovery exceeded the poll deadline of {:?}",
                    self.options.poll_timeout
                );
                Vec::new()
            }
        };

        let containers = self
            .collect_records(targets, host.total_memory_bytes, deadline)
            .await;

        log::trace!(
            "poll took {} microseconds ({} containers)",
            started.elapsed().as_micros(),
            containers.len()
        );
        Snapshot { host, containers }
    }

    /// Scans for target processes and maps them to unique containers, first process wins.
    fn discover(&self) -> Vec<Target> {
        let provider = self.provider.as_ref();
        let mut seen: HashSet<ContainerID> = HashSet::new();
        let mut targets = Vec::new();
        let mut dropped = 0usize;

        for process in self.scanner.scan(provider) {
            let Some(container_id) = self.resolver.resolve(provider, process.pid) else {
                continue;
            };
            if !seen.insert(container_id.clone()) {
                log::debug!(
                    "pid {} shares container {} with an earlier process",
                    process.pid,
                    container_id
                );
                continue;
            }
            if targets.len() >= self.options.max_containers {
                dropped += 1;
                continue;
            }
            targets.push(Target {
                process,
                container_id,
            });
        }

        if dropped > 0 {
            log::warn!(
                "dropped {} containers beyond the capacity of {}",
                dropped,
                self.options.max_containers
            );
        }
        targets
    }

    async fn collect_records(
        self: &Arc<Self>,
        targets: Vec<Target>,
        host_total_bytes: u64,
        deadline: tokio::time::Instant,
    ) -> Vec<ContainerRecord> {
        let mut slots: Vec<Option<ContainerRecord>> = vec![None; targets.len()];
        let mut tasks = JoinSet::new();

        for (idx, target) in targets.into_iter().enumerate() {
            let this = Arc::clone(self);
            tasks.spawn(async move {
                let record = this.collect_one(target, host_total_bytes).await;
                (idx, record)
            });
        }

        let finished = tokio::time::timeout_at(deadline, async {
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((idx, record)) => slots[idx] = Some(record),
                    Err(err) => log::warn!("container stats task failed: {err}"),
                }
            }
        })
        .await;

        if finished.is_err() {
            tasks.abort_all();
            let pending = slots.iter().filter(|slot| slot.is_none()).count();
            log::warn!(
                "poll deadline of {:?} elapsed, omitting {} containers",
                self.options.poll_timeout,
                pending
            );
        }

        slots.into_iter().flatten().collect()
    }

    async fn collect_one(&self, target: Target, host_total_bytes: u64) -> ContainerRecord {
        // The semaphore is never closed.
        let _permit = self.workers.acquire().await.ok();

        let sampled_at = self.tracker.now_usec();
        let stats = self.stats.read(&target.container_id).await;
        let counters = Counters {
            cpu_usage_usec: stats.cpu_stat.usage_usec,
            read_bytes: stats.io_stat.rbytes,
            write_bytes: stats.io_stat.wbytes,
        };
        let rates = self
            .tracker
            .observe(&target.container_id, counters, sampled_at);

        ContainerRecord::new(
            target.process,
            target.container_id,
            &stats,
            rates,
            host_total_bytes,
        )
    }
}
