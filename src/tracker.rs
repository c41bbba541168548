//! Conversion of cumulative cgroup counters into rates.
//!
//! Accounting files only expose totals since the container started. [`RateTracker`]
//! remembers the previous totals per container and turns each new observation into the
//! rate over the interval since the last one.
//!
//! The table is a sharded concurrent map; the read-compute-write for one container holds
//! only that key's shard lock, so pollers working on different containers do not serialize
//! on a single table-wide lock. Entries are created on first sight and never removed;
//! containers that disappear leave a stale entry behind.

use std::time::Instant;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::container::ContainerID;
use crate::fixed::Centi;

const USEC_PER_SEC: u64 = 1_000_000;

/// Cumulative counters read from a container's accounting files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    /// `usage_usec` from `cpu.stat`.
    pub cpu_usage_usec: u64,
    /// `rbytes` from `io.stat`, summed across devices.
    pub read_bytes: u64,
    /// `wbytes` from `io.stat`, summed across devices.
    pub write_bytes: u64,
}

/// Rates over the interval between two observations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rates {
    /// CPU time consumed per wall-clock time, as a percentage of one logical CPU.
    ///
    /// Not normalized by core count: a container saturating two cores reports `200.00`.
    pub cpu_percent: Centi,
    pub read_bytes_per_sec: u64,
    pub write_bytes_per_sec: u64,
}

/// The last observation of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerEntry {
    pub counters: Counters,
    /// Observation time in microseconds on the tracker's clock.
    pub timestamp_usec: u64,
}

/// Process-wide table of the last observed counters per container.
#[derive(Debug)]
pub struct RateTracker {
    entries: DashMap<ContainerID, TrackerEntry>,
    epoch: Instant,
}

impl Default for RateTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl RateTracker {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            epoch: Instant::now(),
        }
    }

    /// Microseconds elapsed on the tracker's monotonic clock.
    pub fn now_usec(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_micros()).unwrap_or(u64::MAX)
    }

    /// Records `counters` for `container_id` at `timestamp_usec` and returns the rates since
    /// the previous observation.
    ///
    /// - First observation: stores the baseline, returns zero rates.
    /// - `timestamp_usec` not after the previous one: returns zero rates.
    /// - A counter that went backwards contributes a zero rate.
    ///
    /// The stored entry always ends up holding this observation.
    pub fn observe(
        &self,
        container_id: &ContainerID,
        counters: Counters,
        timestamp_usec: u64,
    ) -> Rates {
        let current = TrackerEntry {
            counters,
            timestamp_usec,
        };

        match self.entries.entry(container_id.clone()) {
            Entry::Vacant(vacant) => {
                log::debug!("tracking new container {container_id}");
                vacant.insert(current);
                Rates::default()
            }
            Entry::Occupied(mut occupied) => {
                let previous = std::mem::replace(occupied.get_mut(), current);
                rates_between(container_id, &previous, &current)
            }
        }
    }

    /// Returns a copy of the stored entry for `container_id`.
    pub fn get(&self, container_id: &ContainerID) -> Option<TrackerEntry> {
        self.entries.get(container_id).map(|entry| *entry)
    }

    /// Number of containers ever observed.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn rates_between(
    container_id: &ContainerID,
    previous: &TrackerEntry,
    current: &TrackerEntry,
) -> Rates {
    let Some(elapsed_usec) = current
        .timestamp_usec
        .checked_sub(previous.timestamp_usec)
        .filter(|elapsed| *elapsed > 0)
    else {
        log::debug!(
            "non-positive interval for container {} ({} -> {} usec), reporting zero rates",
            container_id,
            previous.timestamp_usec,
            current.timestamp_usec
        );
        return Rates::default();
    };

    let delta = |cur: u64, prev: u64| cur.saturating_sub(prev);
    let cpu_delta = delta(
        current.counters.cpu_usage_usec,
        previous.counters.cpu_usage_usec,
    );
    let read_delta = delta(current.counters.read_bytes, previous.counters.read_bytes);
    let write_delta = delta(current.counters.write_bytes, previous.counters.write_bytes);

    Rates {
        cpu_percent: Centi::percent(cpu_delta, elapsed_usec),
        read_bytes_per_sec: per_second(read_delta, elapsed_usec),
        write_bytes_per_sec: per_second(write_delta, elapsed_usec),
    }
}

fn per_second(delta: u64, elapsed_usec: u64) -> u64 {
    let rate = u128::from(delta) * u128::from(USEC_PER_SEC) / u128::from(elapsed_usec);
    u64::try_from(rate).unwrap_or(u64::MAX)
}
