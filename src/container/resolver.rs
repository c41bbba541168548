//! Mapping processes to container identities through their cgroup membership.
//!
//! `/proc/<pid>/cgroup` lists one membership per line in the form
//! `<hierarchy-id>:<controller-list>:<cgroup-path>`:
//!
//! - cgroup v2: hierarchy id `0`, empty controller list, unified path.
//! - cgroup v1: arbitrary hierarchy id, comma-separated controllers such as `memory`.
//!
//! The memory-controller path of a Docker container ends in a segment
//! `docker-<id>.scope`; the id is taken verbatim from it.

use crate::process::ProcessProvider;

use super::ContainerID;

#[derive(Debug, thiserror::Error)]
pub enum CgroupLineError {
    #[error("invalid cgroup line format: {0}")]
    InvalidFormat(String),
    #[error("invalid hierarchy id in cgroup line: {0}")]
    InvalidHierarchyID(String),
    #[error("no memory cgroup membership in:\n{0}")]
    MissingMemoryController(String),
}

/// One parsed line of `/proc/<pid>/cgroup`.
#[derive(Debug, PartialEq, Eq)]
pub struct CgroupLine<'a> {
    pub hierarchy_id: u32,
    pub controller_list: Vec<&'a str>,
    pub cgroup_path: &'a str,
}

impl<'a> CgroupLine<'a> {
    /// Parses a single `<hierarchy-id>:<controller-list>:<cgroup-path>` line.
    ///
    /// The path is everything after the second `:`, so paths containing `:` survive.
    ///
    /// # Errors
    ///
    /// Returns [`CgroupLineError`] if a separator is missing or the hierarchy id is not a
    /// number.
    pub fn parse(line: &'a str) -> Result<Self, CgroupLineError> {
        let mut it = line.splitn(3, ':');
        let hierarchy_id = it
            .next()
            .ok_or_else(|| CgroupLineError::InvalidFormat(line.to_owned()))?
            .parse::<u32>()
            .map_err(|_| CgroupLineError::InvalidHierarchyID(line.to_owned()))?;
        let controller_list = it
            .next()
            .ok_or_else(|| CgroupLineError::InvalidFormat(line.to_owned()))?;
        let controller_list: Vec<&str> = if controller_list.is_empty() {
            Vec::default()
        } else {
            controller_list.split(',').collect()
        };
        let cgroup_path = it
            .next()
            .ok_or_else(|| CgroupLineError::InvalidFormat(line.to_owned()))?;

        Ok(CgroupLine {
            hierarchy_id,
            controller_list,
            cgroup_path: cgroup_path.trim(),
        })
    }

    fn is_unified(&self) -> bool {
        self.hierarchy_id == 0 && self.controller_list.is_empty()
    }

    fn has_memory_controller(&self) -> bool {
        self.controller_list.contains(&"memory")
    }
}

/// Selects the memory-controller path from the full content of `/proc/<pid>/cgroup`.
///
/// A v1 `memory` line is preferred; otherwise the v2 unified line is used.
///
/// # Errors
///
/// Returns the first malformed line's error, or
/// [`CgroupLineError::MissingMemoryController`] if no line qualifies.
pub fn memory_cgroup_path(content: &str) -> Result<&str, CgroupLineError> {
    let mut unified = None;
    for line in content.lines().filter(|l| !l.trim().is_empty()) {
        let parsed = CgroupLine::parse(line)?;
        if parsed.has_memory_controller() {
            return Ok(parsed.cgroup_path);
        }
        if parsed.is_unified() {
            unified = Some(parsed.cgroup_path);
        }
    }
    unified.ok_or_else(|| CgroupLineError::MissingMemoryController(content.to_owned()))
}

/// Extracts the container id from a cgroup path containing a `docker-<id>.scope` segment.
///
/// Returns `None` for paths of host processes or ids that fail validation.
///
/// # Examples
///
/// ```
/// # use docker_sysinfo::container::container_id_from_cgroup_path;
/// let id = container_id_from_cgroup_path("/system.slice/docker-4f2a9c.scope").unwrap();
/// assert_eq!(id.as_str(), "4f2a9c");
///
/// assert!(container_id_from_cgroup_path("/user.slice/session-2.scope").is_none());
/// ```
pub fn container_id_from_cgroup_path(path: &str) -> Option<ContainerID> {
    path.split('/')
        .filter_map(|segment| segment.strip_prefix("docker-")?.strip_suffix(".scope"))
        .find_map(|raw| ContainerID::new(raw).ok())
}

/// Resolves the container a process belongs to.
///
/// Failure is never fatal: host processes and unreadable memberships yield `None` and the
/// process is simply not reported as a container.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityResolver;

impl IdentityResolver {
    pub fn resolve(&self, provider: &dyn ProcessProvider, pid: u32) -> Option<ContainerID> {
        let Some(path) = provider.cgroup_path(pid) else {
            log::debug!("no cgroup membership found for pid {pid}");
            return None;
        };
        let id = container_id_from_cgroup_path(&path);
        if id.is_none() {
            log::debug!("pid {pid} is not container-scoped (cgroup `{path}`)");
        }
        id
    }
}
