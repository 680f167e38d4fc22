//! Effective memory ceiling from cgroup v1/v2 accounting files.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use crate::mountinfo::MountRecord;
use crate::ports::LimitSource;

pub const V1_FS_TYPE: &str = "cgroup";
pub const V2_FS_TYPE: &str = "cgroup2";

const V1_LIMIT_FILE: &str = "memory/memory.limit_in_bytes";
const V2_MEMORY_MAX: &str = "memory.max";
const V2_SWAP_MAX: &str = "memory.swap.max";

/// Token cgroup v2 writes for "no limit".
const UNBOUNDED_TOKEN: &str = "max";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CgroupVersion {
    V1,
    V2,
}

/// Memory ceiling as far as detection can tell. "Unknown" and "unbounded"
/// are the same thing here: neither justifies an override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryLimit {
    Unbounded,
    Bytes(u64),
}

impl MemoryLimit {
    pub fn bytes(self) -> Option<u64> {
        match self {
            MemoryLimit::Bytes(b) => Some(b),
            MemoryLimit::Unbounded => None,
        }
    }

    fn checked_add(self, other: MemoryLimit) -> MemoryLimit {
        match (self, other) {
            (MemoryLimit::Bytes(a), MemoryLimit::Bytes(b)) => a
                .checked_add(b)
                .map(MemoryLimit::Bytes)
                .unwrap_or(MemoryLimit::Unbounded),
            _ => MemoryLimit::Unbounded,
        }
    }
}

/// Picks the mount to read limits from. A v1 mount wins over any v2 mount,
/// wherever the two appear in the table.
pub fn select_mount(mounts: &[MountRecord]) -> Option<(CgroupVersion, &MountRecord)> {
    let v1 = mounts.iter().find(|m| m.fs_type == V1_FS_TYPE);
    let v2 = mounts.iter().find(|m| m.fs_type == V2_FS_TYPE);

    match (v1, v2) {
        (Some(m), _) => Some((CgroupVersion::V1, m)),
        (None, Some(m)) => Some((CgroupVersion::V2, m)),
        (None, None) => None,
    }
}

/// Resolves the effective memory ceiling from the mount table.
pub fn resolve_limit(source: &dyn LimitSource, mounts: &[MountRecord]) -> MemoryLimit {
    let Some((version, mount)) = select_mount(mounts) else {
        return MemoryLimit::Unbounded;
    };

    let limit = match version {
        CgroupVersion::V1 => v1_limit(source, &mount.mount_point),
        CgroupVersion::V2 => v2_limit(source, &mount.mount_point),
    };
    info!(
        version = ?version,
        mount_point = %mount.mount_point.display(),
        limit = ?limit,
        "cgroup memory limit resolved"
    );
    limit
}

pub fn v1_limit(source: &dyn LimitSource, mount_point: &Path) -> MemoryLimit {
    read_limit_file(source, &mount_point.join(V1_LIMIT_FILE))
}

/// Memory plus swap. Either half being unbounded or unreadable makes the
/// whole ceiling unbounded.
pub fn v2_limit(source: &dyn LimitSource, mount_point: &Path) -> MemoryLimit {
    let swap = read_limit_file(source, &mount_point.join(V2_SWAP_MAX));
    let memory = read_limit_file(source, &mount_point.join(V2_MEMORY_MAX));
    memory.checked_add(swap)
}

/// Reads a single limit file holding a decimal byte count or `max`.
pub fn read_limit_file(source: &dyn LimitSource, path: &Path) -> MemoryLimit {
    let content = match source.read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "could not read limit file");
            return MemoryLimit::Unbounded;
        }
    };

    let value = content.trim();
    if value == UNBOUNDED_TOKEN {
        return MemoryLimit::Unbounded;
    }
    match value.parse::<u64>() {
        Ok(bytes) => MemoryLimit::Bytes(bytes),
        Err(e) => {
            debug!(path = %path.display(), value = %value, error = %e, "malformed limit file");
            MemoryLimit::Unbounded
        }
    }
}
