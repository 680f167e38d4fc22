//! Launch a runtime with a heap ceiling that respects the container's cgroup
//! memory limit.
//!
//! The pipeline runs once per launch: [`mountinfo`] parses the mount table,
//! [`cgroup`] picks a cgroup version and resolves the memory ceiling,
//! [`heap`] turns it into a `--max-old-space-size` flag and [`launch`]
//! hands the process over to the runtime.

pub mod adapters;
pub mod cgroup;
pub mod config;
pub mod heap;
pub mod launch;
pub mod mountinfo;
pub mod observability;
pub mod ports;

pub use cgroup::{CgroupVersion, MemoryLimit};
pub use config::Config;
pub use launch::{plan, DryRunExecutor, Executor, LaunchConfig, LaunchPlan, ProcessExecutor};
pub use mountinfo::MountRecord;
