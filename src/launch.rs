//! Turning the detected limit into a launch, and the launch itself.

use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;

use anyhow::{Context, Result};
use serde::{Serialize, Serializer};
use tracing::{debug, info, warn};

use crate::cgroup::{resolve_limit, MemoryLimit};
use crate::config::Config;
use crate::heap::{derived_option, has_explicit_heap_flag, merge_options};
use crate::mountinfo::read_mounts;
use crate::ports::{EnvironmentPort, LimitSource};

/// Everything the launch step needs, with the options variable already read
/// out of the environment.
#[derive(Debug, Clone)]
pub struct LaunchConfig {
    pub runtime: OsString,
    pub args: Vec<OsString>,
    pub options_var: String,
    pub existing_options: Option<String>,
    pub mountinfo: PathBuf,
    /// False when the options variable holds something we cannot safely
    /// rewrite (non UTF-8).
    pub inject: bool,
}

impl LaunchConfig {
    pub fn from_env(config: &Config, env: &dyn EnvironmentPort) -> Self {
        let (existing_options, inject) = match env.var_opt(&config.options_var) {
            Ok(v) => (v, true),
            Err(e) => {
                warn!(error = %e, "leaving runtime options untouched");
                (None, false)
            }
        };

        Self {
            runtime: config.runtime.clone(),
            args: config.args.clone(),
            options_var: config.options_var.clone(),
            existing_options,
            mountinfo: config.mountinfo.clone(),
            inject,
        }
    }
}

/// The resolved launch: what runs, with which arguments, and what the
/// options variable is set to for the child.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchPlan {
    #[serde(serialize_with = "lossy")]
    pub program: OsString,
    #[serde(serialize_with = "lossy_all")]
    pub args: Vec<OsString>,
    pub options_var: String,
    /// `None` leaves the variable exactly as the caller had it.
    pub options: Option<String>,
    pub derived: String,
    /// `None` when detection was skipped.
    pub limit: Option<MemoryLimit>,
}

impl LaunchPlan {
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(options) = &self.options {
            cmd.env(&self.options_var, options);
        }
        cmd
    }
}

/// Detects the memory ceiling and decides on the options value. An explicit
/// heap flag from the caller short-circuits detection entirely.
pub fn plan(config: &LaunchConfig, source: &dyn LimitSource) -> LaunchPlan {
    let existing = config.existing_options.as_deref();
    let skip = if !config.inject {
        debug!(var = %config.options_var, "runtime options unreadable, not detecting");
        true
    } else if existing.is_some_and(has_explicit_heap_flag) {
        debug!(var = %config.options_var, "heap size set by caller, not detecting");
        true
    } else {
        false
    };

    let (options, derived, limit) = if skip {
        (None, String::new(), None)
    } else {
        let mounts = read_mounts(source, &config.mountinfo);
        let limit = resolve_limit(source, &mounts);
        let derived = derived_option(limit);
        (merge_options(existing, &derived), derived, Some(limit))
    };

    if !derived.is_empty() {
        info!(var = %config.options_var, option = %derived, "injecting heap size");
    }

    LaunchPlan {
        program: config.runtime.clone(),
        args: config.args.clone(),
        options_var: config.options_var.clone(),
        options,
        derived,
        limit,
    }
}

pub trait Executor {
    fn exec(&self, plan: &LaunchPlan) -> Result<()>;
}

/// Hands the process over to the runtime. Standard streams are inherited
/// and the child is never waited on.
pub struct ProcessExecutor;

impl Executor for ProcessExecutor {
    #[cfg(unix)]
    fn exec(&self, plan: &LaunchPlan) -> Result<()> {
        use std::os::unix::process::CommandExt;

        // Only returns on failure.
        let err = plan.command().exec();
        Err(anyhow::Error::new(err)
            .context(format!("failed to launch {}", plan.program.to_string_lossy())))
    }

    #[cfg(not(unix))]
    fn exec(&self, plan: &LaunchPlan) -> Result<()> {
        plan.command()
            .spawn()
            .with_context(|| format!("failed to launch {}", plan.program.to_string_lossy()))?;
        Ok(())
    }
}

/// Writes the plan as JSON instead of launching.
pub struct DryRunExecutor<W> {
    out: std::cell::RefCell<W>,
}

impl<W: Write> DryRunExecutor<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: std::cell::RefCell::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

impl<W: Write> Executor for DryRunExecutor<W> {
    fn exec(&self, plan: &LaunchPlan) -> Result<()> {
        let mut out = self.out.borrow_mut();
        serde_json::to_writer_pretty(&mut *out, plan).context("failed to serialize launch plan")?;
        writeln!(out)?;
        Ok(())
    }
}

fn lossy<S: Serializer>(value: &OsString, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&value.to_string_lossy())
}

fn lossy_all<S: Serializer>(values: &[OsString], s: S) -> Result<S::Ok, S::Error> {
    s.collect_seq(values.iter().map(|v| v.to_string_lossy()))
}
