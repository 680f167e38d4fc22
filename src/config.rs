//! Wrapper settings. They come only from `HEAPCAP_*` environment variables:
//! every command-line argument after the program name belongs to the
//! runtime, including `--help` and `--version`.

use std::ffi::OsString;
use std::path::PathBuf;

use tracing::warn;

use crate::mountinfo::MOUNTINFO_PATH;
use crate::ports::EnvironmentPort;

pub const DEFAULT_RUNTIME: &str = "node";
pub const DEFAULT_OPTIONS_VAR: &str = "NODE_OPTIONS";

pub const RUNTIME_VAR: &str = "HEAPCAP_RUNTIME";
pub const OPTIONS_VAR_VAR: &str = "HEAPCAP_OPTIONS_VAR";
pub const MOUNTINFO_VAR: &str = "HEAPCAP_MOUNTINFO";
pub const DRY_RUN_VAR: &str = "HEAPCAP_DRY_RUN";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Runtime binary to launch
    pub runtime: OsString,
    /// Environment variable carrying the runtime's options
    pub options_var: String,
    /// Mount table to inspect
    pub mountinfo: PathBuf,
    /// Print the launch plan as JSON instead of launching
    pub dry_run: bool,
    /// Arguments forwarded to the runtime, verbatim
    pub args: Vec<OsString>,
}

impl Config {
    pub fn from_env(env: &dyn EnvironmentPort) -> Self {
        Self {
            runtime: OsString::from(setting(env, RUNTIME_VAR, DEFAULT_RUNTIME)),
            options_var: setting(env, OPTIONS_VAR_VAR, DEFAULT_OPTIONS_VAR),
            mountinfo: PathBuf::from(setting(env, MOUNTINFO_VAR, MOUNTINFO_PATH)),
            dry_run: setting(env, DRY_RUN_VAR, "0") == "1",
            args: env.args().into_iter().skip(1).collect(),
        }
    }
}

/// Unset or empty falls back to the default. An unreadable value does too,
/// with a warning.
fn setting(env: &dyn EnvironmentPort, key: &str, default: &str) -> String {
    match env.var_opt(key) {
        Ok(Some(v)) if !v.is_empty() => v,
        Ok(_) => default.to_string(),
        Err(e) => {
            warn!(error = %e, default = default, "ignoring setting");
            default.to_string()
        }
    }
}
