//! In-memory adapters, handy for driving detection without a real `/proc`
//! or `/sys/fs/cgroup`.

use std::collections::{HashMap, HashSet};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::ports::{EnvError, EnvironmentPort, LimitSource, SourceError};

/// Maps paths to file contents. Paths that were never inserted read as
/// `NotFound`.
#[derive(Debug, Default, Clone)]
pub struct InMemorySource {
    files: HashMap<PathBuf, String>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.insert(path, content);
        self
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }
}

impl LimitSource for InMemorySource {
    fn read_to_string(&self, path: &Path) -> Result<String, SourceError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(path.display().to_string()))
    }
}

/// A fixed environment: variables, argv, and variables whose value is
/// not valid UTF-8.
#[derive(Debug, Default, Clone)]
pub struct MapEnv {
    vars: HashMap<String, String>,
    invalid: HashSet<String>,
    args: Vec<OsString>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_invalid_var(mut self, key: &str) -> Self {
        self.invalid.insert(key.to_string());
        self
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

impl EnvironmentPort for MapEnv {
    fn get_var(&self, key: &str) -> Result<String, EnvError> {
        if self.invalid.contains(key) {
            return Err(EnvError::InvalidValue(
                key.to_string(),
                "invalid UTF-8".to_string(),
            ));
        }
        self.vars
            .get(key)
            .cloned()
            .ok_or_else(|| EnvError::NotFound(key.to_string()))
    }

    fn args(&self) -> Vec<OsString> {
        self.args.clone()
    }
}
