use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::Path;

use crate::ports::{EnvError, EnvironmentPort, LimitSource, SourceError};

pub struct StdFsAdapter;

impl LimitSource for StdFsAdapter {
    fn read_to_string(&self, path: &Path) -> Result<String, SourceError> {
        std::fs::read_to_string(path).map_err(|e| {
            let shown = path.display().to_string();
            match e.kind() {
                ErrorKind::NotFound => SourceError::NotFound(shown),
                ErrorKind::PermissionDenied => SourceError::PermissionDenied(shown),
                _ => SourceError::OperationFailed(shown, e.to_string()),
            }
        })
    }
}

pub struct StdEnvAdapter;

impl EnvironmentPort for StdEnvAdapter {
    fn get_var(&self, key: &str) -> Result<String, EnvError> {
        std::env::var(key).map_err(|e| match e {
            std::env::VarError::NotPresent => EnvError::NotFound(key.to_string()),
            std::env::VarError::NotUnicode(_) => {
                EnvError::InvalidValue(key.to_string(), "invalid UTF-8".to_string())
            }
        })
    }

    fn args(&self) -> Vec<OsString> {
        std::env::args_os().collect()
    }
}
