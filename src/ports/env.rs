use std::ffi::OsString;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnvError {
    #[error("Environment variable not found: {0}")]
    NotFound(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

pub trait EnvironmentPort {
    fn get_var(&self, key: &str) -> Result<String, EnvError>;

    /// Process arguments, program name first.
    fn args(&self) -> Vec<OsString>;

    /// Like `get_var`, but an unset variable is `None` instead of an error.
    fn var_opt(&self, key: &str) -> Result<Option<String>, EnvError> {
        match self.get_var(key) {
            Ok(v) => Ok(Some(v)),
            Err(EnvError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
