pub mod env;
pub mod io;

pub use env::{EnvError, EnvironmentPort};
pub use io::{LimitSource, SourceError};
