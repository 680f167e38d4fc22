pub mod memory;
pub mod std_adapters;

pub use memory::{InMemorySource, MapEnv};
pub use std_adapters::{StdEnvAdapter, StdFsAdapter};
