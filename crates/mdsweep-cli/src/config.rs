//! Layered configuration: built-in defaults, then `mdsweep.toml`, then `--set` overrides,
//! then explicit command-line flags.

pub mod builder;
pub mod defaults;
pub mod file;
pub mod models;
