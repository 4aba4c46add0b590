//! Provides the foundational data model and storage layer of mdsweep.
//!
//! Everything in this module is independent of scheduling: state points and their content
//! hashes, the parameter grid, the schema'd job document, the job and project handles that map
//! them onto the filesystem, and the trajectory file interface.

pub mod document;
pub mod error;
pub(crate) mod fsutil;
pub mod grid;
pub mod hashing;
pub mod io;
pub mod job;
pub mod project;
pub mod statepoint;
