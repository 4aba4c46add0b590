//! # Workflows Module
//!
//! High-level entry points of mdsweep. Each workflow takes an opened [`crate::core::project::Project`]
//! and drives one end-to-end procedure over its jobs, reporting progress through a
//! [`crate::engine::progress::ProgressReporter`].
//!
//! - **Initialization** ([`init`]) expands a parameter grid into job workspaces.
//! - **Project definition** ([`project`]) declares the `nvt` and `sample` operations and their labels.
//! - **Local execution** ([`run`]) dispatches eligible operations in dependency order.
//! - **Status** ([`status`]) summarizes which labels hold and what is eligible next.
//! - **Submission** ([`submit`]) renders and hands batch scripts to a cluster scheduler.
//! - **Relabeling** ([`relabel`]) marks the center beads of every molecule in a trajectory.

pub mod init;
pub mod project;
pub mod relabel;
pub mod run;
pub mod status;
pub mod submit;
