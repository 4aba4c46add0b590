//! # mdsweep Core Library
//!
//! A workflow harness for parameter sweeps of molecular-dynamics simulations. A sweep is a grid
//! of state points; every state point owns an isolated job workspace, and a small set of
//! dependency-gated operations advances each job from "pending" to "sampled".
//!
//! ## Architectural Philosophy
//!
//! The library keeps the same layered structure throughout:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`StatePoint`, `ParameterGrid`,
//!   `JobDocument`), the on-disk project workspace, and trajectory I/O.
//!
//! - **[`engine`]: The Execution Seam.** Error types, configuration builders, progress
//!   reporting, per-job locks, and the [`engine::simulation::SimulationEngine`] trait behind
//!   which the actual molecular simulation lives.
//!
//! - **[`flow`]: The Scheduling Model.** Labels, operations, and the explicit dependency graph
//!   that decides which operation a job is eligible for, plus the cluster environment profiles
//!   and submission templates.
//!
//! - **[`workflows`]: The Public API.** End-to-end procedures: initializing a workspace,
//!   running or submitting eligible operations, reporting status, and relabeling trajectories.

pub mod core;
pub mod engine;
pub mod flow;
pub mod workflows;
