//! # Engine Module
//!
//! This module holds everything an operation needs at execution time, independent of which
//! operation is running.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Validated configuration records and their builders
//! - **Error Handling** ([`error`]) - The error type every operation and workflow returns
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress reporting for front-ends
//! - **Simulation Seam** ([`simulation`]) - The [`simulation::SimulationEngine`] trait and the
//!   external-process engine that delegates the actual molecular dynamics
//! - **Job Locks** ([`lock`]) - Advisory per-job lock files guarding concurrent controllers

pub mod config;
pub mod error;
pub mod lock;
pub mod progress;
pub mod simulation;
