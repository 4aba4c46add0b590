//! # Flow Module
//!
//! The scheduling model of mdsweep. A [`graph::FlowGraph`] is one explicitly constructed
//! object holding every [`label::Label`] (a pure predicate over a job document) and every
//! [`operation::Operation`] (a unit of work gated by pre- and post-condition labels). The graph
//! derives the dependency edges between operations from their conditions and answers one
//! question at dispatch time: which operations is this job eligible for right now?
//!
//! Cluster dispatch lives alongside: [`environment`] selects a deployment profile for the
//! current host, and [`template`] renders the submission scripts for it.

pub mod environment;
pub mod error;
pub mod graph;
pub mod label;
pub mod operation;
pub mod template;
