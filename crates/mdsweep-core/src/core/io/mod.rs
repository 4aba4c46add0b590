//! Provides input/output for simulation trajectories.
//!
//! Trajectories are sequences of [`frame::Frame`]s. The [`traits::TrajectoryFile`] trait is
//! the seam between the workflows and a concrete on-disk format; [`stream::FrameStreamFile`]
//! is the built-in newline-delimited JSON codec. Binary formats written by the external
//! simulation engine plug in behind the same trait.

pub mod frame;
pub mod stream;
pub mod traits;
