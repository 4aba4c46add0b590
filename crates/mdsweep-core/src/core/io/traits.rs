use super::frame::Frame;
use std::io;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrajectoryError {
    #[error("I/O error for trajectory '{path}': {source}")]
    Io { path: String, source: io::Error },
    #[error("Malformed frame {frame} in '{path}': {source}")]
    Decode {
        path: String,
        frame: usize,
        source: serde_json::Error,
    },
    #[error("Failed to encode frame for '{path}': {source}")]
    Encode {
        path: String,
        source: serde_json::Error,
    },
    #[error("Unsupported trajectory format in '{path}': {detected}")]
    UnsupportedFormat { path: String, detected: String },
    #[error("Frame {index} is out of range for '{path}' ({len} frames)")]
    FrameOutOfRange {
        path: String,
        index: usize,
        len: usize,
    },
}

/// Random-access reader over the frames of a trajectory opened read-only.
pub trait TrajectoryReader {
    /// Number of frames in the trajectory.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decodes the frame at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`TrajectoryError::FrameOutOfRange`] when `index >= len()`, or a decode error
    /// when the stored frame is malformed.
    fn frame(&mut self, index: usize) -> Result<Frame, TrajectoryError>;
}

/// Append-only writer of a new trajectory.
pub trait TrajectoryWriter {
    fn append(&mut self, frame: &Frame) -> Result<(), TrajectoryError>;

    /// Flushes buffered frames and syncs the file to disk.
    fn finish(self) -> Result<(), TrajectoryError>;
}

/// Defines a trajectory file format.
///
/// Implementors open existing trajectories strictly read-only and always create output
/// trajectories as new files, truncating any stale file at the same path.
pub trait TrajectoryFile {
    type Reader: TrajectoryReader;
    type Writer: TrajectoryWriter;

    fn open(path: &Path) -> Result<Self::Reader, TrajectoryError>;

    fn create(path: &Path) -> Result<Self::Writer, TrajectoryError>;
}
