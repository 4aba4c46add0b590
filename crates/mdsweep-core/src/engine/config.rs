use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for {parameter}: {reason}")]
    InvalidValue {
        parameter: &'static str,
        reason: String,
    },
}

/// A `[start:stop:stride]` selection of trajectory frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRange {
    start: usize,
    stop: Option<usize>,
    stride: usize,
}

impl Default for FrameRange {
    fn default() -> Self {
        Self {
            start: 0,
            stop: None,
            stride: 1,
        }
    }
}

impl FrameRange {
    pub fn new(start: usize, stop: Option<usize>, stride: usize) -> Result<Self, ConfigError> {
        if stride == 0 {
            return Err(ConfigError::InvalidValue {
                parameter: "stride",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(Self {
            start,
            stop,
            stride,
        })
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn stop(&self) -> Option<usize> {
        self.stop
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Frame indices selected from a trajectory of `len` frames. A missing or oversized `stop`
    /// runs through the last frame.
    pub fn indices(&self, len: usize) -> impl Iterator<Item = usize> + use<> {
        let stop = self.stop.map_or(len, |stop| stop.min(len));
        let start = self.start.min(stop);
        (start..stop).step_by(self.stride)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelabelConfig {
    pub beads_from_center: usize,
    pub frames: FrameRange,
    pub new_type: String,
}

#[derive(Default)]
pub struct RelabelConfigBuilder {
    beads_from_center: Option<usize>,
    start: Option<usize>,
    stop: Option<usize>,
    stride: Option<usize>,
    new_type: Option<String>,
}

impl RelabelConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn beads_from_center(mut self, k: usize) -> Self {
        self.beads_from_center = Some(k);
        self
    }
    pub fn start(mut self, start: usize) -> Self {
        self.start = Some(start);
        self
    }
    pub fn stop(mut self, stop: Option<usize>) -> Self {
        self.stop = stop;
        self
    }
    pub fn stride(mut self, stride: usize) -> Self {
        self.stride = Some(stride);
        self
    }
    pub fn new_type(mut self, name: impl Into<String>) -> Self {
        self.new_type = Some(name.into());
        self
    }

    pub fn build(self) -> Result<RelabelConfig, ConfigError> {
        let new_type = self
            .new_type
            .ok_or(ConfigError::MissingParameter("new_type"))?;
        if new_type.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                parameter: "new_type",
                reason: "type label cannot be empty".to_string(),
            });
        }
        Ok(RelabelConfig {
            beads_from_center: self
                .beads_from_center
                .ok_or(ConfigError::MissingParameter("beads_from_center"))?,
            frames: FrameRange::new(self.start.unwrap_or(0), self.stop, self.stride.unwrap_or(1))?,
            new_type,
        })
    }
}
