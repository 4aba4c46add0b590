use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Per-particle data of one frame.
///
/// Only the fields the workflows inspect are typed; everything else (velocities, images,
/// bodies, ...) is carried through `extra` untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Particles {
    pub types: Vec<String>,
    pub typeid: Vec<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub position: Vec<[f32; 3]>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Particles {
    pub fn len(&self) -> usize {
        self.typeid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.typeid.is_empty()
    }

    /// Appends a particle type label and returns its type index.
    pub fn add_type(&mut self, name: impl Into<String>) -> u32 {
        self.types.push(name.into());
        (self.types.len() - 1) as u32
    }
}

/// One simulation snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    #[serde(default)]
    pub step: u64,
    pub particles: Particles,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
