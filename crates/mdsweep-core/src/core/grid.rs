use super::statepoint::StatePoint;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// An ordered mapping of parameter name to candidate values.
///
/// Expansion produces the Cartesian product of all value lists. The first parameter varies
/// slowest, matching the declaration order of the grid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterGrid(IndexMap<String, Vec<Value>>);

impl ParameterGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<V: Into<Value>>(
        mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.insert(name, values.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the candidate values of `name`. Re-declaring a parameter replaces its values but
    /// keeps its original position.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<Value>) {
        self.0.insert(name.into(), values);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn values(&self, name: &str) -> Option<&[Value]> {
        self.0.get(name).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of state points [`expand`](Self::expand) yields.
    pub fn combinations(&self) -> usize {
        self.0.values().map(Vec::len).product()
    }

    pub fn expand(&self) -> Vec<StatePoint> {
        let mut partials: Vec<Vec<(String, Value)>> = vec![Vec::new()];
        for (name, values) in &self.0 {
            let mut next = Vec::with_capacity(partials.len() * values.len());
            for partial in &partials {
                for value in values {
                    let mut extended = partial.clone();
                    extended.push((name.clone(), value.clone()));
                    next.push(extended);
                }
            }
            partials = next;
        }
        partials.into_iter().map(StatePoint::from_iter).collect()
    }

    /// The chain-length sweep of coarse-grained PPS the harness was built for.
    pub fn reference_sweep() -> Self {
        Self::new()
            .with("lengths", [20, 30, 50, 80, 100, 150])
            .with("chains", [50])
            .with("density", [1.3])
            .with("remove_hydrogens", [true])
            .with("remove_charges", [true])
            .with("pppm_resolution", [json!([16, 16, 16])])
            .with("pppm_order", [4])
            .with("auto_scale", [true])
            .with("kT", [4.2])
            .with("n_steps", [5e7])
            .with("shrink_kT", [8.0])
            .with("shrink_n_steps", [5e5])
            .with("shrink_period", [10000])
            .with("r_cut", [2.5])
            .with("dt", [0.0003])
            .with("tau_kT", [100])
            .with("gsd_write_freq", [1e4])
            .with("log_write_freq", [1e3])
    }
}
