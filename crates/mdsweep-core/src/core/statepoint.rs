use super::hashing::content_hash;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Number of hex characters in a job id.
pub const JOB_ID_LEN: usize = 32;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum StatePointError {
    #[error("Missing required metadata '{key}'")]
    MissingMetadata { key: String },
    #[error("Invalid metadata '{key}': {reason}")]
    InvalidMetadata { key: String, reason: String },
}

/// Content-derived identifier of a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn parse(s: &str) -> Option<Self> {
        let valid = s.len() == JOB_ID_LEN
            && s.chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
        valid.then(|| Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn short(&self) -> &str {
        &self.0[..8]
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One concrete combination of simulation parameters.
///
/// Parameters are kept in a sorted map, so two state points built from the same
/// name/value pairs compare equal and hash to the same [`JobId`] regardless of the order in
/// which the pairs were inserted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatePoint(BTreeMap<String, Value>);

impl StatePoint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn id(&self) -> JobId {
        let mut hash = content_hash(&self.to_value());
        hash.truncate(JOB_ID_LEN);
        JobId(hash)
    }

    pub fn to_value(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<Map<String, Value>>(),
        )
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn require(&self, key: &str) -> Result<&Value, StatePointError> {
        self.0.get(key).ok_or_else(|| StatePointError::MissingMetadata {
            key: key.to_string(),
        })
    }

    pub fn get_f64(&self, key: &str) -> Result<f64, StatePointError> {
        let value = self.require(key)?;
        value.as_f64().ok_or_else(|| invalid(key, "expected a number", value))
    }

    /// Reads a non-negative integer. Integral floats such as `5e5` are accepted, since grid
    /// files commonly write step counts in exponent notation.
    pub fn get_u64(&self, key: &str) -> Result<u64, StatePointError> {
        let value = self.require(key)?;
        if let Some(n) = value.as_u64() {
            return Ok(n);
        }
        match value.as_f64() {
            Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => Ok(f as u64),
            _ => Err(invalid(key, "expected a non-negative integer", value)),
        }
    }

    pub fn get_usize(&self, key: &str) -> Result<usize, StatePointError> {
        let n = self.get_u64(key)?;
        usize::try_from(n).map_err(|_| StatePointError::InvalidMetadata {
            key: key.to_string(),
            reason: format!("{} does not fit in usize", n),
        })
    }

    pub fn get_bool(&self, key: &str) -> Result<bool, StatePointError> {
        let value = self.require(key)?;
        value.as_bool().ok_or_else(|| invalid(key, "expected a boolean", value))
    }

    pub fn get_str(&self, key: &str) -> Result<&str, StatePointError> {
        let value = self.require(key)?;
        value.as_str().ok_or_else(|| invalid(key, "expected a string", value))
    }

    /// Compact `key=value` rendering used in status tables.
    pub fn summary(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn invalid(key: &str, expected: &str, found: &Value) -> StatePointError {
    StatePointError::InvalidMetadata {
        key: key.to_string(),
        reason: format!("{}, found {}", expected, found),
    }
}

impl FromIterator<(String, Value)> for StatePoint {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn id_is_independent_of_insertion_order() {
        let a = StatePoint::new().with("lengths", 20).with("chains", 50);
        let b = StatePoint::new().with("chains", 50).with("lengths", 20);
        assert_eq!(a, b);
        assert_eq!(a.id(), b.id());
        assert_eq!(a.id().as_str().len(), JOB_ID_LEN);
    }

    #[test]
    fn id_differs_for_different_values() {
        let a = StatePoint::new().with("lengths", 20);
        let b = StatePoint::new().with("lengths", 30);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn job_id_parse_accepts_only_lowercase_hex_of_full_length() {
        let id = StatePoint::new().with("kT", 4.2).id();
        assert_eq!(JobId::parse(id.as_str()), Some(id.clone()));
        assert!(JobId::parse(&id.as_str().to_uppercase()).is_none());
        assert!(JobId::parse(&id.as_str()[..10]).is_none());
        assert!(JobId::parse("workspace").is_none());
        assert_eq!(id.short().len(), 8);
    }

    #[test]
    fn typed_accessors_read_values() {
        let sp = StatePoint::new()
            .with("lengths", 20)
            .with("n_steps", 5e7)
            .with("dt", 0.0003)
            .with("auto_scale", true)
            .with("label", "pps");

        assert_eq!(sp.get_usize("lengths"), Ok(20));
        assert_eq!(sp.get_u64("n_steps"), Ok(50_000_000));
        assert_eq!(sp.get_f64("dt"), Ok(0.0003));
        assert_eq!(sp.get_f64("lengths"), Ok(20.0));
        assert_eq!(sp.get_bool("auto_scale"), Ok(true));
        assert_eq!(sp.get_str("label"), Ok("pps"));
    }

    #[test]
    fn typed_accessors_fail_with_descriptive_errors() {
        let sp = StatePoint::new().with("lengths", 20.5).with("chains", json!("fifty"));

        assert_eq!(
            sp.get_u64("density"),
            Err(StatePointError::MissingMetadata {
                key: "density".to_string()
            })
        );
        assert!(matches!(
            sp.get_u64("lengths"),
            Err(StatePointError::InvalidMetadata { ref key, .. }) if key == "lengths"
        ));
        assert!(matches!(
            sp.get_f64("chains"),
            Err(StatePointError::InvalidMetadata { ref key, .. }) if key == "chains"
        ));
    }

    #[test]
    fn serializes_as_plain_json_object() {
        let sp = StatePoint::new().with("lengths", 20).with("chains", 50);
        let text = serde_json::to_string(&sp).unwrap();
        assert_eq!(text, "{\"chains\":50,\"lengths\":20}");
        let back: StatePoint = serde_json::from_str(&text).unwrap();
        assert_eq!(back.id(), sp.id());
    }
}
