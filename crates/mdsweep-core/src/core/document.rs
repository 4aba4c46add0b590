use serde::{Deserialize, Serialize};

pub const MASS_UNITS: &str = "amu";
pub const ENERGY_UNITS: &str = "kJ/mol";
pub const LENGTH_UNITS: &str = "nm";
pub const TIME_UNITS: &str = "fs";

/// Reference units derived by the simulation engine, in [`MASS_UNITS`], [`ENERGY_UNITS`],
/// [`LENGTH_UNITS`] and [`TIME_UNITS`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReferenceUnits {
    pub ref_mass: f64,
    pub ref_energy: f64,
    pub ref_length: f64,
    pub real_time_step: f64,
}

/// Persisted status and metadata of a job.
///
/// Unknown keys are rejected when a document is read, so a misspelled key surfaces as an
/// error instead of a silently ignored flag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobDocument {
    #[serde(default)]
    pub nvt_done: bool,
    #[serde(default)]
    pub sample_done: bool,

    #[serde(rename = "tau_kT", default, skip_serializing_if = "Option::is_none")]
    pub tau_kt: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_mass: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_mass_units: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_energy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_energy_units: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_length: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_length_units: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_time_step: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_time_units: Option<String>,
}

impl JobDocument {
    pub fn record_reference_units(&mut self, units: &ReferenceUnits) {
        self.ref_mass = Some(units.ref_mass);
        self.ref_mass_units = Some(MASS_UNITS.to_string());
        self.ref_energy = Some(units.ref_energy);
        self.ref_energy_units = Some(ENERGY_UNITS.to_string());
        self.ref_length = Some(units.ref_length);
        self.ref_length_units = Some(LENGTH_UNITS.to_string());
        self.real_time_step = Some(units.real_time_step);
        self.real_time_units = Some(TIME_UNITS.to_string());
    }

    /// True when mass, energy and length are all recorded together with their unit labels.
    pub fn has_reference_units(&self) -> bool {
        self.ref_mass.is_some()
            && self.ref_mass_units.is_some()
            && self.ref_energy.is_some()
            && self.ref_energy_units.is_some()
            && self.ref_length.is_some()
            && self.ref_length_units.is_some()
    }

    pub fn reference_units(&self) -> Option<ReferenceUnits> {
        Some(ReferenceUnits {
            ref_mass: self.ref_mass?,
            ref_energy: self.ref_energy?,
            ref_length: self.ref_length?,
            real_time_step: self.real_time_step?,
        })
    }
}
