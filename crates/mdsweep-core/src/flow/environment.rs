use super::error::FlowError;
use regex::Regex;
use std::fs;
use tracing::debug;

pub const LOCAL_ENVIRONMENT: &str = "local";
const SLURM_SUBMIT: &str = "sbatch";

/// A deployment environment: where and how eligible operations are submitted.
#[derive(Debug, Clone)]
pub struct EnvironmentProfile {
    name: String,
    hostname_pattern: Option<Regex>,
    template: Option<String>,
    partition: Option<String>,
    scheduler_command: Option<String>,
}

impl EnvironmentProfile {
    /// A SLURM cluster selected when the host name matches `pattern` at its start.
    pub fn cluster(
        name: &str,
        pattern: &str,
        template: &str,
        partition: &str,
    ) -> Result<Self, FlowError> {
        let anchored = format!("^(?:{})", pattern);
        let regex = Regex::new(&anchored).map_err(|source| FlowError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            name: name.to_string(),
            hostname_pattern: Some(regex),
            template: Some(template.to_string()),
            partition: Some(partition.to_string()),
            scheduler_command: Some(SLURM_SUBMIT.to_string()),
        })
    }

    /// The workstation fallback: matches no host and cannot submit.
    pub fn local() -> Self {
        Self {
            name: LOCAL_ENVIRONMENT.to_string(),
            hostname_pattern: None,
            template: None,
            partition: None,
            scheduler_command: None,
        }
    }

    pub fn with_partition(mut self, partition: impl Into<String>) -> Self {
        self.partition = Some(partition.into());
        self
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn with_scheduler_command(mut self, command: impl Into<String>) -> Self {
        self.scheduler_command = Some(command.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    pub fn partition(&self) -> Option<&str> {
        self.partition.as_deref()
    }

    pub fn scheduler_command(&self) -> Option<&str> {
        self.scheduler_command.as_deref()
    }

    pub fn can_submit(&self) -> bool {
        self.scheduler_command.is_some()
    }

    pub fn matches_host(&self, host: &str) -> bool {
        self.hostname_pattern
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(host))
    }
}

/// The set of known environments, consulted once at startup.
#[derive(Debug, Clone)]
pub struct EnvironmentRegistry {
    profiles: Vec<EnvironmentProfile>,
}

impl EnvironmentRegistry {
    /// The Borah and Fry clusters plus the local fallback.
    pub fn builtin() -> Result<Self, FlowError> {
        Ok(Self {
            profiles: vec![
                EnvironmentProfile::cluster("borah", "borah", "borah.sh", "shortgpu")?,
                EnvironmentProfile::cluster("fry", "fry", "fry.sh", "batch")?,
                EnvironmentProfile::local(),
            ],
        })
    }

    pub fn profiles(&self) -> &[EnvironmentProfile] {
        &self.profiles
    }

    pub fn get(&self, name: &str) -> Option<&EnvironmentProfile> {
        self.profiles.iter().find(|p| p.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut EnvironmentProfile> {
        self.profiles.iter_mut().find(|p| p.name() == name)
    }

    /// Adds `profile`, replacing any profile of the same name in place.
    pub fn insert(&mut self, profile: EnvironmentProfile) {
        match self.get_mut(profile.name()) {
            Some(existing) => *existing = profile,
            None => self.profiles.push(profile),
        }
    }

    /// Picks the environment to use.
    ///
    /// An explicitly forced name always wins. Otherwise the first profile whose host pattern
    /// matches `host` is used, and the local profile when none does.
    pub fn resolve(
        &self,
        forced: Option<&str>,
        host: Option<&str>,
    ) -> Result<EnvironmentProfile, FlowError> {
        if let Some(name) = forced {
            return self
                .get(name)
                .cloned()
                .ok_or_else(|| FlowError::UnknownEnvironment(name.to_string()));
        }
        if let Some(host) = host {
            if let Some(profile) = self.profiles.iter().find(|p| p.matches_host(host)) {
                debug!("Host '{}' matched environment '{}'", host, profile.name());
                return Ok(profile.clone());
            }
        }
        Ok(self
            .get(LOCAL_ENVIRONMENT)
            .cloned()
            .unwrap_or_else(EnvironmentProfile::local))
    }
}

/// Best-effort host name: `MDSWEEP_HOST`, then `HOSTNAME`, then `/etc/hostname`.
pub fn detect_hostname() -> Option<String> {
    let non_empty = |s: String| {
        let trimmed = s.trim().to_string();
        (!trimmed.is_empty()).then_some(trimmed)
    };
    std::env::var("MDSWEEP_HOST")
        .ok()
        .and_then(non_empty)
        .or_else(|| std::env::var("HOSTNAME").ok().and_then(non_empty))
        .or_else(|| fs::read_to_string("/etc/hostname").ok().and_then(non_empty))
}
