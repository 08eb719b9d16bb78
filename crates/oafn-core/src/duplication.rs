use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::fmt::Debug;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use log::{debug, warn};

use crate::error::ConfigError;

/// What happens when two services in one run produce an artifact with the
/// same name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicationMode {
    /// Later services rewrite the artifact.
    #[default]
    Overwrite,
    /// The first service to produce an artifact wins.
    Once,
}

impl FromStr for DuplicationMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "overwrite" => Ok(Self::Overwrite),
            "once" => Ok(Self::Once),
            _ => Err(ConfigError::UnknownDuplicationMode(s.to_string())),
        }
    }
}

/// Run-wide record of the artifacts written so far.
///
/// Created once per run and threaded through every service.
#[derive(Debug, Default)]
pub struct DuplicationRegistry {
    mode: DuplicationMode,
    /// Artifact name to the fingerprint of the first version recorded.
    generated: HashMap<String, Option<u64>>,
}

impl DuplicationRegistry {
    pub fn new(mode: DuplicationMode) -> Self {
        Self {
            mode,
            generated: HashMap::new(),
        }
    }

    pub fn mode(&self) -> DuplicationMode {
        self.mode
    }

    /// Whether `name` may be generated. Only `once` ever says no.
    pub fn should_generate(&self, name: &str) -> bool {
        if self.mode == DuplicationMode::Overwrite || !self.generated.contains_key(name) {
            return true;
        }
        warn!("{name} was already generated in this run, skipping (duplicates: once)");
        false
    }

    /// Mark `name` as generated. Recording a name twice keeps the first entry.
    pub fn record_generated(&mut self, name: &str) {
        self.generated.entry(name.to_string()).or_insert(None);
    }

    /// Record `name` together with a fingerprint of what was generated for it.
    pub fn record_generated_with(&mut self, name: &str, artifact: &impl Debug) {
        let print = fingerprint(artifact);
        let entry = self.generated.entry(name.to_string()).or_insert(None);
        if entry.is_none() || self.mode == DuplicationMode::Overwrite {
            *entry = Some(print);
        }
    }

    /// True when `name` was recorded with a fingerprint that `artifact` does
    /// not match.
    pub fn is_structurally_different(&self, name: &str, artifact: &impl Debug) -> bool {
        matches!(
            self.generated.get(name),
            Some(Some(print)) if *print != fingerprint(artifact)
        )
    }

    /// Check and record in one step. A skipped duplicate that differs from
    /// the recorded version is reported, since the earlier output wins.
    pub fn admit(&mut self, name: &str, artifact: &impl Debug) -> bool {
        if self.should_generate(name) {
            self.record_generated_with(name, artifact);
            debug!("admitted {name}");
            return true;
        }
        if self.is_structurally_different(name, artifact) {
            warn!("{name} differs from the version generated earlier in this run; the earlier one is kept");
        }
        false
    }
}

fn fingerprint(artifact: &impl Debug) -> u64 {
    let mut hasher = DefaultHasher::new();
    format!("{artifact:?}").hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_modes_case_insensitively() {
        assert_eq!("once".parse::<DuplicationMode>().unwrap(), DuplicationMode::Once);
        assert_eq!(" Once ".parse::<DuplicationMode>().unwrap(), DuplicationMode::Once);
        assert_eq!(
            "OVERWRITE".parse::<DuplicationMode>().unwrap(),
            DuplicationMode::Overwrite
        );
        assert!(matches!(
            "twice".parse::<DuplicationMode>(),
            Err(ConfigError::UnknownDuplicationMode(m)) if m == "twice"
        ));
    }

    #[test]
    fn overwrite_always_generates() {
        let mut registry = DuplicationRegistry::new(DuplicationMode::Overwrite);
        registry.record_generated("Pet");
        assert!(registry.should_generate("Pet"));
        assert!(registry.admit("Pet", &1));
        assert!(registry.admit("Pet", &2));
    }

    #[test]
    fn once_generates_each_name_once() {
        let mut registry = DuplicationRegistry::new(DuplicationMode::Once);
        assert!(registry.should_generate("Pet"));
        registry.record_generated("Pet");
        registry.record_generated("Pet");
        assert!(!registry.should_generate("Pet"));
        assert!(registry.should_generate("Order"));
    }

    #[test]
    fn once_tracks_structural_differences() {
        let mut registry = DuplicationRegistry::new(DuplicationMode::Once);
        assert!(registry.admit("Pet", &vec!["name"]));
        assert!(!registry.admit("Pet", &vec!["name"]));
        assert!(!registry.is_structurally_different("Pet", &vec!["name"]));
        assert!(registry.is_structurally_different("Pet", &vec!["name", "age"]));
        assert!(!registry.admit("Pet", &vec!["name", "age"]));
    }
}
