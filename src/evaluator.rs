//! Maps one frame's detection to an alert decision.

use std::collections::HashSet;

use crate::detector::Detection;
use crate::error::ConfigError;

/// Labels considered alert-worthy. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetClasses(HashSet<String>);

impl TargetClasses {
    pub fn new<I, S>(labels: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: HashSet<String> = labels
            .into_iter()
            .map(Into::into)
            .filter(|l| !l.trim().is_empty())
            .collect();
        if labels.is_empty() {
            return Err(ConfigError::NoTargetClasses);
        }
        Ok(Self(labels))
    }

    /// Comma-separated list, surrounding whitespace ignored.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        Self::new(raw.split(',').map(str::trim))
    }

    pub fn contains(&self, label: &str) -> bool {
        self.0.contains(label)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// True iff any detected label is a target class (exact, case-sensitive).
pub fn evaluate(detection: &Detection, targets: &TargetClasses) -> bool {
    detection.labels().any(|label| targets.contains(label))
}
