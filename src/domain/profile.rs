//! Audience profiles and subject data.
//!
//! A `SubjectData` is the opaque, ordered field map a data collaborator hands
//! to the pipeline; an `AudienceProfile` describes who a piece of content is
//! written for and in what register.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque, ordered mapping of domain fields describing the subject of a
/// content item (e.g. severity, region, index, issues).
///
/// The map is ordered so that renderings of the same data are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectData(BTreeMap<String, String>);

impl SubjectData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Get a field, or a fixed placeholder when the field is absent or blank.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        match self.get(key) {
            Some(value) if !value.trim().is_empty() => value,
            _ => default,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Stable `key=value; ...` rendering used as the audit data summary.
    pub fn summary(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Profile of the audience a content item targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudienceProfile {
    /// Organization or channel name (e.g. "Ocean Policy Institute")
    pub name: String,
    /// Who the content addresses (e.g. "Government Officials, Policy Makers")
    pub audience: String,
    /// Writing register (e.g. "formal, evidence-based, diplomatic")
    pub tone: String,
    /// Ordered themes to weave into the content
    pub focus_areas: Vec<String>,
    /// The ask the content closes with
    pub call_to_action: String,
    /// Optional signature contact line
    pub contact: Option<String>,
}

/// Severity band for a marine-health index reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityLevel {
    Excellent,
    Good,
    Fair,
    Poor,
    Critical,
}

impl SeverityLevel {
    /// Band an index in [0, 100] into a severity level.
    pub fn from_index(index: f64) -> Self {
        if index >= 80.0 {
            SeverityLevel::Excellent
        } else if index >= 60.0 {
            SeverityLevel::Good
        } else if index >= 40.0 {
            SeverityLevel::Fair
        } else if index >= 20.0 {
            SeverityLevel::Poor
        } else {
            SeverityLevel::Critical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityLevel::Excellent => "Excellent",
            SeverityLevel::Good => "Good",
            SeverityLevel::Fair => "Fair",
            SeverityLevel::Poor => "Poor",
            SeverityLevel::Critical => "Critical",
        }
    }

    /// Urgency phrase paired with the band.
    pub fn urgency(&self) -> &'static str {
        match self {
            SeverityLevel::Excellent => "CONTINUE EXCELLENT PRACTICES",
            SeverityLevel::Good => "MAINTAIN CURRENT EFFORTS",
            SeverityLevel::Fair => "IMPROVEMENT NEEDED",
            SeverityLevel::Poor => "URGENT ACTION REQUIRED",
            SeverityLevel::Critical => "IMMEDIATE INTERVENTION",
        }
    }
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
