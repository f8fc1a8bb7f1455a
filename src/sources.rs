//! Simulated marine-health data source.
//!
//! The pipeline treats data sourcing as an external collaborator that hands
//! over a fixed-shape reading; this module is that collaborator for the CLI.
//! Readings vary around a base index and carry a sampled set of key issues.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::domain::profile::{SeverityLevel, SubjectData};

const BASE_INDEX: f64 = 78.4;
const DEFAULT_REGION: &str = "Bay of Bengal";
const DEFAULT_COORDINATES: &str = "21.0000 N, 90.0000 E";

const KEY_ISSUES: [&str; 6] = [
    "microplastic contamination increasing by 12%",
    "coral bleaching events in 34% of monitored reefs",
    "fish population decline in commercial zones",
    "coastal water quality improvements in urban areas",
    "successful marine protected area expansions",
    "renewable energy adoption in shipping industry",
];

/// One marine-health reading, as supplied by the (simulated) data
/// collaborator.
#[derive(Debug, Clone)]
pub struct MarineReading {
    pub index: f64,
    pub region: String,
    pub coordinates: String,
    pub severity: SeverityLevel,
    pub recent_changes: String,
    pub key_issues: Vec<String>,
}

impl MarineReading {
    /// Flatten the reading into the opaque subject map the pipeline consumes.
    pub fn to_subject_data(&self) -> SubjectData {
        SubjectData::new()
            .with("index", format!("{:.1}", self.index))
            .with("region", self.region.clone())
            .with("coordinates", self.coordinates.clone())
            .with("severity", self.severity.as_str())
            .with("urgency", self.severity.urgency())
            .with("recent_changes", self.recent_changes.clone())
            .with("issues", self.key_issues.join("; "))
    }
}

/// Sample a reading around the base index.
pub fn sample_reading() -> MarineReading {
    let mut rng = rand::thread_rng();
    let variation: f64 = rng.gen_range(-5.0..=5.0);
    let index = (BASE_INDEX + variation).clamp(0.0, 100.0);

    let key_issues = KEY_ISSUES
        .choose_multiple(&mut rng, 3)
        .map(|issue| issue.to_string())
        .collect();

    MarineReading {
        index,
        region: DEFAULT_REGION.to_string(),
        coordinates: DEFAULT_COORDINATES.to_string(),
        severity: SeverityLevel::from_index(index),
        recent_changes: format!("Index changed by {:+.1} points in the last 30 days", variation),
        key_issues,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_reading_is_in_range() {
        for _ in 0..50 {
            let reading = sample_reading();
            assert!(reading.index >= 0.0 && reading.index <= 100.0);
            assert_eq!(reading.key_issues.len(), 3);
            assert_eq!(reading.severity, SeverityLevel::from_index(reading.index));
        }
    }

    #[test]
    fn test_subject_data_shape() {
        let reading = sample_reading();
        let subject = reading.to_subject_data();

        assert!(!subject.is_empty());
        assert_eq!(subject.get("region"), Some(DEFAULT_REGION));
        assert!(subject.get("issues").unwrap().contains("; "));
        assert!(subject.get("index").is_some());
    }
}
