use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::device::DeviceRecord;

/// Coarse quality band derived from the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityBand {
    Green,
    Amber,
    Red,
}

impl QualityBand {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.80 {
            Self::Green
        } else if score >= 0.50 {
            Self::Amber
        } else {
            Self::Red
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Green => "🟢",
            Self::Amber => "🟡",
            Self::Red => "🔴",
        }
    }
}

/// Data-quality metrics for one schema's live sample.
///
/// The four scores are each in [0, 1]; the overall score is the weighted
/// mean 0.30·completeness + 0.25·freshness + 0.25·consistency +
/// 0.20·accuracy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub schema_name: String,
    pub record_count: usize,
    pub completeness: f64,
    pub freshness: f64,
    pub consistency: f64,
    pub accuracy: f64,
    pub overall: f64,
    pub assessed_at: DateTime<Utc>,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl QualityMetrics {
    pub fn band(&self) -> QualityBand {
        QualityBand::from_score(self.overall)
    }
}

/// A bounded sample of live device records for one schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSample {
    pub schema_name: String,
    pub records: Vec<DeviceRecord>,
    /// Total records the source reported, which may exceed the sample size.
    pub total_count: usize,
    /// When the source generated this data.
    pub generated_at: DateTime<Utc>,
}

impl DataSample {
    pub fn empty(schema_name: impl Into<String>, generated_at: DateTime<Utc>) -> Self {
        Self {
            schema_name: schema_name.into(),
            records: vec![],
            total_count: 0,
            generated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_cutoffs() {
        assert_eq!(QualityBand::from_score(0.80), QualityBand::Green);
        assert_eq!(QualityBand::from_score(0.799), QualityBand::Amber);
        assert_eq!(QualityBand::from_score(0.50), QualityBand::Amber);
        assert_eq!(QualityBand::from_score(0.499), QualityBand::Red);
        assert_eq!(QualityBand::from_score(0.0), QualityBand::Red);
    }

    #[test]
    fn empty_sample_has_no_records() {
        let sample = DataSample::empty("ftth_olt", Utc::now());
        assert_eq!(sample.total_count, 0);
        assert!(sample.records.is_empty());
    }
}
