//! Severity rating from TUG timings.
//!
//! The service normally supplies a severity label. When it does not, the same
//! thresholds it uses are applied locally to the TUG metrics.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::TugMetrics;

/// Walking time below this is too short to form a turn/walk ratio.
const MIN_WALKING_SECS: f64 = 0.1;
const NORMAL_MAX_TOTAL_SECS: f64 = 7.0;
const SLIGHT_MAX_TOTAL_SECS: f64 = 13.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Normal,
    Slight,
    Mild,
    Moderate,
    Severe,
    Unknown,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Normal => "Normal",
            Severity::Slight => "Slight",
            Severity::Mild => "Mild",
            Severity::Moderate => "Moderate",
            Severity::Severe => "Severe",
            Severity::Unknown => "Unknown",
        }
    }

    /// Case-insensitive match against the service's labels.
    pub fn parse(label: &str) -> Severity {
        match label.trim().to_ascii_lowercase().as_str() {
            "normal" => Severity::Normal,
            "slight" => Severity::Slight,
            "mild" => Severity::Mild,
            "moderate" => Severity::Moderate,
            "severe" => Severity::Severe,
            _ => Severity::Unknown,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Turning time over walking time; zero when the walk was too short to measure.
pub fn turn_walk_ratio(metrics: &TugMetrics) -> f64 {
    let walking = metrics.walking_time();
    if walking > MIN_WALKING_SECS {
        metrics.turning_time() / walking
    } else {
        0.0
    }
}

pub fn classify(metrics: &TugMetrics) -> Severity {
    let total = metrics.total_time;
    let ratio = turn_walk_ratio(metrics);

    let severity = if total <= NORMAL_MAX_TOTAL_SECS && ratio < 1.0 {
        Severity::Normal
    } else if total <= SLIGHT_MAX_TOTAL_SECS && ratio < 1.0 {
        Severity::Slight
    } else if total <= SLIGHT_MAX_TOTAL_SECS && ratio >= 1.0 {
        Severity::Mild
    } else if total > SLIGHT_MAX_TOTAL_SECS && ratio > 1.0 {
        Severity::Severe
    } else if total > SLIGHT_MAX_TOTAL_SECS {
        Severity::Moderate
    } else {
        Severity::Unknown
    };

    debug!(total, ratio, severity = %severity, "classified severity");
    severity
}
