use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::{
    severity::{self, Severity},
    types::{AnalysisResponse, SubtaskDurations, TOTAL_TIME_TOLERANCE_SECS},
};

/// The fields of a successful analysis that get stored with an assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TugAnalysisRecord {
    pub severity: String,
    pub time_taken: f64,
    pub step_count: u32,
    pub durations: SubtaskDurations,
    pub request_id: Option<String>,
    /// `false` when `time_taken` disagrees with the summed subtasks.
    pub reconciled: bool,
    pub analyzed_at: SystemTime,
}

impl TugAnalysisRecord {
    /// `None` for a failed analysis or one without TUG metrics.
    pub fn from_response(response: &AnalysisResponse) -> Option<Self> {
        let success = response.as_success()?;
        let tug = success.tug_metrics.as_ref()?;

        // Known labels are stored in canonical case; unrecognised ones verbatim.
        let label = success.severity.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let severity = match label {
            Some(label) => match Severity::parse(label) {
                Severity::Unknown => label.to_string(),
                known => known.to_string(),
            },
            None => severity::classify(tug).to_string(),
        };

        Some(Self {
            severity,
            time_taken: tug.total_time,
            step_count: success
                .gait_metrics
                .as_ref()
                .map(|g| g.step_count)
                .unwrap_or(0),
            durations: SubtaskDurations::from(tug),
            request_id: success.request_id.clone(),
            reconciled: tug.is_reconciled(TOTAL_TIME_TOLERANCE_SECS),
            analyzed_at: SystemTime::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AnalysisFailure, AnalysisSuccess, GaitMetrics, TugMetrics};

    fn tug() -> TugMetrics {
        TugMetrics {
            sit_to_stand_time: 1.5,
            walk_from_chair_time: 2.5,
            turn_first_time: 1.0,
            walk_to_chair_time: 2.5,
            turn_second_time: 1.0,
            stand_to_sit_time: 1.5,
            total_time: 10.0,
        }
    }

    fn success(severity: Option<&str>, gait: Option<GaitMetrics>) -> AnalysisResponse {
        AnalysisResponse::Success(AnalysisSuccess {
            gait_metrics: gait,
            tug_metrics: Some(tug()),
            severity: severity.map(str::to_string),
            processing_info: None,
            request_id: Some("req-9".to_string()),
        })
    }

    #[test]
    fn test_server_severity_is_kept() {
        let gait = GaitMetrics {
            step_count: 14,
            ..Default::default()
        };
        let record = TugAnalysisRecord::from_response(&success(Some("Mild"), Some(gait))).unwrap();
        assert_eq!(record.severity, "Mild");
        assert_eq!(record.step_count, 14);
        assert_eq!(record.time_taken, 10.0);
        assert_eq!(record.durations.walk_to_chair, 2.5);
        assert_eq!(record.request_id.as_deref(), Some("req-9"));
        assert!(record.reconciled);
    }

    #[test]
    fn test_server_severity_label_is_normalised() {
        let shouting = TugAnalysisRecord::from_response(&success(Some(" MODERATE "), None)).unwrap();
        assert_eq!(shouting.severity, "Moderate");

        let custom = TugAnalysisRecord::from_response(&success(Some("low"), None)).unwrap();
        assert_eq!(custom.severity, "low");
    }

    #[test]
    fn test_missing_severity_is_classified_locally() {
        let record = TugAnalysisRecord::from_response(&success(None, None)).unwrap();
        assert_eq!(record.severity, "Slight");
        assert_eq!(record.step_count, 0);
    }

    #[test]
    fn test_no_record_without_tug_metrics_or_on_failure() {
        let without_tug = AnalysisResponse::Success(AnalysisSuccess {
            gait_metrics: Some(GaitMetrics::default()),
            tug_metrics: None,
            severity: Some("Normal".to_string()),
            processing_info: None,
            request_id: None,
        });
        assert!(TugAnalysisRecord::from_response(&without_tug).is_none());

        let failure = AnalysisResponse::Failure(AnalysisFailure {
            error_message: "video too short".to_string(),
            error_type: Some("too_short".to_string()),
        });
        assert!(TugAnalysisRecord::from_response(&failure).is_none());
    }
}
