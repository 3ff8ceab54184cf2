use std::fmt;

use serde::{Deserialize, Serialize};

/// Allowed gap between `total_time` and the sum of the six subtask times.
/// The service rounds each field independently.
pub const TOTAL_TIME_TOLERANCE_SECS: f64 = 0.05;

/// The six phases of a Timed-Up-and-Go trial, in clinical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subtask {
    SitToStand,
    WalkFromChair,
    TurnFirst,
    WalkToChair,
    TurnSecond,
    StandToSit,
}

impl Subtask {
    pub const ALL: [Subtask; 6] = [
        Subtask::SitToStand,
        Subtask::WalkFromChair,
        Subtask::TurnFirst,
        Subtask::WalkToChair,
        Subtask::TurnSecond,
        Subtask::StandToSit,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Subtask::SitToStand => "Sit to Stand",
            Subtask::WalkFromChair => "Walk from Chair",
            Subtask::TurnFirst => "Turn First",
            Subtask::WalkToChair => "Walk to Chair",
            Subtask::TurnSecond => "Turn Second",
            Subtask::StandToSit => "Stand to Sit",
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Subtask::SitToStand => "sit_to_stand",
            Subtask::WalkFromChair => "walk_from_chair",
            Subtask::TurnFirst => "turn_first",
            Subtask::WalkToChair => "walk_to_chair",
            Subtask::TurnSecond => "turn_second",
            Subtask::StandToSit => "stand_to_sit",
        }
    }

    /// Parse either the wire key (`turn_first`) or the display label (`Turn First`).
    pub fn parse(value: &str) -> Option<Subtask> {
        let normalized = value.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        Subtask::ALL.into_iter().find(|s| s.key() == normalized)
    }
}

impl fmt::Display for Subtask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Seconds spent in each subtask, in clinical order.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SubtaskDurations {
    pub sit_to_stand: f64,
    pub walk_from_chair: f64,
    pub turn_first: f64,
    pub walk_to_chair: f64,
    pub turn_second: f64,
    pub stand_to_sit: f64,
}

impl SubtaskDurations {
    pub fn from_array(values: [f64; 6]) -> Self {
        let [
            sit_to_stand,
            walk_from_chair,
            turn_first,
            walk_to_chair,
            turn_second,
            stand_to_sit,
        ] = values;
        Self {
            sit_to_stand,
            walk_from_chair,
            turn_first,
            walk_to_chair,
            turn_second,
            stand_to_sit,
        }
    }

    pub fn as_array(&self) -> [f64; 6] {
        [
            self.sit_to_stand,
            self.walk_from_chair,
            self.turn_first,
            self.walk_to_chair,
            self.turn_second,
            self.stand_to_sit,
        ]
    }

    pub fn get(&self, subtask: Subtask) -> f64 {
        match subtask {
            Subtask::SitToStand => self.sit_to_stand,
            Subtask::WalkFromChair => self.walk_from_chair,
            Subtask::TurnFirst => self.turn_first,
            Subtask::WalkToChair => self.walk_to_chair,
            Subtask::TurnSecond => self.turn_second,
            Subtask::StandToSit => self.stand_to_sit,
        }
    }

    pub fn total(&self) -> f64 {
        self.as_array().iter().sum()
    }
}

impl From<&TugMetrics> for SubtaskDurations {
    fn from(metrics: &TugMetrics) -> Self {
        Self {
            sit_to_stand: metrics.sit_to_stand_time,
            walk_from_chair: metrics.walk_from_chair_time,
            turn_first: metrics.turn_first_time,
            walk_to_chair: metrics.walk_to_chair_time,
            turn_second: metrics.turn_second_time,
            stand_to_sit: metrics.stand_to_sit_time,
        }
    }
}

/// A seekable slice of the trial video covering one subtask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineSegment {
    pub subtask: Subtask,
    pub start_offset_millis: u64,
    pub end_offset_millis: u64,
}

impl TimelineSegment {
    pub fn label(&self) -> &'static str {
        self.subtask.label()
    }

    pub fn duration_millis(&self) -> u64 {
        self.end_offset_millis.saturating_sub(self.start_offset_millis)
    }

    /// Closed-range membership: both ends inclusive.
    pub fn contains(&self, position_millis: i64) -> bool {
        u64::try_from(position_millis)
            .is_ok_and(|p| p >= self.start_offset_millis && p <= self.end_offset_millis)
    }
}

/// Metric objects decode leniently: a missing or `null` value reads as zero
/// and counts may arrive as floats (`14.0`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GaitMetrics {
    #[serde(deserialize_with = "lenient::count")]
    pub step_count: u32,
    #[serde(deserialize_with = "lenient::number")]
    pub mean_step_length: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub stride_time: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub cadence: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub step_symmetry: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub left_knee_range: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub right_knee_range: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub upper_body_sway: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub turn1_duration: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub turn2_duration: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TugMetrics {
    #[serde(deserialize_with = "lenient::number")]
    pub sit_to_stand_time: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub walk_from_chair_time: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub turn_first_time: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub walk_to_chair_time: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub turn_second_time: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub stand_to_sit_time: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub total_time: f64,
}

impl TugMetrics {
    pub fn subtask_sum(&self) -> f64 {
        SubtaskDurations::from(self).total()
    }

    /// Whether `total_time` agrees with the subtask sum within `tolerance` seconds.
    pub fn is_reconciled(&self, tolerance: f64) -> bool {
        (self.total_time - self.subtask_sum()).abs() <= tolerance
    }

    pub fn walking_time(&self) -> f64 {
        self.walk_from_chair_time + self.walk_to_chair_time
    }

    pub fn turning_time(&self) -> f64 {
        self.turn_first_time + self.turn_second_time
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingInfo {
    #[serde(deserialize_with = "lenient::count")]
    pub total_frames: u32,
    #[serde(deserialize_with = "lenient::count")]
    pub processed_frames: u32,
    #[serde(deserialize_with = "lenient::number")]
    pub fps: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub processing_time_seconds: f64,
}

/// Body of `POST /analyze_gait` exactly as the service sends it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyzeGaitBody {
    pub success: bool,
    pub gait_metrics: Option<GaitMetrics>,
    pub tug_metrics: Option<TugMetrics>,
    pub severity: Option<String>,
    pub processing_info: Option<ProcessingInfo>,
    pub request_id: Option<String>,
    pub error: Option<String>,
    pub error_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSuccess {
    pub gait_metrics: Option<GaitMetrics>,
    pub tug_metrics: Option<TugMetrics>,
    pub severity: Option<String>,
    pub processing_info: Option<ProcessingInfo>,
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisFailure {
    pub error_message: String,
    pub error_type: Option<String>,
}

/// Outcome of an analysis request that reached the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AnalysisResponse {
    Success(AnalysisSuccess),
    Failure(AnalysisFailure),
}

impl AnalysisResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, AnalysisResponse::Success(_))
    }

    pub fn as_success(&self) -> Option<&AnalysisSuccess> {
        match self {
            AnalysisResponse::Success(success) => Some(success),
            AnalysisResponse::Failure(_) => None,
        }
    }
}

impl From<AnalyzeGaitBody> for AnalysisResponse {
    fn from(body: AnalyzeGaitBody) -> Self {
        if body.success {
            AnalysisResponse::Success(AnalysisSuccess {
                gait_metrics: body.gait_metrics,
                tug_metrics: body.tug_metrics,
                severity: body.severity,
                processing_info: body.processing_info,
                request_id: body.request_id,
            })
        } else {
            let error_message = body
                .error
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| "Analysis failed".to_string());
            AnalysisResponse::Failure(AnalysisFailure {
                error_message,
                error_type: body.error_type,
            })
        }
    }
}

/// Body of `GET /health`. Unknown fields are ignored; a missing or `null`
/// field reads as unhealthy.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HealthBody {
    #[serde(deserialize_with = "lenient::or_default")]
    pub status: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub models_loaded: bool,
}

impl HealthBody {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy" && self.models_loaded
    }
}

mod lenient {
    use serde::{Deserialize, Deserializer};

    pub fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or_default())
    }

    /// Whole counts, also from float encodings. Negative or NaN reads as 0.
    pub fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        let value = Option::<f64>::deserialize(deserializer)?.unwrap_or_default();
        Ok(value as u32)
    }

    pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Default + Deserialize<'de>,
    {
        Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
    }
}
