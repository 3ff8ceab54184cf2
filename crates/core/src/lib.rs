//! Gaitguard Core Library
//!
//! Subtask timelines for reviewing Timed-Up-and-Go trial videos, and the
//! client that submits those videos to a remote gait analysis service.

pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod playback;
pub mod record;
pub mod severity;
pub mod store;
pub mod timeline;
pub mod transport;
pub mod types;

// Re-export commonly used items at crate root
pub use client::AnalysisClient;
pub use config::ClientConfig;
pub use error::{GaitError, Result, TransportError};
pub use format::{format_record, format_response_readable, format_time_seconds, format_timeline};
pub use playback::{PlaybackClock, PlaybackState, PositionTracker};
pub use record::TugAnalysisRecord;
pub use severity::Severity;
pub use store::{AssessmentId, AssessmentStore, JsonFileStore, default_data_dir};
pub use timeline::{active_segment, build_timeline, seek_target};
pub use transport::{AnalysisTransport, HttpReply, HttpTransport, VideoUpload};
pub use types::{
    AnalysisFailure, AnalysisResponse, AnalysisSuccess, GaitMetrics, ProcessingInfo, Subtask,
    SubtaskDurations, TimelineSegment, TugMetrics,
};
