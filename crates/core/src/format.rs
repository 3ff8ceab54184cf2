use crate::{
    record::TugAnalysisRecord,
    types::{AnalysisResponse, AnalysisSuccess, Subtask, SubtaskDurations, TimelineSegment},
};

/// Format a playback position as seconds with two decimals, e.g. `2.50 s`
pub fn format_time_seconds(millis: i64) -> String {
    format!("{:.2} s", millis as f64 / 1000.0)
}

/// One line per subtask, marking the active one
pub fn format_timeline(timeline: &[TimelineSegment], active: Option<&TimelineSegment>) -> String {
    timeline
        .iter()
        .map(|seg| {
            let marker = if active == Some(seg) { "▶" } else { " " };
            format!(
                "{} {:<16} {:>9} – {:>9}  ({:.2} s)",
                marker,
                seg.label(),
                format_time_seconds(seg.start_offset_millis as i64),
                format_time_seconds(seg.end_offset_millis as i64),
                seg.duration_millis() as f64 / 1000.0
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format an analysis outcome as human-readable markdown
pub fn format_response_readable(response: &AnalysisResponse) -> String {
    match response {
        AnalysisResponse::Success(success) => format_success(success),
        AnalysisResponse::Failure(failure) => {
            let mut output = String::from("# Analysis failed\n\n");
            output.push_str(&failure.error_message);
            output.push('\n');
            if let Some(error_type) = &failure.error_type {
                output.push_str(&format!("\n**Reason:** {}\n", error_type));
            }
            output
        }
    }
}

fn format_success(success: &AnalysisSuccess) -> String {
    let mut output = String::new();

    output.push_str("# Gait analysis\n\n");
    output.push_str(&format!(
        "**Severity:** {} | **Request:** {}\n\n",
        success.severity.as_deref().unwrap_or("n/a"),
        success.request_id.as_deref().unwrap_or("n/a")
    ));

    if let Some(tug) = &success.tug_metrics {
        output.push_str("## TUG timings\n\n");
        let durations = SubtaskDurations::from(tug);
        for subtask in Subtask::ALL {
            output.push_str(&format!(
                "• {}: {:.2} s\n",
                subtask.label(),
                durations.get(subtask)
            ));
        }
        output.push_str(&format!("• Total: {:.2} s\n\n", tug.total_time));
    }

    if let Some(gait) = &success.gait_metrics {
        output.push_str("## Gait\n\n");
        output.push_str(&format!("• Steps: {}\n", gait.step_count));
        output.push_str(&format!("• Mean step length: {:.2}\n", gait.mean_step_length));
        output.push_str(&format!("• Stride time: {:.2} s\n", gait.stride_time));
        output.push_str(&format!("• Cadence: {:.1} steps/min\n", gait.cadence));
        output.push_str(&format!("• Step symmetry: {:.2}\n", gait.step_symmetry));
        output.push_str(&format!(
            "• Knee range (L/R): {:.1}° / {:.1}°\n",
            gait.left_knee_range, gait.right_knee_range
        ));
        output.push_str(&format!("• Upper body sway: {:.2}\n", gait.upper_body_sway));
        output.push_str(&format!(
            "• Turn durations: {:.2} s / {:.2} s\n\n",
            gait.turn1_duration, gait.turn2_duration
        ));
    }

    if let Some(info) = &success.processing_info {
        output.push_str(&format!(
            "_Processed {}/{} frames at {:.1} fps in {:.1} s_\n",
            info.processed_frames, info.total_frames, info.fps, info.processing_time_seconds
        ));
    }

    output
}

/// Short summary of a stored analysis
pub fn format_record(record: &TugAnalysisRecord) -> String {
    let mut output = format!(
        "Severity: {} | Time taken: {:.2} s | Steps: {}",
        record.severity, record.time_taken, record.step_count
    );
    if !record.reconciled {
        output.push_str(&format!(
            " | ⚠ subtasks sum to {:.2} s",
            record.durations.total()
        ));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        timeline::build_timeline,
        types::{AnalysisFailure, TugMetrics},
    };

    #[test]
    fn test_format_time_seconds() {
        assert_eq!(format_time_seconds(2500), "2.50 s");
        assert_eq!(format_time_seconds(0), "0.00 s");
        assert_eq!(format_time_seconds(13_250), "13.25 s");
    }

    #[test]
    fn test_format_timeline_marks_active() {
        let timeline = build_timeline(&SubtaskDurations::from_array([2.0, 3.5, 1.0, 3.5, 1.0, 2.0]));
        let text = format_timeline(&timeline, Some(&timeline[2]));
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert!(lines[2].starts_with('▶'));
        assert!(lines[2].contains("Turn First"));
        assert!(lines[0].starts_with(' '));
    }

    #[test]
    fn test_format_failure_uses_server_message() {
        let text = format_response_readable(&AnalysisResponse::Failure(AnalysisFailure {
            error_message: "No person detected in video".to_string(),
            error_type: Some("no_person".to_string()),
        }));
        assert!(text.contains("No person detected in video"));
        assert!(text.contains("no_person"));
    }

    #[test]
    fn test_format_success_lists_tug_timings() {
        let text = format_response_readable(&AnalysisResponse::Success(AnalysisSuccess {
            gait_metrics: None,
            tug_metrics: Some(TugMetrics {
                total_time: 9.5,
                ..Default::default()
            }),
            severity: Some("Slight".to_string()),
            processing_info: None,
            request_id: None,
        }));
        assert!(text.contains("**Severity:** Slight"));
        assert!(text.contains("• Total: 9.50 s"));
        assert!(!text.contains("## Gait"));
    }
}
