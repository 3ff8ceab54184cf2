//! Subtask timelines for video review.
//!
//! A trial is partitioned into six contiguous segments. Boundaries are
//! computed from one running total and truncated to whole milliseconds, so
//! the end of one segment is always the start of the next.

use crate::types::{Subtask, SubtaskDurations, TimelineSegment};

fn seconds_to_millis(seconds: f64) -> u64 {
    // `as` truncates toward zero and saturates, which is the boundary policy.
    (seconds * 1000.0) as u64
}

/// Negative and NaN durations are treated as zero-length subtasks.
fn sanitize(seconds: f64) -> f64 {
    if seconds.is_nan() || seconds < 0.0 {
        0.0
    } else {
        seconds
    }
}

/// Build the six seekable segments for a trial.
pub fn build_timeline(durations: &SubtaskDurations) -> Vec<TimelineSegment> {
    let mut running_total = 0.0;

    Subtask::ALL
        .into_iter()
        .map(|subtask| {
            let start_offset_millis = seconds_to_millis(running_total);
            running_total += sanitize(durations.get(subtask));
            let end_offset_millis = seconds_to_millis(running_total);
            TimelineSegment {
                subtask,
                start_offset_millis,
                end_offset_millis,
            }
        })
        .collect()
}

/// The segment playing at `position_millis`.
///
/// First match in timeline order wins, so a position on a shared boundary
/// belongs to the earlier segment. Negative positions and positions past the
/// final segment have no active segment.
pub fn active_segment(
    position_millis: i64,
    timeline: &[TimelineSegment],
) -> Option<&TimelineSegment> {
    timeline.iter().find(|s| s.contains(position_millis))
}

/// Start offset to seek to when the reviewer taps a subtask.
pub fn seek_target(timeline: &[TimelineSegment], subtask: Subtask) -> Option<u64> {
    timeline
        .iter()
        .find(|s| s.subtask == subtask)
        .map(|s| s.start_offset_millis)
}

/// End of the last segment, i.e. the analysed length of the trial.
pub fn timeline_end(timeline: &[TimelineSegment]) -> u64 {
    timeline.last().map(|s| s.end_offset_millis).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn durations(values: [f64; 6]) -> SubtaskDurations {
        SubtaskDurations::from_array(values)
    }

    fn bounds(timeline: &[TimelineSegment]) -> Vec<(u64, u64)> {
        timeline
            .iter()
            .map(|s| (s.start_offset_millis, s.end_offset_millis))
            .collect()
    }

    #[test]
    fn test_build_timeline_reference_trial() {
        let timeline = build_timeline(&durations([2.0, 3.5, 1.0, 3.5, 1.0, 2.0]));
        assert_eq!(
            bounds(&timeline),
            vec![
                (0, 2000),
                (2000, 5500),
                (5500, 6500),
                (6500, 10000),
                (10000, 11000),
                (11000, 13000),
            ]
        );
        let labels: Vec<_> = timeline.iter().map(|s| s.label()).collect();
        assert_eq!(
            labels,
            vec![
                "Sit to Stand",
                "Walk from Chair",
                "Turn First",
                "Walk to Chair",
                "Turn Second",
                "Stand to Sit",
            ]
        );
    }

    #[test]
    fn test_build_timeline_is_contiguous() {
        let inputs = [
            [0.0; 6],
            [0.3333, 0.6667, 1.0001, 0.0005, 12.25, 0.1],
            [0.1, 0.2, 0.3, 0.4, 0.5, 0.6],
            [1e-4, 1e-4, 1e-4, 1e-4, 1e-4, 1e-4],
            [90.123, 0.0, 45.5, 0.0, 3.14159, 2.71828],
        ];

        for input in inputs {
            let timeline = build_timeline(&durations(input));
            assert_eq!(timeline.len(), 6);
            assert_eq!(timeline[0].start_offset_millis, 0);
            for s in &timeline {
                assert!(s.end_offset_millis >= s.start_offset_millis);
            }
            for pair in timeline.windows(2) {
                assert_eq!(pair[0].end_offset_millis, pair[1].start_offset_millis);
            }
        }
    }

    #[test]
    fn test_segment_lengths_sum_to_truncated_total() {
        let input = [1.2345, 2.3456, 0.9999, 3.0001, 1.5, 0.0004];
        let timeline = build_timeline(&durations(input));
        let summed: u64 = timeline.iter().map(|s| s.duration_millis()).sum();

        let mut total = 0.0;
        for d in input {
            total += d;
        }
        assert_eq!(summed, (total * 1000.0) as u64);
    }

    #[test]
    fn test_zero_duration_yields_empty_segment() {
        let timeline = build_timeline(&durations([1.0, 0.0, 1.0, 1.0, 1.0, 1.0]));
        assert_eq!(timeline[1].duration_millis(), 0);
        assert_eq!(timeline[1].start_offset_millis, 1000);
    }

    #[test]
    fn test_negative_and_nan_durations_clamp_to_zero() {
        let timeline = build_timeline(&durations([1.0, -2.0, f64::NAN, 1.0, 1.0, 1.0]));
        assert_eq!(
            bounds(&timeline),
            vec![
                (0, 1000),
                (1000, 1000),
                (1000, 1000),
                (1000, 2000),
                (2000, 3000),
                (3000, 4000),
            ]
        );
    }

    #[test]
    fn test_active_segment_interior_and_outside() {
        let timeline = build_timeline(&durations([2.0, 3.5, 1.0, 3.5, 1.0, 2.0]));

        assert_eq!(active_segment(-1, &timeline), None);
        assert_eq!(active_segment(13_001, &timeline), None);
        assert_eq!(
            active_segment(0, &timeline).map(|s| s.subtask),
            Some(Subtask::SitToStand)
        );
        assert_eq!(
            active_segment(6000, &timeline).map(|s| s.subtask),
            Some(Subtask::TurnFirst)
        );
        assert_eq!(
            active_segment(13_000, &timeline).map(|s| s.subtask),
            Some(Subtask::StandToSit)
        );
    }

    #[test]
    fn test_active_segment_boundary_prefers_earlier() {
        let timeline = build_timeline(&durations([2.0, 3.5, 1.0, 3.5, 1.0, 2.0]));
        assert_eq!(
            active_segment(2000, &timeline).map(|s| s.subtask),
            Some(Subtask::SitToStand)
        );
        assert_eq!(
            active_segment(2001, &timeline).map(|s| s.subtask),
            Some(Subtask::WalkFromChair)
        );
        assert_eq!(
            active_segment(10_000, &timeline).map(|s| s.subtask),
            Some(Subtask::WalkToChair)
        );
    }

    #[test]
    fn test_active_segment_empty_timeline() {
        assert_eq!(active_segment(0, &[]), None);
    }

    #[test]
    fn test_seek_target() {
        let timeline = build_timeline(&durations([2.0, 3.5, 1.0, 3.5, 1.0, 2.0]));
        assert_eq!(seek_target(&timeline, Subtask::TurnSecond), Some(10_000));
        assert_eq!(seek_target(&[], Subtask::TurnSecond), None);
        assert_eq!(timeline_end(&timeline), 13_000);
    }
}
