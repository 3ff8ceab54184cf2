//! Keeps the highlighted subtask in step with a video player.
//!
//! Players here expose their position by polling rather than by pushing
//! updates, so the tracker samples a [`PlaybackClock`] on a fixed interval and
//! republishes through a `watch` channel whenever something visible changed.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{broadcast, watch},
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tracing::debug;

use crate::{
    timeline::active_segment,
    types::{Subtask, TimelineSegment},
};

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Read-only view of a video player.
pub trait PlaybackClock: Send + Sync {
    fn position_millis(&self) -> i64;
    fn is_playing(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackState {
    pub position_millis: i64,
    pub is_playing: bool,
    pub active: Option<TimelineSegment>,
}

impl PlaybackState {
    pub fn active_subtask(&self) -> Option<Subtask> {
        self.active.map(|s| s.subtask)
    }
}

pub struct PositionTracker {
    timeline: Vec<TimelineSegment>,
    poll_interval: Duration,
}

impl PositionTracker {
    pub fn new(timeline: Vec<TimelineSegment>, poll_interval: Duration) -> Self {
        Self {
            timeline,
            poll_interval: poll_interval.max(MIN_POLL_INTERVAL),
        }
    }

    pub fn timeline(&self) -> &[TimelineSegment] {
        &self.timeline
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn active_at(&self, position_millis: i64) -> Option<&TimelineSegment> {
        active_segment(position_millis, &self.timeline)
    }

    pub fn sample(&self, clock: &dyn PlaybackClock) -> PlaybackState {
        let position_millis = clock.position_millis();
        PlaybackState {
            position_millis,
            is_playing: clock.is_playing(),
            active: self.active_at(position_millis).copied(),
        }
    }

    /// Poll `clock` in the background until `shutdown` fires or every
    /// receiver is dropped.
    pub fn spawn(
        self,
        clock: Arc<dyn PlaybackClock>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> (watch::Receiver<PlaybackState>, JoinHandle<()>) {
        let (tx, rx) = watch::channel(self.sample(clock.as_ref()));

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = shutdown.recv() => break,
                    _ = tx.closed() => break,
                    _ = ticker.tick() => {
                        let next = self.sample(clock.as_ref());
                        tx.send_if_modified(|current| {
                            if *current == next {
                                return false;
                            }
                            if current.active_subtask() != next.active_subtask() {
                                debug!(
                                    position_ms = next.position_millis,
                                    subtask = ?next.active_subtask(),
                                    "active subtask changed"
                                );
                            }
                            *current = next;
                            true
                        });
                    }
                }
            }
        });

        (rx, handle)
    }
}
