//! Cooperative frame-time sleep.
//!
//! Pacing pauses (between adventurer steps, after dragon moves) must not
//! block the frame loop: input keeps flowing and rooms stay rotatable
//! while entities animate. A sleep is therefore just a wall-clock target
//! checked every frame; the session pauses the movement phases while the
//! timer runs and unpauses them once enough time has elapsed since the
//! last handled frame.

use std::time::{Duration, Instant};

/// Explicit timer state for the cooperative sleep.
#[derive(Clone, Debug)]
pub struct SleepTimer {
    /// Timestamp of the last frame that was handled while awake.
    last_handled: Instant,
    /// Active sleep target, when sleeping.
    target: Option<Duration>,
    /// Request raised from inside a tick, picked up by the session.
    requested: Option<Duration>,
}

impl SleepTimer {
    pub fn new() -> Self {
        Self {
            last_handled: Instant::now(),
            target: None,
            requested: None,
        }
    }

    /// Asks for a sleep of `duration`. The latest request wins.
    pub fn request(&mut self, duration: Duration) {
        self.requested = Some(duration);
    }

    pub(crate) fn take_request(&mut self) -> Option<Duration> {
        self.requested.take()
    }

    /// Starts sleeping; elapsed time counts from the last handled frame.
    pub(crate) fn begin(&mut self, duration: Duration) {
        self.target = Some(duration);
    }

    pub fn is_sleeping(&self) -> bool {
        self.target.is_some()
    }

    /// Ends the sleep once the target has elapsed.
    ///
    /// Returns true exactly once per sleep, on the frame that crosses
    /// the target; the handled-frame timestamp resets to `now`.
    pub(crate) fn finished(&mut self, now: Instant) -> bool {
        match self.target {
            Some(target) if now.duration_since(self.last_handled) > target => {
                self.target = None;
                self.last_handled = now;
                true
            }
            _ => false,
        }
    }

    /// Records a handled frame; ignored while sleeping so that the
    /// elapsed measurement keeps its pre-sleep reference point.
    pub(crate) fn mark_handled(&mut self, now: Instant) {
        if self.target.is_none() {
            self.last_handled = now;
        }
    }
}

impl Default for SleepTimer {
    fn default() -> Self {
        Self::new()
    }
}
