//! Short press / long press recognition for the save key.
//!
//! Terminals differ in what they report for a held key: some send a key-up,
//! most only send auto-repeat presses. The tracker accepts both, and treats a
//! repeat stream that goes quiet for `release_gap` as a release.

use std::time::{Duration, Instant};

pub const DEFAULT_LONG_PRESS: Duration = Duration::from_millis(3000);
pub const DEFAULT_RELEASE_GAP: Duration = Duration::from_millis(600);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressState {
    Idle,
    Pressed { since: Instant, last_seen: Instant },
    LongPressFired { last_seen: Instant },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressOutcome {
    ShortPress,
    LongPress,
}

#[derive(Debug)]
pub struct PressTracker {
    state: PressState,
    long_press: Duration,
    release_gap: Duration,
}

impl Default for PressTracker {
    fn default() -> Self {
        Self::new(DEFAULT_LONG_PRESS, DEFAULT_RELEASE_GAP)
    }
}

impl PressTracker {
    pub fn new(long_press: Duration, release_gap: Duration) -> Self {
        PressTracker {
            state: PressState::Idle,
            long_press,
            release_gap,
        }
    }

    #[allow(dead_code)]
    pub fn state(&self) -> PressState {
        self.state
    }

    pub fn is_pressed(&self) -> bool {
        !matches!(self.state, PressState::Idle)
    }

    /// Fraction of the long press threshold held so far, for drawing a gauge.
    pub fn hold_progress(&self, now: Instant) -> f64 {
        match self.state {
            PressState::Idle => 0.0,
            PressState::Pressed { since, .. } => {
                let held = now.saturating_duration_since(since).as_secs_f64();
                let threshold = self.long_press.as_secs_f64();
                if threshold <= 0.0 {
                    1.0
                } else {
                    (held / threshold).min(1.0)
                }
            }
            PressState::LongPressFired { .. } => 1.0,
        }
    }

    /// Key down, or an auto-repeat of the held key.
    pub fn press(&mut self, now: Instant) {
        self.state = match self.state {
            PressState::Idle => PressState::Pressed {
                since: now,
                last_seen: now,
            },
            PressState::Pressed { since, .. } => PressState::Pressed {
                since,
                last_seen: now,
            },
            PressState::LongPressFired { .. } => PressState::LongPressFired { last_seen: now },
        };
    }

    /// Key up. Only a press that has not already fired as a long press counts.
    pub fn release(&mut self, now: Instant) -> Option<PressOutcome> {
        let outcome = match self.state {
            PressState::Pressed { since, .. } if now.duration_since(since) >= self.long_press => {
                // Released past the threshold before a tick got to it.
                Some(PressOutcome::LongPress)
            }
            PressState::Pressed { .. } => Some(PressOutcome::ShortPress),
            _ => None,
        };
        self.state = PressState::Idle;
        outcome
    }

    /// Timer event from the event loop.
    pub fn tick(&mut self, now: Instant) -> Option<PressOutcome> {
        match self.state {
            PressState::Idle => None,
            PressState::Pressed { since, last_seen } => {
                if now.duration_since(since) >= self.long_press {
                    self.state = PressState::LongPressFired { last_seen };
                    Some(PressOutcome::LongPress)
                } else if now.duration_since(last_seen) >= self.release_gap {
                    self.state = PressState::Idle;
                    Some(PressOutcome::ShortPress)
                } else {
                    None
                }
            }
            PressState::LongPressFired { last_seen } => {
                if now.duration_since(last_seen) >= self.release_gap {
                    self.state = PressState::Idle;
                }
                None
            }
        }
    }

    /// Abandon the gesture without firing anything.
    pub fn cancel(&mut self) {
        self.state = PressState::Idle;
    }
}
