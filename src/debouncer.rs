//! Frame-count debouncing of the raw good/bad verdict.

use crate::constants::{DEFAULT_BAD_TO_GOOD_FRAMES, DEFAULT_GAP_RESET_MS, DEFAULT_GOOD_TO_BAD_FRAMES};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Externally visible posture state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostureState {
    #[default]
    Good,
    Bad,
}

impl PostureState {
    pub fn from_is_bad(is_bad: bool) -> Self {
        if is_bad {
            Self::Bad
        } else {
            Self::Good
        }
    }

    pub fn is_bad(self) -> bool {
        self == Self::Bad
    }
}

/// Progress toward the next state change, for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionProgress {
    pub current: PostureState,
    pub transitioning_to: Option<PostureState>,
    pub progress: u32,
    pub required: u32,
}

/// Requires several consecutive consistent frames before flipping state.
///
/// Entering Bad takes `good_to_bad_frames`, leaving it takes
/// `bad_to_good_frames`. A pause longer than the gap threshold discards
/// both counters but keeps the current state.
#[derive(Debug, Clone)]
pub struct StateDebouncer {
    good_to_bad_frames: u32,
    bad_to_good_frames: u32,
    gap_reset: Duration,
    current: PostureState,
    consecutive_good: u32,
    consecutive_bad: u32,
    last_update: Option<Duration>,
}

impl Default for StateDebouncer {
    fn default() -> Self {
        Self::new(
            DEFAULT_GOOD_TO_BAD_FRAMES,
            DEFAULT_BAD_TO_GOOD_FRAMES,
            Duration::from_millis(DEFAULT_GAP_RESET_MS),
        )
    }
}

impl StateDebouncer {
    /// Create a new debouncer in the Good state
    ///
    /// # Panics
    ///
    /// Panics if either frame count is zero
    #[must_use]
    pub fn new(good_to_bad_frames: u32, bad_to_good_frames: u32, gap_reset: Duration) -> Self {
        assert!(good_to_bad_frames > 0, "Good to bad frame count must be greater than 0");
        assert!(bad_to_good_frames > 0, "Bad to good frame count must be greater than 0");
        Self {
            good_to_bad_frames,
            bad_to_good_frames,
            gap_reset,
            current: PostureState::Good,
            consecutive_good: 0,
            consecutive_bad: 0,
            last_update: None,
        }
    }

    /// Feed one raw verdict observed at `now`; returns the debounced state
    pub fn update(&mut self, detected_is_bad: bool, now: Duration) -> PostureState {
        if let Some(last) = self.last_update {
            if now.saturating_sub(last) > self.gap_reset {
                log::debug!("Debounce counters reset after {:?} gap", now.saturating_sub(last));
                self.consecutive_good = 0;
                self.consecutive_bad = 0;
            }
        }
        self.last_update = Some(now);

        if detected_is_bad {
            self.consecutive_bad = self.consecutive_bad.saturating_add(1);
            self.consecutive_good = 0;
        } else {
            self.consecutive_good = self.consecutive_good.saturating_add(1);
            self.consecutive_bad = 0;
        }

        match self.current {
            PostureState::Good if self.consecutive_bad >= self.good_to_bad_frames => {
                log::debug!("Posture state Good -> Bad after {} frames", self.consecutive_bad);
                self.current = PostureState::Bad;
            }
            PostureState::Bad if self.consecutive_good >= self.bad_to_good_frames => {
                log::debug!("Posture state Bad -> Good after {} frames", self.consecutive_good);
                self.current = PostureState::Good;
            }
            _ => {}
        }

        self.current
    }

    pub fn current(&self) -> PostureState {
        self.current
    }

    pub fn consecutive_good(&self) -> u32 {
        self.consecutive_good
    }

    pub fn consecutive_bad(&self) -> u32 {
        self.consecutive_bad
    }

    pub fn transition_progress(&self) -> TransitionProgress {
        let (opposite, progress, required) = match self.current {
            PostureState::Good => (PostureState::Bad, self.consecutive_bad, self.good_to_bad_frames),
            PostureState::Bad => (PostureState::Good, self.consecutive_good, self.bad_to_good_frames),
        };
        TransitionProgress {
            current: self.current,
            transitioning_to: (progress > 0).then_some(opposite),
            progress,
            required,
        }
    }

    /// Set the state directly and clear both counters
    pub fn force_state(&mut self, state: PostureState) {
        self.current = state;
        self.consecutive_good = 0;
        self.consecutive_bad = 0;
    }

    /// Back to the initial Good state
    pub fn reset(&mut self) {
        self.force_state(PostureState::Good);
        self.last_update = None;
    }
}
