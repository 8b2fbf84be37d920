//! Bad-posture session timing, warning cadence and session statistics.

use crate::{
    classifier::PostureIssue,
    constants::{DEFAULT_INITIAL_WARNING_SECONDS, DEFAULT_REPEAT_WARNING_INTERVAL},
    debouncer::PostureState,
};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, time::Duration};

/// The currently open bad-posture period. `start` is set only while Bad.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadPostureSession {
    pub start: Option<Duration>,
    /// Whole seconds since `start`
    pub duration: u64,
}

/// Accumulated statistics in seconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStatistics {
    pub total_bad_duration: f64,
    pub longest_bad_streak: f64,
    pub longest_good_streak: f64,
    pub current_good_duration: f64,
}

/// Outcome of feeding one debounced state to the analyzer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionUpdate {
    /// Whole seconds spent in the current bad session, if Bad
    pub bad_duration: Option<u64>,
    pub should_warn: bool,
}

#[derive(Debug, Clone)]
pub struct SessionAnalyzer {
    initial_warning_seconds: u64,
    repeat_warning_interval: u64,
    session: BadPostureSession,
    warned: HashSet<u64>,
    state: PostureState,
    good_start: Option<Duration>,
    /// Where the open bad streak is counted from for statistics. Differs
    /// from `session.start` only after a statistics reset.
    bad_accounting_start: Option<Duration>,
    last_seen: Option<Duration>,
    total_bad: f64,
    longest_bad: f64,
    longest_good: f64,
}

impl Default for SessionAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_WARNING_SECONDS, DEFAULT_REPEAT_WARNING_INTERVAL)
    }
}

impl SessionAnalyzer {
    /// # Panics
    ///
    /// Panics if `repeat_warning_interval` is zero
    pub fn new(initial_warning_seconds: u64, repeat_warning_interval: u64) -> Self {
        assert!(repeat_warning_interval > 0, "Repeat warning interval must be greater than 0");
        Self {
            initial_warning_seconds,
            repeat_warning_interval,
            session: BadPostureSession::default(),
            warned: HashSet::new(),
            state: PostureState::Good,
            good_start: None,
            bad_accounting_start: None,
            last_seen: None,
            total_bad: 0.0,
            longest_bad: 0.0,
            longest_good: 0.0,
        }
    }

    /// Feed the debounced state observed at `now`
    pub fn update(&mut self, state: PostureState, now: Duration) -> SessionUpdate {
        self.last_seen = Some(now);

        match (self.state, state) {
            (PostureState::Good, PostureState::Bad) => {
                let good = self.good_elapsed(now);
                self.longest_good = self.longest_good.max(good);
                self.good_start = None;
                self.session.start = Some(now);
                self.session.duration = 0;
                self.bad_accounting_start = Some(now);
                self.warned.clear();
                log::debug!("Bad posture session started after {:.1}s of good posture", good);
            }
            (PostureState::Bad, PostureState::Good) => {
                let bad = self
                    .bad_accounting_start
                    .take()
                    .map_or(0.0, |start| now.saturating_sub(start).as_secs_f64());
                self.total_bad += bad;
                self.longest_bad = self.longest_bad.max(bad);
                self.session = BadPostureSession::default();
                self.good_start = Some(now);
                log::debug!("Bad posture session closed after {:.1}s", bad);
            }
            (PostureState::Good, PostureState::Good) => {
                self.good_start.get_or_insert(now);
            }
            (PostureState::Bad, PostureState::Bad) => {}
        }
        self.state = state;

        if !state.is_bad() {
            return SessionUpdate::default();
        }

        let start = *self.session.start.get_or_insert(now);
        self.bad_accounting_start.get_or_insert(start);
        let duration = now.saturating_sub(start).as_secs();
        self.session.duration = duration;
        SessionUpdate {
            bad_duration: Some(duration),
            should_warn: self.should_warn(duration),
        }
    }

    /// True once at the initial warning time and once at each repeat interval
    /// after it. A given duration value fires at most once per bad session.
    pub fn should_warn(&mut self, duration: u64) -> bool {
        let due = match duration.checked_sub(self.initial_warning_seconds) {
            Some(0) => true,
            Some(since) => since % self.repeat_warning_interval == 0,
            None => false,
        };
        due && self.warned.insert(duration)
    }

    pub fn session(&self) -> &BadPostureSession {
        &self.session
    }

    pub fn state(&self) -> PostureState {
        self.state
    }

    pub fn statistics(&self) -> SessionStatistics {
        SessionStatistics {
            total_bad_duration: self.total_bad,
            longest_bad_streak: self.longest_bad,
            longest_good_streak: self.longest_good,
            current_good_duration: self.last_seen.map_or(0.0, |now| self.good_elapsed(now)),
        }
    }

    /// Zero the accumulators and restart the current streak at the last seen
    /// timestamp. An open bad session keeps its start and warnings.
    pub fn reset_statistics(&mut self) {
        self.total_bad = 0.0;
        self.longest_bad = 0.0;
        self.longest_good = 0.0;
        match self.state {
            PostureState::Good => self.good_start = self.last_seen,
            PostureState::Bad => self.bad_accounting_start = self.last_seen,
        }
        log::info!("Session statistics reset");
    }

    fn good_elapsed(&self, now: Duration) -> f64 {
        self.good_start
            .map_or(0.0, |start| now.saturating_sub(start).as_secs_f64())
    }
}

/// Build the user-facing warning for a bad session of `duration` seconds
#[must_use]
pub fn warning_message(issues: &[PostureIssue], duration: u64, compensation_description: Option<&str>) -> String {
    let text = if issues.contains(&PostureIssue::BodyCompensation) {
        compensation_description
            .unwrap_or_else(|| PostureIssue::BodyCompensation.phrase())
            .to_string()
    } else {
        join_phrases(issues.iter().map(|issue| issue.phrase()).collect())
    };
    format!("Bad posture for {duration}s: {text}")
}

fn join_phrases(phrases: Vec<&str>) -> String {
    match phrases.as_slice() {
        [] => String::new(),
        [only] => (*only).to_string(),
        [head @ .., last] => format!("{} and {}", head.join(", "), last),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(value: f64) -> Duration {
        Duration::from_secs_f64(value)
    }

    #[test]
    fn test_warning_cadence() {
        let mut analyzer = SessionAnalyzer::default();
        let fired: Vec<u64> = (0..=60).filter(|&d| analyzer.should_warn(d)).collect();
        assert_eq!(fired, vec![10, 30, 50]);
    }

    #[test]
    fn test_duration_warns_once() {
        let mut analyzer = SessionAnalyzer::default();
        assert!(analyzer.should_warn(10));
        assert!(!analyzer.should_warn(10));
    }

    #[test]
    fn test_warning_fires_once_per_second_of_frames() {
        let mut analyzer = SessionAnalyzer::default();
        analyzer.update(PostureState::Bad, secs(0.0));

        let warnings = (0..450)
            .map(|frame| analyzer.update(PostureState::Bad, secs(f64::from(frame) / 30.0)))
            .filter(|update| update.should_warn)
            .count();
        // 15 s of frames: only the 10 s mark fires
        assert_eq!(warnings, 1);
        assert_eq!(analyzer.session().duration, 14);
    }

    #[test]
    fn test_new_session_clears_warned_set() {
        let mut analyzer = SessionAnalyzer::default();
        analyzer.update(PostureState::Bad, secs(0.0));
        assert!(analyzer.update(PostureState::Bad, secs(10.0)).should_warn);
        analyzer.update(PostureState::Good, secs(11.0));

        analyzer.update(PostureState::Bad, secs(20.0));
        assert!(analyzer.update(PostureState::Bad, secs(30.0)).should_warn);
    }

    #[test]
    fn test_good_state_reports_no_duration() {
        let mut analyzer = SessionAnalyzer::default();
        let update = analyzer.update(PostureState::Good, secs(5.0));
        assert_eq!(update, SessionUpdate::default());
        assert_eq!(analyzer.session().start, None);
    }

    #[test]
    fn test_statistics_accumulate() {
        let mut analyzer = SessionAnalyzer::default();
        analyzer.update(PostureState::Good, secs(0.0));
        analyzer.update(PostureState::Bad, secs(4.0));
        analyzer.update(PostureState::Good, secs(10.0));
        analyzer.update(PostureState::Bad, secs(12.0));
        analyzer.update(PostureState::Good, secs(14.0));
        analyzer.update(PostureState::Good, secs(17.0));

        let stats = analyzer.statistics();
        assert!((stats.total_bad_duration - 8.0).abs() < 1e-9);
        assert!((stats.longest_bad_streak - 6.0).abs() < 1e-9);
        assert!((stats.longest_good_streak - 4.0).abs() < 1e-9);
        assert!((stats.current_good_duration - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_reset_statistics_restarts_streak() {
        let mut analyzer = SessionAnalyzer::default();
        analyzer.update(PostureState::Bad, secs(0.0));
        analyzer.update(PostureState::Good, secs(5.0));
        analyzer.update(PostureState::Good, secs(9.0));

        analyzer.reset_statistics();
        assert_eq!(analyzer.statistics(), SessionStatistics::default());

        analyzer.update(PostureState::Good, secs(11.0));
        assert!((analyzer.statistics().current_good_duration - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_reset_statistics_while_bad_keeps_session() {
        let mut analyzer = SessionAnalyzer::default();
        let mut warnings = Vec::new();
        for t in 0..=25 {
            if t == 12 {
                analyzer.reset_statistics();
            }
            let update = analyzer.update(PostureState::Bad, secs(f64::from(t)));
            if update.should_warn {
                warnings.push((t, update.bad_duration));
            }
        }

        // One continuous session: a single initial warning, duration unaffected
        assert_eq!(warnings, vec![(10, Some(10))]);
        assert_eq!(analyzer.session().start, Some(secs(0.0)));
        assert_eq!(analyzer.session().duration, 25);

        // Only the part after the reset is counted
        analyzer.update(PostureState::Good, secs(30.0));
        let stats = analyzer.statistics();
        assert!((stats.total_bad_duration - 19.0).abs() < 1e-9);
        assert!((stats.longest_bad_streak - 19.0).abs() < 1e-9);
    }

    #[test]
    fn test_warning_message_joins_issues() {
        assert_eq!(
            warning_message(&[PostureIssue::HeadPitch], 10, None),
            "Bad posture for 10s: head tilted down"
        );
        assert_eq!(
            warning_message(&[PostureIssue::HeadPitch, PostureIssue::Distance], 30, None),
            "Bad posture for 30s: head tilted down and too close to the screen"
        );
        assert_eq!(
            warning_message(
                &[PostureIssue::HeadPitch, PostureIssue::Distance, PostureIssue::ShoulderTilt],
                50,
                None
            ),
            "Bad posture for 50s: head tilted down, too close to the screen and shoulders uneven"
        );
    }

    #[test]
    fn test_compensation_takes_precedence() {
        let issues = [PostureIssue::HeadPitch, PostureIssue::BodyCompensation];
        assert_eq!(
            warning_message(&issues, 10, Some("body leaning left, head compensating right")),
            "Bad posture for 10s: body leaning left, head compensating right"
        );
        assert_eq!(
            warning_message(&issues, 10, None),
            "Bad posture for 10s: body leaning with head compensating"
        );
    }
}
