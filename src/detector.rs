// ReflexPod — Tap Detector
//
// Owns the single tap window of a reactive-training session. Polled once per
// control-loop tick with the latest piezo reading:
//
//   Idle ──activate──▶ Armed ──grace elapsed──▶ Listening ──tap──▶ Success
//                                                   └──timeout──▶ Timeout
//
// Readings inside the grace period are ignored so the LED flash that marks a
// target cannot trigger its own tap. Diagnostic mode lowers the thresholds,
// drops the grace period and reports taps even with no window open.

use crate::config::{DetectorConfig, Thresholds};
use crate::sampler::{classify, Reading};
use crate::session::{ReactivePhase, SessionState, WorkoutSession};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorPhase {
    Idle,
    /// Window open, still inside the grace period.
    Armed,
    Listening,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapOutcome {
    Success { reaction_ms: u64 },
    Timeout { timeout_ms: u32 },
    /// Diagnostic-mode tap with no window open.
    Diagnostic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TapWindow {
    activated_at_ms: u64,
    timeout_ms: u32,
    baseline: Reading,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReactiveStats {
    pub successes: u32,
    pub misses: u32,
    pub last_reaction_ms: u64,
}

pub struct TapDetector {
    config: DetectorConfig,
    diagnostic: bool,
    window: Option<TapWindow>,
    last_tap_ms: Option<u64>,
    /// Reading seen by the previous poll; spike baseline with no window open.
    previous: Option<Reading>,
    stats: ReactiveStats,
}

impl TapDetector {
    pub fn new(config: DetectorConfig, diagnostic: bool) -> Self {
        Self {
            config,
            diagnostic,
            window: None,
            last_tap_ms: None,
            previous: None,
            stats: ReactiveStats::default(),
        }
    }

    pub fn stats(&self) -> ReactiveStats {
        self.stats
    }

    pub fn is_diagnostic(&self) -> bool {
        self.diagnostic
    }

    pub fn set_diagnostic(&mut self, enabled: bool) {
        if enabled != self.diagnostic {
            log::info!("Diagnostic mode {}", if enabled { "on" } else { "off" });
        }
        self.diagnostic = enabled;
    }

    pub fn phase(&self, now_ms: u64) -> DetectorPhase {
        match self.window {
            None => DetectorPhase::Idle,
            Some(w) if !self.diagnostic && now_ms.saturating_sub(w.activated_at_ms) < self.config.grace_ms => {
                DetectorPhase::Armed
            }
            Some(_) => DetectorPhase::Listening,
        }
    }

    fn thresholds(&self) -> &Thresholds {
        if self.diagnostic {
            &self.config.diagnostic
        } else {
            &self.config.normal
        }
    }

    fn debounced(&self, now_ms: u64) -> bool {
        self.last_tap_ms
            .map_or(true, |last| now_ms.saturating_sub(last) >= self.config.debounce_ms)
    }

    /// Clear counters and any open window (new reactive session).
    pub fn reset(&mut self) {
        self.window = None;
        self.last_tap_ms = None;
        self.stats = ReactiveStats::default();
    }

    /// Open a tap window. No-op unless the session is waiting for one.
    pub fn activate(
        &mut self,
        session: &mut WorkoutSession,
        timeout_ms: u32,
        baseline: Reading,
        now_ms: u64,
    ) -> bool {
        if session.state() != SessionState::Reactive(ReactivePhase::Waiting) {
            log::debug!("activate ignored in {:?}", session.state());
            return false;
        }
        let timeout_ms = if timeout_ms > 0 {
            timeout_ms
        } else {
            self.config.default_timeout_ms
        };
        self.window = Some(TapWindow {
            activated_at_ms: now_ms,
            timeout_ms,
            baseline,
        });
        session.enter(SessionState::Reactive(ReactivePhase::Active), now_ms);
        log::info!("Tap window armed ({} ms, baseline {})", timeout_ms, baseline.0);
        true
    }

    /// Close an open window without scoring it.
    pub fn deactivate(&mut self, session: &mut WorkoutSession, now_ms: u64) -> bool {
        if self.window.take().is_none() {
            return false;
        }
        if session.state() == SessionState::Reactive(ReactivePhase::Active) {
            session.enter(SessionState::Reactive(ReactivePhase::Waiting), now_ms);
        }
        log::info!("Tap window cancelled");
        true
    }

    /// Drop the window without touching the session (session already moved).
    pub fn close(&mut self) {
        self.window = None;
    }

    /// Evaluate one reading. Resolves the open window at most once.
    /// Diagnostic-mode hits report a reaction time of 0; the stats keep the
    /// measured value.
    pub fn poll(
        &mut self,
        session: &mut WorkoutSession,
        reading: Reading,
        now_ms: u64,
    ) -> Option<TapOutcome> {
        let previous = self.previous.replace(reading).unwrap_or(reading);
        let Some(window) = self.window else {
            return self.poll_unarmed(reading, previous, now_ms);
        };

        let elapsed = now_ms.saturating_sub(window.activated_at_ms);
        let listening = self.diagnostic || elapsed >= self.config.grace_ms;

        if listening
            && classify(reading, window.baseline, self.thresholds()).is_event()
            && self.debounced(now_ms)
        {
            self.window = None;
            self.last_tap_ms = Some(now_ms);
            self.stats.successes += 1;
            self.stats.last_reaction_ms = elapsed;
            session.enter(SessionState::Reactive(ReactivePhase::Success), now_ms);
            log::info!("Tap after {} ms (hits {})", elapsed, self.stats.successes);
            let reaction_ms = if self.diagnostic { 0 } else { elapsed };
            return Some(TapOutcome::Success { reaction_ms });
        }

        if elapsed >= u64::from(window.timeout_ms) {
            self.window = None;
            self.stats.misses += 1;
            session.enter(SessionState::Reactive(ReactivePhase::Missed), now_ms);
            log::info!("Tap window timed out (misses {})", self.stats.misses);
            return Some(TapOutcome::Timeout {
                timeout_ms: window.timeout_ms,
            });
        }

        None
    }

    fn poll_unarmed(&mut self, reading: Reading, previous: Reading, now_ms: u64) -> Option<TapOutcome> {
        if !self.diagnostic {
            return None;
        }
        if classify(reading, previous, self.thresholds()).is_event() && self.debounced(now_ms) {
            self.last_tap_ms = Some(now_ms);
            log::info!("Diagnostic tap (reading {})", reading.0);
            return Some(TapOutcome::Diagnostic);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;

    const QUIET: Reading = Reading(50);
    const HIT: Reading = Reading(2000);
    const WAITING: SessionState = SessionState::Reactive(ReactivePhase::Waiting);
    const DEFAULT_TIMEOUT: u32 = crate::config::DEFAULT_TAP_TIMEOUT_MS;

    fn setup() -> (TapDetector, WorkoutSession) {
        let mut session = WorkoutSession::new(SessionConfig::default());
        session.start_reactive(0);
        (TapDetector::new(DetectorConfig::default(), false), session)
    }

    #[test]
    fn activate_requires_waiting() {
        let mut det = TapDetector::new(DetectorConfig::default(), false);
        let mut session = WorkoutSession::new(SessionConfig::default());
        assert!(!det.activate(&mut session, 500, QUIET, 0));
        assert_eq!(det.phase(0), DetectorPhase::Idle);

        session.start(0);
        assert!(!det.activate(&mut session, 500, QUIET, 0));
    }

    #[test]
    fn second_activate_is_a_noop() {
        let (mut det, mut session) = setup();
        assert!(det.activate(&mut session, 500, QUIET, 100));
        assert!(!det.activate(&mut session, 9_000, QUIET, 120));
        // The first window's timeout still applies.
        assert_eq!(
            det.poll(&mut session, QUIET, 600),
            Some(TapOutcome::Timeout { timeout_ms: 500 })
        );
    }

    #[test]
    fn zero_timeout_uses_default() {
        let (mut det, mut session) = setup();
        det.activate(&mut session, 0, QUIET, 0);
        let timeout = u64::from(DEFAULT_TIMEOUT);
        assert_eq!(det.poll(&mut session, QUIET, timeout - 1), None);
        assert_eq!(
            det.poll(&mut session, QUIET, timeout),
            Some(TapOutcome::Timeout {
                timeout_ms: DEFAULT_TIMEOUT
            })
        );
    }

    #[test]
    fn grace_period_suppresses_hits() {
        let (mut det, mut session) = setup();
        det.activate(&mut session, 1_000, QUIET, 0);
        assert_eq!(det.phase(10), DetectorPhase::Armed);
        assert_eq!(det.poll(&mut session, HIT, 10), None);
        assert_eq!(det.poll(&mut session, HIT, 149), None);
        assert_eq!(det.phase(150), DetectorPhase::Listening);
        assert_eq!(
            det.poll(&mut session, HIT, 150),
            Some(TapOutcome::Success { reaction_ms: 150 })
        );
        assert_eq!(session.state(), SessionState::Reactive(ReactivePhase::Success));
        assert_eq!(det.stats().successes, 1);
        assert_eq!(det.stats().last_reaction_ms, 150);
        assert_eq!(det.phase(151), DetectorPhase::Idle);
    }

    #[test]
    fn spike_over_baseline_counts() {
        let (mut det, mut session) = setup();
        det.activate(&mut session, 1_000, Reading(300), 0);
        assert_eq!(det.poll(&mut session, Reading(650), 200), None);
        assert_eq!(
            det.poll(&mut session, Reading(750), 210),
            Some(TapOutcome::Success { reaction_ms: 210 })
        );
    }

    #[test]
    fn quiet_readings_never_resolve_before_timeout() {
        let (mut det, mut session) = setup();
        det.activate(&mut session, 500, QUIET, 1_000);
        for now in (1_000..1_500).step_by(10) {
            assert_eq!(det.poll(&mut session, QUIET, now), None);
        }
        assert_eq!(
            det.poll(&mut session, QUIET, 1_500),
            Some(TapOutcome::Timeout { timeout_ms: 500 })
        );
        assert_eq!(session.state(), SessionState::Reactive(ReactivePhase::Missed));
        assert_eq!(det.stats().misses, 1);
        assert_eq!(det.poll(&mut session, QUIET, 1_600), None);
        assert_eq!(det.stats().misses, 1);
    }

    #[test]
    fn hit_at_timeout_boundary_is_a_success() {
        let (mut det, mut session) = setup();
        det.activate(&mut session, 500, QUIET, 0);
        assert_eq!(
            det.poll(&mut session, HIT, 500),
            Some(TapOutcome::Success { reaction_ms: 500 })
        );
    }

    #[test]
    fn debounce_spaces_accepted_taps() {
        let config = DetectorConfig {
            debounce_ms: 500,
            ..DetectorConfig::default()
        };
        let mut det = TapDetector::new(config, false);
        let mut session = WorkoutSession::new(SessionConfig::default());
        session.start_reactive(0);

        det.activate(&mut session, 1_000, QUIET, 0);
        det.poll(&mut session, HIT, 200);
        session.enter(WAITING, 250);

        det.activate(&mut session, 1_000, QUIET, 250);
        assert_eq!(det.poll(&mut session, HIT, 500), None);
        assert_eq!(
            det.poll(&mut session, HIT, 700),
            Some(TapOutcome::Success { reaction_ms: 450 })
        );
    }

    #[test]
    fn deactivate_closes_without_scoring() {
        let (mut det, mut session) = setup();
        det.activate(&mut session, 500, QUIET, 0);
        assert!(det.deactivate(&mut session, 100));
        assert_eq!(session.state(), WAITING);
        assert_eq!(det.poll(&mut session, HIT, 300), None);
        assert_eq!(det.stats(), ReactiveStats::default());
        assert!(!det.deactivate(&mut session, 400));
    }

    #[test]
    fn diagnostic_mode_skips_grace_and_lowers_thresholds() {
        let (mut det, mut session) = setup();
        det.set_diagnostic(true);
        det.activate(&mut session, 1_000, QUIET, 0);
        assert_eq!(det.phase(0), DetectorPhase::Listening);
        assert_eq!(
            det.poll(&mut session, Reading(400), 20),
            Some(TapOutcome::Success { reaction_ms: 0 })
        );
        assert_eq!(det.stats().last_reaction_ms, 20);
    }

    #[test]
    fn diagnostic_flat_signal_below_threshold_never_taps() {
        let mut det = TapDetector::new(DetectorConfig::default(), true);
        let mut session = WorkoutSession::new(SessionConfig::default());
        for now in (0..1_000).step_by(10) {
            assert_eq!(det.poll(&mut session, Reading(200), now), None, "at {now}");
        }
        // A drop and a small rise stay quiet; a rise past the spike delta taps.
        assert_eq!(det.poll(&mut session, Reading(100), 1_000), None);
        assert_eq!(det.poll(&mut session, Reading(240), 1_010), None);
        assert_eq!(det.poll(&mut session, Reading(280), 1_020), None);
        assert_eq!(det.poll(&mut session, Reading(120), 1_030), None);
        assert_eq!(det.poll(&mut session, Reading(290), 1_040), Some(TapOutcome::Diagnostic));
    }

    #[test]
    fn diagnostic_mode_reports_unarmed_taps() {
        let mut det = TapDetector::new(DetectorConfig::default(), true);
        let mut session = WorkoutSession::new(SessionConfig::default());
        assert_eq!(det.poll(&mut session, Reading(400), 0), Some(TapOutcome::Diagnostic));
        assert_eq!(det.poll(&mut session, Reading(400), 50), None);
        assert_eq!(det.poll(&mut session, Reading(400), 200), Some(TapOutcome::Diagnostic));
        assert!(session.state().is_idle());
        assert_eq!(det.stats(), ReactiveStats::default());

        det.set_diagnostic(false);
        assert_eq!(det.poll(&mut session, HIT, 1_000), None);
    }

    #[test]
    fn reset_clears_stats() {
        let (mut det, mut session) = setup();
        det.activate(&mut session, 100, QUIET, 0);
        det.poll(&mut session, QUIET, 100);
        assert_eq!(det.stats().misses, 1);
        det.reset();
        assert_eq!(det.stats(), ReactiveStats::default());
    }
}
