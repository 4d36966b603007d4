// ReflexPod — Workout / Reactive-Training State Machine
//
// One session per device. Workout phases and reactive-training phases are
// separate sum types under `SessionState`; only the timestamps are shared.
// Operations return the state they entered so the caller can render it.

use crate::config::SessionConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkoutPhase {
    Warmup,
    Active,
    Rest,
    Cooldown,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactivePhase {
    /// Armed for the next `activate`.
    Waiting,
    /// A tap window is open.
    Active,
    Success,
    Missed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Workout(WorkoutPhase),
    Reactive(ReactivePhase),
}

impl SessionState {
    /// Integer used on the wire (`set_state`, `workout_status`).
    pub fn code(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Workout(WorkoutPhase::Warmup) => 1,
            Self::Workout(WorkoutPhase::Active) => 2,
            Self::Workout(WorkoutPhase::Rest) => 3,
            Self::Workout(WorkoutPhase::Cooldown) => 4,
            Self::Workout(WorkoutPhase::Complete) => 5,
            Self::Reactive(ReactivePhase::Waiting) => 6,
            Self::Reactive(ReactivePhase::Active) => 7,
            Self::Reactive(ReactivePhase::Success) => 8,
            Self::Reactive(ReactivePhase::Missed) => 9,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Some(match code {
            0 => Self::Idle,
            1 => Self::Workout(WorkoutPhase::Warmup),
            2 => Self::Workout(WorkoutPhase::Active),
            3 => Self::Workout(WorkoutPhase::Rest),
            4 => Self::Workout(WorkoutPhase::Cooldown),
            5 => Self::Workout(WorkoutPhase::Complete),
            6 => Self::Reactive(ReactivePhase::Waiting),
            7 => Self::Reactive(ReactivePhase::Active),
            8 => Self::Reactive(ReactivePhase::Success),
            9 => Self::Reactive(ReactivePhase::Missed),
            _ => return None,
        })
    }

    pub fn is_idle(self) -> bool {
        self == Self::Idle
    }

    pub fn is_reactive(self) -> bool {
        matches!(self, Self::Reactive(_))
    }
}

#[derive(Debug, Clone)]
pub struct WorkoutSession {
    config: SessionConfig,
    state: SessionState,
    started_at_ms: Option<u64>,
    /// Last transition; re-armed by each calorie accrual.
    last_change_ms: u64,
    elapsed_s: u64,
    calories: u32,
    reps: u32,
}

impl WorkoutSession {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            state: SessionState::Idle,
            started_at_ms: None,
            last_change_ms: 0,
            elapsed_s: 0,
            calories: 0,
            reps: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn elapsed_s(&self) -> u64 {
        self.elapsed_s
    }

    pub fn calories(&self) -> u32 {
        self.calories
    }

    pub fn reps(&self) -> u32 {
        self.reps
    }

    pub fn last_change_ms(&self) -> u64 {
        self.last_change_ms
    }

    /// `Idle → Warmup`. No-op from any other state.
    pub fn start(&mut self, now_ms: u64) -> Option<SessionState> {
        if !self.state.is_idle() {
            log::debug!("start ignored in {:?}", self.state);
            return None;
        }
        self.reset_counters();
        self.started_at_ms = Some(now_ms);
        Some(self.enter(SessionState::Workout(WorkoutPhase::Warmup), now_ms))
    }

    /// Any state → `Idle`, clearing the timers.
    pub fn stop(&mut self, now_ms: u64) {
        self.reset_counters();
        self.started_at_ms = None;
        self.enter(SessionState::Idle, now_ms);
    }

    /// Direct assignment from the link.
    pub fn set_state(&mut self, state: SessionState, now_ms: u64) -> SessionState {
        if state.is_idle() {
            self.stop(now_ms);
            return state;
        }
        if self.started_at_ms.is_none() {
            self.started_at_ms = Some(now_ms);
        }
        self.enter(state, now_ms)
    }

    /// `Idle → Reactive(Waiting)`.
    pub fn start_reactive(&mut self, now_ms: u64) -> Option<SessionState> {
        if !self.state.is_idle() {
            log::debug!("start_reactive ignored in {:?}", self.state);
            return None;
        }
        self.reset_counters();
        self.started_at_ms = Some(now_ms);
        Some(self.enter(SessionState::Reactive(ReactivePhase::Waiting), now_ms))
    }

    /// Any reactive state → `Idle`. Returns whether it applied.
    pub fn stop_reactive(&mut self, now_ms: u64) -> bool {
        if !self.state.is_reactive() {
            log::debug!("stop_reactive ignored in {:?}", self.state);
            return false;
        }
        self.stop(now_ms);
        true
    }

    pub(crate) fn enter(&mut self, state: SessionState, now_ms: u64) -> SessionState {
        if state != self.state {
            log::info!("Session {:?} -> {:?}", self.state, state);
        }
        self.state = state;
        self.last_change_ms = now_ms;
        state
    }

    /// Per-tick timer update. Returns a state entered by a scheduled
    /// transition (display hold expiry).
    pub fn tick(&mut self, now_ms: u64) -> Option<SessionState> {
        let started = match (self.state, self.started_at_ms) {
            (SessionState::Idle, _) | (_, None) => return None,
            (_, Some(started)) => started,
        };
        self.elapsed_s = now_ms.saturating_sub(started) / 1000;

        match self.state {
            SessionState::Workout(WorkoutPhase::Active) => {
                let interval = self.config.calorie_interval_ms.max(1);
                while now_ms.saturating_sub(self.last_change_ms) >= interval {
                    self.calories += 1;
                    self.last_change_ms += interval;
                }
                None
            }
            SessionState::Reactive(ReactivePhase::Success | ReactivePhase::Missed)
                if now_ms.saturating_sub(self.last_change_ms) >= self.config.display_hold_ms =>
            {
                Some(self.enter(SessionState::Reactive(ReactivePhase::Waiting), now_ms))
            }
            _ => None,
        }
    }

    fn reset_counters(&mut self) {
        self.elapsed_s = 0;
        self.calories = 0;
        self.reps = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACTIVE: SessionState = SessionState::Workout(WorkoutPhase::Active);
    const WARMUP: SessionState = SessionState::Workout(WorkoutPhase::Warmup);

    fn session() -> WorkoutSession {
        WorkoutSession::new(SessionConfig::default())
    }

    #[test]
    fn codes_round_trip() {
        for code in 0..10 {
            let state = SessionState::from_code(code).unwrap();
            assert_eq!(state.code() as i64, code);
        }
        assert_eq!(SessionState::from_code(10), None);
        assert_eq!(SessionState::from_code(-1), None);
    }

    #[test]
    fn start_resets_counters() {
        let mut s = session();
        assert_eq!(s.start(1_000), Some(WARMUP));
        s.set_state(ACTIVE, 1_000);
        s.tick(12_000);
        assert_eq!(s.calories(), 2);

        s.stop(12_000);
        assert_eq!(s.start(20_000), Some(WARMUP));
        assert_eq!(s.elapsed_s(), 0);
        assert_eq!(s.calories(), 0);
        assert_eq!(s.reps(), 0);
        s.tick(20_000);
        assert_eq!(s.elapsed_s(), 0);
    }

    #[test]
    fn start_only_from_idle() {
        let mut s = session();
        s.start(0);
        assert_eq!(s.start(500), None);
        assert_eq!(s.last_change_ms(), 0);
    }

    #[test]
    fn elapsed_truncates_to_seconds() {
        let mut s = session();
        s.start(1_000);
        s.tick(2_999);
        assert_eq!(s.elapsed_s(), 1);
        s.tick(3_000);
        assert_eq!(s.elapsed_s(), 2);
    }

    #[test]
    fn calories_only_accrue_while_active() {
        let mut s = session();
        s.start(0);
        s.tick(60_000);
        assert_eq!(s.calories(), 0);

        s.set_state(ACTIVE, 60_000);
        for now in (60_000..=75_000).step_by(10) {
            s.tick(now);
        }
        assert_eq!(s.calories(), 3);

        s.set_state(SessionState::Workout(WorkoutPhase::Rest), 75_000);
        s.tick(90_000);
        assert_eq!(s.calories(), 3);
    }

    #[test]
    fn calorie_cadence_does_not_drift_with_tick_jitter() {
        let mut s = session();
        s.start(0);
        s.set_state(ACTIVE, 0);
        for now in (0..50_000).step_by(7) {
            s.tick(now);
        }
        s.tick(50_000);
        assert_eq!(s.calories(), 10);
    }

    #[test]
    fn stop_clears_to_idle() {
        let mut s = session();
        s.start(0);
        s.set_state(ACTIVE, 0);
        s.tick(10_000);
        s.stop(10_000);
        assert_eq!(s.state(), SessionState::Idle);
        assert_eq!(s.calories(), 0);
        assert_eq!(s.elapsed_s(), 0);
        assert_eq!(s.tick(20_000), None);
        assert_eq!(s.elapsed_s(), 0);
    }

    #[test]
    fn display_hold_returns_to_waiting() {
        let mut s = session();
        s.start_reactive(0);
        s.enter(SessionState::Reactive(ReactivePhase::Success), 1_000);
        assert_eq!(s.tick(1_299), None);
        assert_eq!(s.tick(1_300), Some(SessionState::Reactive(ReactivePhase::Waiting)));
    }

    #[test]
    fn reactive_start_and_stop_preconditions() {
        let mut s = session();
        s.start(0);
        assert_eq!(s.start_reactive(10), None);
        assert!(!s.stop_reactive(10));
        s.stop(20);
        assert!(s.start_reactive(30).is_some());
        assert!(s.stop_reactive(40));
        assert!(s.state().is_idle());
    }
}
