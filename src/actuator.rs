// ReflexPod — Light Actuator Contract
//
// The control core never touches the strip. It hands the actuator a
// `LightRequest` (a pattern descriptor or one of the semantic requests) and
// the implementation renders it, possibly blocking for the pattern duration.

use std::str::FromStr;

use crate::session::{ReactivePhase, SessionState, WorkoutPhase};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    Solid,
    Flash,
    Chase,
    Rainbow,
    Off,
    Warmup,
    Pulse,
    Breathing,
    Timer,
    Intensity,
    Rest,
    Celebration,
    Wave,
    Unknown,
}

impl FromStr for PatternKind {
    type Err = std::convert::Infallible;

    /// Unrecognized names map to `Unknown`; the strip renders nothing for them.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Ok(match name {
            "solid" => Self::Solid,
            "flash" => Self::Flash,
            "chase" => Self::Chase,
            "rainbow" => Self::Rainbow,
            "off" => Self::Off,
            "warmup" => Self::Warmup,
            "pulse" => Self::Pulse,
            "breathing" => Self::Breathing,
            "timer" => Self::Timer,
            "intensity" => Self::Intensity,
            "rest" => Self::Rest,
            "celebration" => Self::Celebration,
            "wave" => Self::Wave,
            _ => Self::Unknown,
        })
    }
}

/// Pattern descriptor: kind, 24-bit RGB colour, nominal duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternRequest {
    pub kind: PatternKind,
    pub color: u32,
    pub duration_ms: u32,
}

impl PatternRequest {
    pub const fn new(kind: PatternKind, color: u32, duration_ms: u32) -> Self {
        Self {
            kind,
            color: color & 0x00FF_FFFF,
            duration_ms,
        }
    }

    /// Entry pattern for a session state; `None` means clear the strip.
    pub fn for_state(state: SessionState) -> Option<Self> {
        use PatternKind::*;
        Some(match state {
            SessionState::Idle => return None,
            SessionState::Workout(WorkoutPhase::Warmup) => Self::new(Warmup, 0xFF8000, 1000),
            SessionState::Workout(WorkoutPhase::Active) => Self::new(Pulse, 0xFF0000, 1000),
            SessionState::Workout(WorkoutPhase::Rest) => Self::new(Breathing, 0x0000FF, 2000),
            SessionState::Workout(WorkoutPhase::Cooldown) => Self::new(Breathing, 0x00FF00, 3000),
            SessionState::Workout(WorkoutPhase::Complete) => Self::new(Celebration, 0xFFFFFF, 3000),
            // Reactive states must render instantly: the loop is timing taps.
            SessionState::Reactive(ReactivePhase::Waiting) => Self::new(Solid, 0x000020, 0),
            SessionState::Reactive(ReactivePhase::Active) => Self::new(Solid, 0xFFFFFF, 0),
            SessionState::Reactive(ReactivePhase::Success) => Self::new(Solid, 0x00FF00, 0),
            SessionState::Reactive(ReactivePhase::Missed) => Self::new(Solid, 0xFF0000, 0),
        })
    }
}

/// Phase of the multi-device wave for one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncPhase {
    /// Shared phase from the sync timestamp (100 ms per degree).
    pub phase_deg: u32,
    /// This device's offset around the circle.
    pub offset_deg: u32,
}

impl SyncPhase {
    pub fn compute(device_id: u8, device_count: u32, timestamp_ms: u64) -> Self {
        let count = device_count.max(1);
        let slot = u32::from(device_id.saturating_sub(1)) % count;
        Self {
            phase_deg: ((timestamp_ms / 100) % 360) as u32,
            offset_deg: slot * (360 / count),
        }
    }

    /// Start angle of the wave on this device.
    pub fn start_deg(&self) -> u32 {
        (self.phase_deg + self.offset_deg) % 360
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightRequest {
    Pattern(PatternRequest),
    /// Countdown bar, `seconds` of `total_seconds` remaining.
    Timer { seconds: u32, total_seconds: u32 },
    /// Intensity bar, level 1–10.
    Intensity { level: u8 },
    Sync(SyncPhase),
    /// Blink the device id at boot.
    Identify { device_id: u8 },
    Clear,
}

pub trait Actuator {
    fn render(&mut self, request: &LightRequest);

    fn set_brightness(&mut self, level: u8);

    fn show_state(&mut self, state: SessionState) {
        match PatternRequest::for_state(state) {
            Some(pattern) => self.render(&LightRequest::Pattern(pattern)),
            None => self.clear(),
        }
    }

    fn show_waiting(&mut self) {
        self.show_state(SessionState::Reactive(ReactivePhase::Waiting));
    }

    fn show_active_target(&mut self) {
        self.show_state(SessionState::Reactive(ReactivePhase::Active));
    }

    fn show_success(&mut self) {
        self.show_state(SessionState::Reactive(ReactivePhase::Success));
    }

    fn show_missed(&mut self) {
        self.show_state(SessionState::Reactive(ReactivePhase::Missed));
    }

    fn clear(&mut self) {
        self.render(&LightRequest::Clear);
    }
}
