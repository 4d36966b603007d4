// ReflexPod — Hardware & System Configuration
// Target: Seeed Studio Xiao ESP32-C6 (RISC-V)

// ---------------------------------------------------------------------------
// GPIO Pin Definitions (Xiao ESP32-C6 pinout)
// ---------------------------------------------------------------------------
pub const PIN_BATTERY_ADC: u32 = 0; // D0/A0 — Battery voltage (ADC1 channel 0)
pub const PIN_PIEZO_ADC: u32 = 1;   // D1/A1 — Piezo disc (ADC1 channel 1)
pub const PIN_ROLE_STRAP: i32 = 2;  // D2    — Grounded = device 1
pub const PIN_LED_STRIP: i32 = 20;  // D9    — WS2812 data line
pub const PIN_WAKE: i32 = 1;        // Piezo doubles as the deep-sleep wake source

// ---------------------------------------------------------------------------
// LED strip (WS2812, GRB)
// ---------------------------------------------------------------------------
pub const NUM_LEDS: usize = 16;
pub const DEFAULT_BRIGHTNESS: u8 = 50; // 0–255
pub const DEFAULT_PATTERN_COLOR: u32 = 0xFF0000;
pub const DEFAULT_PATTERN_DURATION_MS: u32 = 1000;

// ---------------------------------------------------------------------------
// Task Stack Sizes (bytes)
// ---------------------------------------------------------------------------
pub const STACK_CONSOLE: usize = 4096;

// ---------------------------------------------------------------------------
// Timing (milliseconds)
// ---------------------------------------------------------------------------
pub const LOOP_PERIOD_MS: u64 = 10;                 // 100 Hz control loop
pub const BATTERY_CHECK_INTERVAL_MS: u64 = 60_000;  // 1 minute
pub const INACTIVITY_TIMEOUT_MS: u64 = 180_000;     // 3 minutes idle → sleep
pub const LINK_SETTLE_MS: u64 = 500;                // before re-advertising
pub const CALORIE_INTERVAL_MS: u64 = 5000;          // +1 kcal per 5 s Active
pub const DISPLAY_HOLD_MS: u64 = 300;               // success/miss flash hold

// ---------------------------------------------------------------------------
// Tap detection (piezo, 12-bit ADC counts)
// ---------------------------------------------------------------------------
pub const TAP_THRESHOLD: u16 = 800;
pub const TAP_SPIKE_DELTA: u16 = 400;
pub const DIAG_TAP_THRESHOLD: u16 = 300;
pub const DIAG_SPIKE_DELTA: u16 = 150;
pub const TAP_GRACE_MS: u64 = 150;      // ignore LED-induced ringing after arming
pub const TAP_DEBOUNCE_MS: u64 = 200;
pub const DEFAULT_TAP_TIMEOUT_MS: u32 = 3000;

// ---------------------------------------------------------------------------
// Battery (LiPo through a 1:2 divider)
// ---------------------------------------------------------------------------
pub const BATTERY_EMPTY_MV: u32 = 3300;
pub const BATTERY_FULL_MV: u32 = 4200;
pub const BATTERY_DIVIDER: u32 = 2;

/// Absolute and spike thresholds for one detection mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub absolute: u16,
    pub spike_delta: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorConfig {
    pub normal: Thresholds,
    pub diagnostic: Thresholds,
    pub grace_ms: u64,
    pub debounce_ms: u64,
    pub default_timeout_ms: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            normal: Thresholds {
                absolute: TAP_THRESHOLD,
                spike_delta: TAP_SPIKE_DELTA,
            },
            diagnostic: Thresholds {
                absolute: DIAG_TAP_THRESHOLD,
                spike_delta: DIAG_SPIKE_DELTA,
            },
            grace_ms: TAP_GRACE_MS,
            debounce_ms: TAP_DEBOUNCE_MS,
            default_timeout_ms: DEFAULT_TAP_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub calorie_interval_ms: u64,
    pub display_hold_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            calorie_interval_ms: CALORIE_INTERVAL_MS,
            display_hold_ms: DISPLAY_HOLD_MS,
        }
    }
}

/// Everything the control core needs, gathered so tests can shrink timings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceConfig {
    pub detector: DetectorConfig,
    pub session: SessionConfig,
    pub loop_period_ms: u64,
    pub link_settle_ms: u64,
    pub battery_check_interval_ms: u64,
    pub inactivity_timeout_ms: u64,
    /// Power-on state of diagnostic mode (build feature `diagnostic`).
    pub diagnostic: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            detector: DetectorConfig::default(),
            session: SessionConfig::default(),
            loop_period_ms: LOOP_PERIOD_MS,
            link_settle_ms: LINK_SETTLE_MS,
            battery_check_interval_ms: BATTERY_CHECK_INTERVAL_MS,
            inactivity_timeout_ms: INACTIVITY_TIMEOUT_MS,
            diagnostic: cfg!(feature = "diagnostic"),
        }
    }
}
