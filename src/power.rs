// ReflexPod — Battery & Power Policy
//
// Battery sampling itself lives behind `BatteryProbe`; this module keeps the
// cached reading, converts it to a percentage and decides when the control
// loop should give up and let the device sleep.

use crate::config::*;

pub trait BatteryProbe {
    /// Cell voltage in millivolts (after undoing the divider).
    fn read_millivolts(&mut self) -> anyhow::Result<u32>;
}

/// Map a LiPo voltage onto 0–100 % (3.3 V empty, 4.2 V full).
pub fn lipo_percent(millivolts: u32) -> u8 {
    let span = BATTERY_FULL_MV - BATTERY_EMPTY_MV;
    let above = millivolts.saturating_sub(BATTERY_EMPTY_MV).min(span);
    (above * 100 / span) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryStatus {
    percent: u8,
    millivolts: Option<u32>,
    refreshed_at_ms: Option<u64>,
}

impl Default for BatteryStatus {
    fn default() -> Self {
        Self {
            percent: 100,
            millivolts: None,
            refreshed_at_ms: None,
        }
    }
}

impl BatteryStatus {
    pub fn percent(&self) -> u8 {
        self.percent
    }

    pub fn millivolts(&self) -> Option<u32> {
        self.millivolts
    }

    pub fn refreshed_at_ms(&self) -> Option<u64> {
        self.refreshed_at_ms
    }

    /// Cache a new reading. The percentage never rises: load sag recovers
    /// between samples and would otherwise make the level bounce.
    pub fn record(&mut self, millivolts: u32, now_ms: u64) {
        self.millivolts = Some(millivolts);
        self.refreshed_at_ms = Some(now_ms);
        self.percent = self.percent.min(lipo_percent(millivolts));
    }
}

pub struct PowerMonitor {
    battery_interval_ms: u64,
    inactivity_timeout_ms: u64,
    next_battery_check_ms: u64,
    last_activity_ms: u64,
}

impl PowerMonitor {
    pub fn new(config: &DeviceConfig, now_ms: u64) -> Self {
        Self {
            battery_interval_ms: config.battery_check_interval_ms,
            inactivity_timeout_ms: config.inactivity_timeout_ms,
            next_battery_check_ms: now_ms,
            last_activity_ms: now_ms,
        }
    }

    pub fn note_activity(&mut self, now_ms: u64) {
        self.last_activity_ms = self.last_activity_ms.max(now_ms);
    }

    /// True once per interval; the first call is due immediately.
    pub fn battery_check_due(&mut self, now_ms: u64) -> bool {
        if now_ms < self.next_battery_check_ms {
            return false;
        }
        self.next_battery_check_ms = now_ms + self.battery_interval_ms;
        true
    }

    /// Sleep only from an idle session; any running session keeps us awake.
    pub fn should_sleep(&self, now_ms: u64, session_idle: bool) -> bool {
        session_idle && now_ms.saturating_sub(self.last_activity_ms) > self.inactivity_timeout_ms
    }
}
