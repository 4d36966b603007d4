// ReflexPod — Host Bench
//
// Stand-ins for the pod hardware so the control core can run on a desktop:
// a noisy piezo that spikes when poked, a slowly draining cell, and an
// actuator that logs what the strip would show.

use std::sync::atomic::Ordering;

use crate::actuator::{Actuator, LightRequest};
use crate::config::{BATTERY_EMPTY_MV, DEFAULT_BRIGHTNESS};
use crate::led;
use crate::power::BatteryProbe;
use crate::sampler::{Reading, Sampler};
use crate::tasks::console::TapTrigger;

const NOISE_FLOOR: u16 = 40;
const HIT_LEVEL: u16 = 2400;

/// Piezo at rest with a little jitter; one `HIT_LEVEL` sample per trigger.
pub struct SimulatedPiezo {
    trigger: TapTrigger,
    jitter: u16,
}

impl SimulatedPiezo {
    pub fn new(trigger: TapTrigger) -> Self {
        Self { trigger, jitter: 0 }
    }
}

impl Sampler for SimulatedPiezo {
    fn sample(&mut self) -> anyhow::Result<Reading> {
        if self.trigger.swap(false, Ordering::SeqCst) {
            return Ok(Reading(HIT_LEVEL));
        }
        self.jitter = (self.jitter + 7) % 23;
        Ok(Reading(NOISE_FLOOR + self.jitter))
    }
}

/// LiPo losing a few millivolts per reading.
pub struct SimulatedCell {
    millivolts: u32,
    drain_mv: u32,
}

impl SimulatedCell {
    pub fn new(millivolts: u32, drain_mv: u32) -> Self {
        Self {
            millivolts,
            drain_mv,
        }
    }
}

impl Default for SimulatedCell {
    fn default() -> Self {
        Self::new(4_070, 9)
    }
}

impl BatteryProbe for SimulatedCell {
    fn read_millivolts(&mut self) -> anyhow::Result<u32> {
        let mv = self.millivolts;
        self.millivolts = mv.saturating_sub(self.drain_mv).max(BATTERY_EMPTY_MV);
        Ok(mv)
    }
}

/// Logs each request instead of driving pixels. Keeps the last one for
/// inspection.
pub struct LogActuator {
    brightness: u8,
    last: Option<LightRequest>,
}

impl Default for LogActuator {
    fn default() -> Self {
        Self {
            brightness: DEFAULT_BRIGHTNESS,
            last: None,
        }
    }
}

impl LogActuator {
    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    pub fn last(&self) -> Option<&LightRequest> {
        self.last.as_ref()
    }
}

impl Actuator for LogActuator {
    fn render(&mut self, request: &LightRequest) {
        let steps = led::steps(request);
        let total_ms: u32 = steps.iter().map(|s| s.hold_ms).sum();
        log::info!("LED {:?} ({} frames, {} ms)", request, steps.len(), total_ms);
        self.last = Some(*request);
    }

    fn set_brightness(&mut self, level: u8) {
        log::info!("LED brightness {}", level);
        self.brightness = level;
    }
}
