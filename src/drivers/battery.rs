// ReflexPod — Battery Voltage Probe
//
// LiPo behind a 1:2 resistor divider on an ADC1 channel. A handful of
// conversions are averaged to ride out LED-load ripple.

use std::rc::Rc;

use crate::config::BATTERY_DIVIDER;
use crate::drivers::adc::AdcUnit;
use crate::power::BatteryProbe;

const SAMPLES: u32 = 8;
const FULL_SCALE_MV: u32 = 3300;

pub struct Battery {
    adc: Rc<AdcUnit>,
    channel: u32,
}

impl Battery {
    pub fn new(adc: Rc<AdcUnit>, channel: u32) -> anyhow::Result<Self> {
        adc.configure(channel)?;
        Ok(Self { adc, channel })
    }
}

impl BatteryProbe for Battery {
    fn read_millivolts(&mut self) -> anyhow::Result<u32> {
        let mut sum = 0u32;
        for _ in 0..SAMPLES {
            sum += u32::from(self.adc.read(self.channel)?);
        }
        let raw = sum / SAMPLES;
        Ok(raw * FULL_SCALE_MV / 4095 * BATTERY_DIVIDER)
    }
}
