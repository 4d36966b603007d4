// ReflexPod — Piezo Disc Sampler

use std::rc::Rc;

use crate::drivers::adc::AdcUnit;
use crate::sampler::{Reading, Sampler};

pub struct Piezo {
    adc: Rc<AdcUnit>,
    channel: u32,
}

impl Piezo {
    pub fn new(adc: Rc<AdcUnit>, channel: u32) -> anyhow::Result<Self> {
        adc.configure(channel)?;
        Ok(Self { adc, channel })
    }
}

impl Sampler for Piezo {
    fn sample(&mut self) -> anyhow::Result<Reading> {
        self.adc.read(self.channel).map(Reading)
    }
}
