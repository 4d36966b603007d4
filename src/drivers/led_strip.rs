// ReflexPod — WS2812 Ring Driver
//
// Bit-bangs the 16-pixel ring through one RMT channel. Frames come from
// `led::steps`; each is written, then held for its duration. Pattern
// playback blocks the control loop by design of the actuator contract.

use std::thread;
use std::time::Duration;

use esp_idf_hal::gpio::OutputPin;
use esp_idf_hal::peripheral::Peripheral;
use esp_idf_hal::rmt::config::TransmitConfig;
use esp_idf_hal::rmt::{FixedLengthSignal, PinState, Pulse, RmtChannel, TxRmtDriver};

use crate::actuator::{Actuator, LightRequest};
use crate::config::{DEFAULT_BRIGHTNESS, NUM_LEDS};
use crate::led::{self, Frame};

const BITS: usize = NUM_LEDS * 24;

pub struct LedStrip<'d> {
    tx: TxRmtDriver<'d>,
    /// (T0H, T0L, T1H, T1L)
    timing: (Pulse, Pulse, Pulse, Pulse),
    brightness: u8,
}

impl<'d> LedStrip<'d> {
    pub fn new<C: RmtChannel>(
        channel: impl Peripheral<P = C> + 'd,
        pin: impl Peripheral<P = impl OutputPin> + 'd,
    ) -> anyhow::Result<Self> {
        let config = TransmitConfig::new().clock_divider(1);
        let tx = TxRmtDriver::new(channel, pin, &config)?;

        let ticks_hz = tx.counter_clock()?;
        let pulse = |state, ns| Pulse::new_with_duration(ticks_hz, state, &Duration::from_nanos(ns));
        let timing = (
            pulse(PinState::High, 350)?,
            pulse(PinState::Low, 800)?,
            pulse(PinState::High, 700)?,
            pulse(PinState::Low, 600)?,
        );

        let mut strip = Self {
            tx,
            timing,
            brightness: DEFAULT_BRIGHTNESS,
        };
        strip.write(&[led::OFF; NUM_LEDS])?;
        Ok(strip)
    }

    /// Push one frame (GRB order, MSB first) with brightness applied.
    pub fn write(&mut self, frame: &Frame) -> anyhow::Result<()> {
        let (t0h, t0l, t1h, t1l) = self.timing;
        let mut signal = FixedLengthSignal::<BITS>::new();
        for (i, px) in frame.iter().enumerate() {
            let (r, g, b) = led::dim(*px, self.brightness);
            let grb = (u32::from(g) << 16) | (u32::from(r) << 8) | u32::from(b);
            for bit in 0..24 {
                let one = grb & (1 << (23 - bit)) != 0;
                let pair = if one { (t1h, t1l) } else { (t0h, t0l) };
                signal.set(i * 24 + bit, &pair)?;
            }
        }
        self.tx.start_blocking(&signal)?;
        Ok(())
    }
}

impl Actuator for LedStrip<'_> {
    fn render(&mut self, request: &LightRequest) {
        let steps = led::steps(request);
        if steps.is_empty() {
            log::debug!("Nothing to draw for {:?}", request);
            return;
        }
        for step in steps {
            if let Err(e) = self.write(&step.frame) {
                log::warn!("LED write failed: {:#}", e);
                return;
            }
            if step.hold_ms > 0 {
                thread::sleep(Duration::from_millis(u64::from(step.hold_ms)));
            }
        }
    }

    fn set_brightness(&mut self, level: u8) {
        log::info!("LED brightness {}", level);
        self.brightness = level;
    }
}
