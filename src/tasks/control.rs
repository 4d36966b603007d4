// ReflexPod — Control Task
//
// The single logical thread of control. Each ~10 ms iteration:
//   1. drains every pending link event (commands, attach/detach),
//   2. samples the piezo,
//   3. ticks the device (tap window, session timers, link settle),
//   4. refreshes the battery when due.
// Returns when the device asks to sleep.

use std::sync::mpsc::{Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use crate::actuator::Actuator;
use crate::device::Device;
use crate::events::{LinkEvent, PowerEvent};
use crate::link::Transport;
use crate::power::BatteryProbe;
use crate::sampler::Sampler;

pub fn control_task<A, T, S, P>(
    device: &mut Device<A, T>,
    sampler: &mut S,
    probe: &mut P,
    link_rx: Receiver<LinkEvent>,
    period: Duration,
) -> PowerEvent
where
    A: Actuator,
    T: Transport,
    S: Sampler,
    P: BatteryProbe,
{
    log::info!("Control task started ({} ms period)", period.as_millis());

    let mut link_open = true;

    loop {
        let tick_start = Instant::now();
        let now = crate::now_ms();

        // 1. Link events, in arrival order.
        while link_open {
            match link_rx.try_recv() {
                Ok(event) => device.on_link_event(event, now),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    log::warn!("Link channel closed, running without commands");
                    link_open = false;
                }
            }
        }

        // 2. Sample. A failed read reuses the previous value.
        let reading = match sampler.sample() {
            Ok(reading) => reading,
            Err(e) => {
                log::warn!("Piezo read error: {:#}", e);
                device.last_reading()
            }
        };

        // 3. Detector, session, link.
        if let Some(event) = device.tick(reading, now) {
            return event;
        }

        // 4. Battery.
        device.poll_battery(probe, now);

        // Sleep for the remainder of the period.
        let elapsed = tick_start.elapsed();
        if elapsed < period {
            thread::sleep(period - elapsed);
        }
    }
}
