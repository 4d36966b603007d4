// ReflexPod — Device Root Context
//
// Single owner of everything the control core mutates: identity, battery
// snapshot, session, tap detector, link gate, actuator and power policy.
// Both inbound commands and the periodic tick run against it from the same
// thread, so no locking is needed.

use crate::actuator::{Actuator, LightRequest};
use crate::config::DeviceConfig;
use crate::detector::{TapDetector, TapOutcome};
use crate::events::{LinkEvent, PowerEvent};
use crate::link::{Gate, Transport};
use crate::power::{BatteryProbe, BatteryStatus, PowerMonitor};
use crate::protocol::Outbound;
use crate::sampler::Reading;
use crate::session::WorkoutSession;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub id: u8,
    pub name: String,
}

impl DeviceIdentity {
    pub fn new(id: u8) -> Self {
        Self {
            id,
            name: format!("WorkoutDevice_{}", id),
        }
    }

    /// Device 1 is the pod whose role strap is grounded; the others spread
    /// over ids 2–4 by the last MAC byte.
    pub fn from_strap(grounded: bool, mac_last_byte: u8) -> Self {
        if grounded {
            Self::new(1)
        } else {
            Self::new(2 + mac_last_byte % 3)
        }
    }
}

pub struct Device<A: Actuator, T: Transport> {
    pub(crate) identity: DeviceIdentity,
    pub(crate) battery: BatteryStatus,
    pub(crate) session: WorkoutSession,
    pub(crate) detector: TapDetector,
    pub(crate) gate: Gate<T>,
    pub(crate) actuator: A,
    pub(crate) power: PowerMonitor,
    /// Most recent piezo reading; baseline for the next tap window.
    pub(crate) last_reading: Reading,
    pub(crate) booted_at_ms: u64,
}

impl<A: Actuator, T: Transport> Device<A, T> {
    pub fn new(
        config: DeviceConfig,
        identity: DeviceIdentity,
        actuator: A,
        transport: T,
        now_ms: u64,
    ) -> Self {
        log::info!(
            "{} (id {}) up{}",
            identity.name,
            identity.id,
            if config.diagnostic { " in diagnostic mode" } else { "" }
        );
        Self {
            identity,
            battery: BatteryStatus::default(),
            session: WorkoutSession::new(config.session),
            detector: TapDetector::new(config.detector, config.diagnostic),
            gate: Gate::new(transport, config.link_settle_ms),
            actuator,
            power: PowerMonitor::new(&config, now_ms),
            last_reading: Reading(0),
            booted_at_ms: now_ms,
        }
    }

    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    pub fn battery(&self) -> &BatteryStatus {
        &self.battery
    }

    pub fn session(&self) -> &WorkoutSession {
        &self.session
    }

    pub fn detector(&self) -> &TapDetector {
        &self.detector
    }

    pub fn last_reading(&self) -> Reading {
        self.last_reading
    }

    pub fn is_connected(&self) -> bool {
        self.gate.is_connected()
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn actuator_mut(&mut self) -> &mut A {
        &mut self.actuator
    }

    pub fn transport(&self) -> &T {
        self.gate.transport()
    }

    /// Blink the device id so pods can be told apart on the bench.
    pub fn identify(&mut self) {
        self.actuator.render(&LightRequest::Identify {
            device_id: self.identity.id,
        });
    }

    pub fn on_link_event(&mut self, event: LinkEvent, now_ms: u64) {
        match event {
            LinkEvent::Attached => {
                if self.gate.attach() {
                    self.power.note_activity(now_ms);
                    self.send(self.device_info());
                }
            }
            LinkEvent::Detached => self.gate.detach(now_ms),
            LinkEvent::Payload(raw) => self.handle_payload(&raw, now_ms),
        }
    }

    fn device_info(&self) -> Outbound {
        Outbound::DeviceInfo {
            id: self.identity.id,
            name: self.identity.name.clone(),
            battery: self.battery.percent(),
            connected: self.gate.is_connected(),
        }
    }

    pub(crate) fn send(&mut self, message: Outbound) {
        self.gate.send(&message);
    }

    /// One control-loop iteration after sampling: resolve the tap window,
    /// advance session timers, re-open discovery, check for sleep.
    pub fn tick(&mut self, reading: Reading, now_ms: u64) -> Option<PowerEvent> {
        if let Some(outcome) = self.detector.poll(&mut self.session, reading, now_ms) {
            self.power.note_activity(now_ms);
            self.report_tap(outcome);
        }
        self.last_reading = reading;

        if let Some(entered) = self.session.tick(now_ms) {
            self.actuator.show_state(entered);
        }

        self.gate.tick(now_ms);

        if self.power.should_sleep(now_ms, self.session.state().is_idle()) {
            log::info!("Inactive for too long, requesting sleep");
            return Some(PowerEvent::InactivitySleep);
        }
        None
    }

    fn report_tap(&mut self, outcome: TapOutcome) {
        let device_id = self.identity.id;
        let message = match outcome {
            TapOutcome::Success { reaction_ms } => {
                self.actuator.show_success();
                Outbound::TapResult {
                    device_id,
                    success: true,
                    reaction_time_ms: Some(reaction_ms),
                    timeout_ms: None,
                }
            }
            TapOutcome::Timeout { timeout_ms } => {
                self.actuator.show_missed();
                Outbound::TapResult {
                    device_id,
                    success: false,
                    reaction_time_ms: None,
                    timeout_ms: Some(timeout_ms),
                }
            }
            TapOutcome::Diagnostic => Outbound::TapResult {
                device_id,
                success: true,
                reaction_time_ms: Some(0),
                timeout_ms: None,
            },
        };
        self.send(message);
    }

    /// Refresh the cached battery level when the check interval has passed.
    /// A failed read keeps the previous snapshot.
    pub fn poll_battery<P: BatteryProbe>(&mut self, probe: &mut P, now_ms: u64) {
        if !self.power.battery_check_due(now_ms) {
            return;
        }
        match probe.read_millivolts() {
            Ok(mv) => {
                self.battery.record(mv, now_ms);
                log::debug!("Battery {} mV ({}%)", mv, self.battery.percent());
            }
            Err(e) => log::warn!("Battery read failed: {:#}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strap_selects_identity() {
        assert_eq!(DeviceIdentity::from_strap(true, 200), DeviceIdentity::new(1));
        assert_eq!(DeviceIdentity::from_strap(false, 0).id, 2);
        assert_eq!(DeviceIdentity::from_strap(false, 4).id, 3);
        assert_eq!(DeviceIdentity::from_strap(false, 255).id, 2);
        assert_eq!(DeviceIdentity::from_strap(false, 5).name, "WorkoutDevice_4");
    }
}
