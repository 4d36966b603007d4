// ReflexPod — Command Dispatcher
//
// Routes decoded commands to the session, tap detector and actuator, then
// answers. Every recognized command yields exactly one reply; `led_pattern`
// and `workout_command` acknowledge after the effect has been applied.

use crate::actuator::{Actuator, LightRequest, SyncPhase};
use crate::device::Device;
use crate::link::Transport;
use crate::protocol::{self, Command, Outbound, WorkoutAction};

impl<A: Actuator, T: Transport> Device<A, T> {
    /// Decode and dispatch one inbound payload. Malformed payloads are logged
    /// and dropped without a reply; unknown types are ignored.
    pub fn handle_payload(&mut self, raw: &str, now_ms: u64) {
        self.power.note_activity(now_ms);
        match protocol::decode(raw) {
            Ok(Some(command)) => self.dispatch(command, now_ms),
            Ok(None) => log::debug!("Ignoring payload: {}", raw),
            Err(e) => log::warn!("Dropping malformed payload: {:#}", e),
        }
    }

    pub fn dispatch(&mut self, command: Command, now_ms: u64) {
        let device_id = self.identity.id;
        let reply = match command {
            Command::LedPattern { pattern, request } => {
                log::info!("LED pattern '{}'", pattern);
                self.actuator.render(&LightRequest::Pattern(request));
                Outbound::LedAck { pattern, device_id }
            }
            Command::Workout { action, op } => {
                log::info!("Workout action '{}'", action);
                self.apply(op, now_ms);
                Outbound::WorkoutAck { action, device_id }
            }
            Command::GetStatus => Outbound::Status {
                id: device_id,
                name: self.identity.name.clone(),
                battery: self.battery.percent(),
                connected: self.gate.is_connected(),
                uptime: now_ms.saturating_sub(self.booted_at_ms),
            },
            Command::GetWorkoutStatus => Outbound::WorkoutStatus {
                device_id,
                state: self.session.state().code(),
                workout_time: self.session.elapsed_s(),
                calories: self.session.calories(),
                battery: self.battery.percent(),
            },
            Command::Ping => Outbound::Pong {
                device_id,
                timestamp: now_ms,
            },
        };
        self.send(reply);
    }

    fn apply(&mut self, op: WorkoutAction, now_ms: u64) {
        match op {
            WorkoutAction::Start => {
                if let Some(entered) = self.session.start(now_ms) {
                    self.actuator.show_state(entered);
                }
            }
            WorkoutAction::Stop => {
                self.detector.close();
                self.session.stop(now_ms);
                self.actuator.clear();
            }
            WorkoutAction::SetState(Some(state)) => {
                // A window only lives through `activate`; direct assignment drops it.
                self.detector.close();
                let entered = self.session.set_state(state, now_ms);
                self.actuator.show_state(entered);
            }
            WorkoutAction::SetState(None) => log::warn!("set_state without a valid state"),
            WorkoutAction::SyncPattern {
                device_count,
                timestamp_ms,
            } => {
                let phase =
                    SyncPhase::compute(self.identity.id, device_count, timestamp_ms.unwrap_or(now_ms));
                self.actuator.render(&LightRequest::Sync(phase));
            }
            WorkoutAction::Timer {
                seconds,
                total_seconds,
            } => self.actuator.render(&LightRequest::Timer {
                seconds,
                total_seconds,
            }),
            WorkoutAction::Intensity { level } => {
                self.actuator.render(&LightRequest::Intensity { level })
            }
            WorkoutAction::Brightness { level } => self.actuator.set_brightness(level),
            WorkoutAction::StartReactive => {
                if let Some(entered) = self.session.start_reactive(now_ms) {
                    self.detector.reset();
                    self.actuator.show_state(entered);
                }
            }
            WorkoutAction::StopReactive => {
                if self.session.stop_reactive(now_ms) {
                    self.detector.close();
                    self.actuator.clear();
                }
            }
            WorkoutAction::Activate { timeout_ms } => {
                if self
                    .detector
                    .activate(&mut self.session, timeout_ms, self.last_reading, now_ms)
                {
                    self.actuator.show_active_target();
                }
            }
            WorkoutAction::Deactivate => {
                if self.detector.deactivate(&mut self.session, now_ms) {
                    self.actuator.show_waiting();
                }
            }
            WorkoutAction::Diagnostic { enabled } => self.detector.set_diagnostic(enabled),
            WorkoutAction::Unknown => log::debug!("Unknown workout action, acking anyway"),
        }
    }
}
