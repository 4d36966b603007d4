// ReflexPod — Wire Protocol
//
// Inbound commands and outbound notifications are single JSON objects
// discriminated by `type`. Decoding distinguishes a payload that cannot be
// understood at all (an error: logged and dropped) from one whose `type` is
// simply not ours (ignored without a reply).

use anyhow::{anyhow, Context};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::actuator::{PatternKind, PatternRequest};
use crate::config::{DEFAULT_BRIGHTNESS, DEFAULT_PATTERN_COLOR, DEFAULT_PATTERN_DURATION_MS};
use crate::session::SessionState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    LedPattern {
        /// Name as sent, echoed in the ack.
        pattern: String,
        request: PatternRequest,
    },
    Workout {
        /// Action string as sent, echoed in the ack.
        action: String,
        op: WorkoutAction,
    },
    GetStatus,
    GetWorkoutStatus,
    Ping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkoutAction {
    Start,
    Stop,
    /// `None` when `state` is missing or not a known code.
    SetState(Option<SessionState>),
    SyncPattern {
        device_count: u32,
        /// Falls back to the device clock when absent.
        timestamp_ms: Option<u64>,
    },
    Timer {
        seconds: u32,
        total_seconds: u32,
    },
    Intensity {
        level: u8,
    },
    Brightness {
        level: u8,
    },
    StartReactive,
    StopReactive,
    Activate {
        timeout_ms: u32,
    },
    Deactivate,
    Diagnostic {
        enabled: bool,
    },
    Unknown,
}

// Only the discriminators (`pattern`, `action`) are required. Every other
// field falls back to its default when absent, null, mistyped or out of range.

#[derive(Deserialize)]
struct LedPatternFields {
    pattern: String,
    color: Option<Value>,
    duration: Option<Value>,
}

#[derive(Deserialize)]
struct WorkoutFields {
    action: String,
    state: Option<Value>,
    device_count: Option<Value>,
    timestamp: Option<Value>,
    seconds: Option<Value>,
    total_seconds: Option<Value>,
    level: Option<Value>,
    timeout_ms: Option<Value>,
    enabled: Option<Value>,
}

/// Typed view of an optional field; `None` unless it converts cleanly.
fn lenient<T: DeserializeOwned>(name: &str, field: Option<Value>) -> Option<T> {
    let value = field.filter(|v| !v.is_null())?;
    match serde_json::from_value(value) {
        Ok(typed) => Some(typed),
        Err(e) => {
            log::warn!("Ignoring field `{}`: {}", name, e);
            None
        }
    }
}

impl LedPatternFields {
    fn into_command(self) -> Command {
        let color = lenient("color", self.color).unwrap_or(DEFAULT_PATTERN_COLOR);
        let duration = lenient("duration", self.duration).unwrap_or(DEFAULT_PATTERN_DURATION_MS);
        Command::LedPattern {
            request: PatternRequest::new(
                self.pattern.parse().unwrap_or(PatternKind::Unknown),
                color,
                duration,
            ),
            pattern: self.pattern,
        }
    }
}

impl WorkoutFields {
    fn into_command(self) -> Command {
        let op = match self.action.as_str() {
            "start" => WorkoutAction::Start,
            "stop" => WorkoutAction::Stop,
            "set_state" => WorkoutAction::SetState(
                lenient::<i64>("state", self.state).and_then(SessionState::from_code),
            ),
            "sync_pattern" => WorkoutAction::SyncPattern {
                device_count: lenient("device_count", self.device_count).unwrap_or(1),
                timestamp_ms: lenient("timestamp", self.timestamp),
            },
            "timer" => WorkoutAction::Timer {
                seconds: lenient("seconds", self.seconds).unwrap_or(0),
                total_seconds: lenient("total_seconds", self.total_seconds).unwrap_or(60),
            },
            "intensity" => WorkoutAction::Intensity {
                level: lenient("level", self.level).unwrap_or(5),
            },
            "brightness" => WorkoutAction::Brightness {
                level: lenient("level", self.level).unwrap_or(DEFAULT_BRIGHTNESS),
            },
            "start_reactive" => WorkoutAction::StartReactive,
            "stop_reactive" => WorkoutAction::StopReactive,
            "activate" => WorkoutAction::Activate {
                timeout_ms: lenient("timeout_ms", self.timeout_ms).unwrap_or(0),
            },
            "deactivate" => WorkoutAction::Deactivate,
            "diagnostic" => WorkoutAction::Diagnostic {
                enabled: lenient("enabled", self.enabled).unwrap_or(true),
            },
            _ => WorkoutAction::Unknown,
        };
        Command::Workout {
            action: self.action,
            op,
        }
    }
}

/// Decode one inbound payload.
///
/// `Err` for malformed input (not JSON, not an object, `pattern` or `action`
/// missing or not a string). `Ok(None)` when `type` is absent or not a
/// command this device understands.
pub fn decode(raw: &str) -> anyhow::Result<Option<Command>> {
    let value: Value = serde_json::from_str(raw).context("payload is not JSON")?;
    let kind = match &value {
        Value::Object(fields) => fields.get("type").and_then(Value::as_str).map(str::to_owned),
        _ => return Err(anyhow!("payload is not a JSON object")),
    };
    let Some(kind) = kind else {
        return Ok(None);
    };

    let command = match kind.as_str() {
        "led_pattern" => serde_json::from_value::<LedPatternFields>(value)
            .context("bad led_pattern")?
            .into_command(),
        "workout_command" => serde_json::from_value::<WorkoutFields>(value)
            .context("bad workout_command")?
            .into_command(),
        "get_status" => Command::GetStatus,
        "get_workout_status" => Command::GetWorkoutStatus,
        "ping" => Command::Ping,
        _ => return Ok(None),
    };
    Ok(Some(command))
}

/// Every payload the device sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outbound {
    DeviceInfo {
        id: u8,
        name: String,
        battery: u8,
        connected: bool,
    },
    LedAck {
        pattern: String,
        device_id: u8,
    },
    WorkoutAck {
        action: String,
        device_id: u8,
    },
    Status {
        id: u8,
        name: String,
        battery: u8,
        connected: bool,
        uptime: u64,
    },
    WorkoutStatus {
        device_id: u8,
        state: u8,
        workout_time: u64,
        calories: u32,
        battery: u8,
    },
    Pong {
        device_id: u8,
        timestamp: u64,
    },
    TapResult {
        device_id: u8,
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reaction_time_ms: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u32>,
    },
}
