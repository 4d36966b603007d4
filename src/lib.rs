// ReflexPod — Control Core
//
// Everything that does not touch hardware lives here so it can be exercised
// on the host. The firmware binary wires the target drivers in; the host
// binary wires the bench simulators in.

pub mod actuator;
pub mod config;
pub mod detector;
pub mod device;
pub mod dispatcher;
pub mod events;
pub mod led;
pub mod link;
pub mod power;
pub mod protocol;
pub mod sampler;
pub mod session;
pub mod tasks;

#[cfg(target_os = "espidf")]
pub mod drivers;

#[cfg(not(target_os = "espidf"))]
pub mod bench;

// ---------------------------------------------------------------------------
// Utility: milliseconds since boot
// ---------------------------------------------------------------------------
#[cfg(target_os = "espidf")]
pub fn now_ms() -> u64 {
    (unsafe { esp_idf_sys::esp_timer_get_time() } / 1000) as u64
}

#[cfg(not(target_os = "espidf"))]
pub fn now_ms() -> u64 {
    use std::sync::OnceLock;
    use std::time::Instant;

    static BOOT: OnceLock<Instant> = OnceLock::new();
    BOOT.get_or_init(Instant::now).elapsed().as_millis() as u64
}
