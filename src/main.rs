// ReflexPod — Firmware Entry Point
//
// Boot sequence (target):
//   1. Read the role strap and MAC to pick the device id.
//   2. Bring up the ADC (piezo + battery) and the WS2812 ring.
//   3. Blink the device id.
//   4. Spawn the console link task.
//   5. Run the control loop on the main thread.
//
// The pod enters deep sleep when the session has been idle with no commands
// or taps for 3 minutes. A tap on the piezo wakes it.
//
// On the host the same control loop runs against the bench simulators, with
// the console (stdin/stdout) as the link.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use reflexpod::config::*;
use reflexpod::device::{Device, DeviceIdentity};
use reflexpod::now_ms;
use reflexpod::tasks;
use reflexpod::tasks::console::ConsoleTransport;

#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    use std::rc::Rc;

    use esp_idf_hal::gpio::{PinDriver, Pull};
    use esp_idf_hal::prelude::*;
    use reflexpod::actuator::Actuator;
    use reflexpod::drivers::adc::AdcUnit;
    use reflexpod::drivers::battery::Battery;
    use reflexpod::drivers::led_strip::LedStrip;
    use reflexpod::drivers::piezo::Piezo;

    // Link esp-idf-sys runtime patches and initialise logging.
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();
    log::info!("ReflexPod firmware starting…");

    // ---- Peripherals ------------------------------------------------------
    let peripherals = Peripherals::take()?;

    // ---- Identity ---------------------------------------------------------
    // Role strap on D2 (GPIO2), pulled up; grounded means device 1.
    let mut strap = PinDriver::input(peripherals.pins.gpio2)?;
    strap.set_pull(Pull::Up)?;
    thread::sleep(Duration::from_millis(5));
    let grounded = strap.is_low();
    drop(strap);
    let identity = DeviceIdentity::from_strap(grounded, mac_last_byte());

    // ---- Sensors ----------------------------------------------------------
    let adc = Rc::new(AdcUnit::new()?);
    let mut piezo = Piezo::new(Rc::clone(&adc), PIN_PIEZO_ADC)?;
    let mut battery = Battery::new(adc, PIN_BATTERY_ADC)?;

    // ---- LED ring on D9 (GPIO20) -----------------------------------------
    let strip = LedStrip::new(peripherals.rmt.channel0, peripherals.pins.gpio20)?;

    // ---- Link -------------------------------------------------------------
    let (link_tx, link_rx) = mpsc::channel();
    thread::Builder::new()
        .name("console".into())
        .stack_size(STACK_CONSOLE)
        .spawn(move || {
            tasks::console::console_task(std::io::stdin().lock(), link_tx, None);
        })?;

    // ---- Control loop -----------------------------------------------------
    let config = DeviceConfig::default();
    let mut device = Device::new(
        config,
        identity,
        strip,
        ConsoleTransport::new(std::io::stdout()),
        now_ms(),
    );
    device.identify();
    log::info!("Boot complete — entering normal operation");

    let event = tasks::control::control_task(
        &mut device,
        &mut piezo,
        &mut battery,
        link_rx,
        Duration::from_millis(config.loop_period_ms),
    );
    log::info!("{:?} — powering down", event);
    device.actuator_mut().clear();
    enter_deep_sleep();
}

/// Last byte of the factory MAC; 0 if it cannot be read.
#[cfg(target_os = "espidf")]
fn mac_last_byte() -> u8 {
    let mut mac = [0u8; 6];
    let ret = unsafe { esp_idf_sys::esp_efuse_mac_get_default(mac.as_mut_ptr()) };
    if ret != esp_idf_sys::ESP_OK {
        log::warn!("MAC read failed ({})", ret);
    }
    mac[5]
}

/// Configure wakeup on a piezo hit and enter deep sleep. Does not return.
#[cfg(target_os = "espidf")]
fn enter_deep_sleep() -> ! {
    log::info!("Entering deep sleep — wake on tap (GPIO{})", PIN_WAKE);
    unsafe {
        esp_idf_sys::esp_deep_sleep_enable_gpio_wakeup(
            1u64 << PIN_WAKE,
            esp_idf_sys::esp_deepsleep_gpio_wake_up_mode_t_ESP_GPIO_WAKEUP_GPIO_HIGH,
        );
        esp_idf_sys::esp_deep_sleep_start();
    }
}

#[cfg(not(target_os = "espidf"))]
fn main() -> anyhow::Result<()> {
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    use reflexpod::bench::{LogActuator, SimulatedCell, SimulatedPiezo};

    // Payloads go to stdout; logs (RUST_LOG) go to stderr.
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();
    log::info!("ReflexPod bench starting…");

    let trigger = Arc::new(AtomicBool::new(false));
    let mut piezo = SimulatedPiezo::new(Arc::clone(&trigger));
    let mut cell = SimulatedCell::default();

    let (link_tx, link_rx) = mpsc::channel();
    thread::Builder::new()
        .name("console".into())
        .spawn(move || {
            tasks::console::console_task(std::io::stdin().lock(), link_tx, Some(trigger));
        })?;

    let config = DeviceConfig::default();
    let mut device = Device::new(
        config,
        DeviceIdentity::new(1),
        LogActuator::default(),
        ConsoleTransport::new(std::io::stdout()),
        now_ms(),
    );
    device.identify();

    let event = tasks::control::control_task(
        &mut device,
        &mut piezo,
        &mut cell,
        link_rx,
        Duration::from_millis(config.loop_period_ms),
    );
    log::info!("{:?} — the pod would sleep now", event);
    Ok(())
}
