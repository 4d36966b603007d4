pub mod adc;
pub mod battery;
pub mod led_strip;
pub mod piezo;
