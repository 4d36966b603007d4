pub mod console;
pub mod control;
