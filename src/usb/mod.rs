pub mod temper;

pub use temper::{decode_celsius, TemperDevice, FAILED_READING_C};
