//! # TEMPer USB temperature ETL
//!
//! Acquisition, persistence and analytics pipeline for the RDing TEMPer
//! family of USB thermometers (USB ID `0c45:7401`):
//!
//! - [`usb::temper`] drives the device: discovery, the fixed initialization
//!   handshake, poll reads and raw frame decoding into calibrated Celsius.
//! - [`database`] appends readings to an embedded SQLite file with bounded
//!   retry, and fetches bounded or time-windowed batches back out.
//! - [`stats`] computes summary statistics (min/max with timestamps, mean,
//!   median, population standard deviation) over a fetched batch.
//!
//! The `temper-logger` binary ties the driver to the console or the
//! database on a fixed polling interval; `temper-stats` queries and
//! summarizes historical readings.

pub mod config;
pub mod database;
pub mod errors;
pub mod models;
pub mod retry;
pub mod stats;
pub mod usb;
pub mod utils;

pub use errors::TemperError;
pub use models::{QueryWindow, Reading, TempStats};
pub use usb::temper::{TemperDevice, FAILED_READING_C};

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, TemperError>;
