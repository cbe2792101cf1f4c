//! Error taxonomy for the acquisition, persistence and analytics paths.
//!
//! Handshake failures are fatal and abort startup. Steady-state poll
//! failures surface as [`TemperError::PollError`] and may be swallowed into
//! the sentinel value by the acquisition loop. Persistence failures are
//! retried up to a fixed budget before surfacing as
//! [`TemperError::PersistenceExhausted`].

use thiserror::Error;

/// A single USB transfer that did not complete as expected.
#[derive(Error, Debug)]
pub enum TransferError {
    /// The underlying control or interrupt transfer failed outright.
    #[error("USB transfer failed: {0}")]
    Usb(#[from] rusb::Error),

    /// An interrupt read returned fewer bytes than a full frame.
    #[error("short interrupt read: {got} of {expected} bytes")]
    ShortRead { got: usize, expected: usize },

    /// The device handle was already closed.
    #[error("device handle is closed")]
    Closed,
}

/// Errors produced by the pipeline.
#[derive(Error, Debug)]
pub enum TemperError {
    /// Fewer matching sensors are attached than the requested index needs.
    #[error("no TEMPer device at index {index}, {found} matching device(s) attached")]
    DeviceNotFound { index: usize, found: usize },

    /// Configuration selection or interface claiming failed after discovery.
    #[error("could not claim the device ({action}): {source}")]
    DeviceClaimFailed {
        action: &'static str,
        #[source]
        source: rusb::Error,
    },

    /// The initialization handshake aborted; polling must not start.
    #[error("initialization handshake failed at {step}: {source}")]
    ProtocolError {
        step: &'static str,
        #[source]
        source: TransferError,
    },

    /// A steady-state temperature poll failed.
    #[error("temperature poll failed: {source}")]
    PollError {
        #[source]
        source: TransferError,
    },

    /// The write retry budget was used up without a successful insert.
    #[error("giving up after {attempts} failed write attempt(s): {source}")]
    PersistenceExhausted {
        attempts: u32,
        #[source]
        source: rusqlite::Error,
    },

    /// Storage could not be opened, or a statement could not be prepared
    /// or stepped.
    #[error("query failed ({context}): {source}")]
    QueryError {
        context: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// Statistics were requested over zero records.
    #[error("no records in the selected window")]
    EmptyDataset,

    /// USB transport failure outside the named taxonomy, e.g. device
    /// enumeration or open.
    #[error("USB error: {0}")]
    Usb(#[from] rusb::Error),
}
