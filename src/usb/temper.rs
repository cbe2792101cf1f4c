//! USB protocol driver for RDing TEMPer thermometers.
//!
//! The sensor is a USB HID-class device addressed with raw control and
//! interrupt transfers. After claiming both of its interfaces the firmware
//! requires a fixed four-step command sequence before it answers
//! temperature queries; each poll afterwards is one command write followed
//! by one 8-byte interrupt read.
//!
//! Frame layout: the raw temperature word sits at bytes 2 (high) and
//! 3 (low) of the interrupt frame. The word is in sensor units of
//! 1/256 degree Celsius; a signed calibration offset in the same units is
//! added before scaling.

use std::time::Duration;

use log::{debug, warn};
use rusb::{DeviceHandle, GlobalContext};

use crate::errors::{TemperError, TransferError};

// TEMPer protocol constants (RDing TEMPerV1 family)
const VENDOR_ID: u16 = 0x0c45;
const PRODUCT_ID: u16 = 0x7401;

const INTERFACE_1: u8 = 0x00;
const INTERFACE_2: u8 = 0x01;
const CONFIGURATION: u8 = 0x01;

const ENDPOINT_INT_IN: u8 = 0x82;
const FRAME_LEN: usize = 8;

const CTRL_REQUEST_TYPE: u8 = 0x21;
const CTRL_REQUEST: u8 = 0x09;
const CTRL_VALUE_INIT: u16 = 0x0201;
const CTRL_INDEX_INIT: u16 = 0x00;
const CTRL_VALUE_COMMAND: u16 = 0x0200;
const CTRL_INDEX_COMMAND: u16 = 0x01;

/// Every device I/O call blocks up to this long.
const TIMEOUT: Duration = Duration::from_millis(5000);

// Command frames understood by the sensor firmware.
const CMD_TEMPERATURE: [u8; FRAME_LEN] = [0x01, 0x80, 0x33, 0x01, 0x00, 0x00, 0x00, 0x00];
const CMD_INIT_1: [u8; FRAME_LEN] = [0x01, 0x82, 0x77, 0x01, 0x00, 0x00, 0x00, 0x00];
const CMD_INIT_2: [u8; FRAME_LEN] = [0x01, 0x86, 0xff, 0x01, 0x00, 0x00, 0x00, 0x00];

/// Sensor units per degree Celsius: 32000 units span 125 degrees.
const CELSIUS_SCALE: f64 = 125.0 / 32000.0;

/// Value substituted for a reading when a steady-state poll fails
/// gracefully instead of propagating.
pub const FAILED_READING_C: f64 = -9999.99;

/// Decode the raw temperature word of an interrupt frame into calibrated
/// degrees Celsius.
///
/// `raw = frame[3] + (frame[2] << 8)` as an unsigned 16-bit composition;
/// the signed calibration offset is applied in raw sensor units, before
/// scaling.
pub fn decode_celsius(frame: &[u8; FRAME_LEN], calibration: i32) -> f64 {
    let raw = i32::from(frame[3]) + (i32::from(frame[2]) << 8);
    f64::from(raw + calibration) * CELSIUS_SCALE
}

/// Handle to one opened, initialized TEMPer sensor.
///
/// Owns the USB connection for its lifetime; the calibration offset and
/// device index are explicit fields rather than process-wide state.
/// Dropping the handle releases the claimed interfaces.
pub struct TemperDevice {
    handle: Option<DeviceHandle<GlobalContext>>,
    device_index: usize,
    calibration: i32,
}

impl TemperDevice {
    /// Discover the `device_index`-th attached TEMPer sensor, claim it and
    /// run the initialization handshake.
    ///
    /// Fails with [`TemperError::DeviceNotFound`] (before any device I/O)
    /// if fewer than `device_index + 1` matching sensors are attached,
    /// [`TemperError::DeviceClaimFailed`] if the configuration or either
    /// interface cannot be claimed, and [`TemperError::ProtocolError`] if
    /// any handshake step fails; polling must not be attempted after a
    /// failed handshake.
    pub fn open(device_index: usize, calibration: i32) -> Result<Self, TemperError> {
        let mut handle = find_device(device_index)?;

        // The kernel HID driver usually owns the device. Detach failure is
        // non-fatal: the device may already be free.
        detach_kernel_driver(&mut handle, INTERFACE_1);
        detach_kernel_driver(&mut handle, INTERFACE_2);

        handle
            .set_active_configuration(CONFIGURATION)
            .map_err(|source| TemperError::DeviceClaimFailed {
                action: "set configuration 1",
                source,
            })?;
        handle
            .claim_interface(INTERFACE_1)
            .map_err(|source| TemperError::DeviceClaimFailed {
                action: "claim interface 0",
                source,
            })?;
        handle
            .claim_interface(INTERFACE_2)
            .map_err(|source| TemperError::DeviceClaimFailed {
                action: "claim interface 1",
                source,
            })?;

        let device = TemperDevice {
            handle: Some(handle),
            device_index,
            calibration,
        };
        device.handshake()?;
        Ok(device)
    }

    /// Index this handle was discovered at.
    pub fn device_index(&self) -> usize {
        self.device_index
    }

    /// Calibration offset applied to every decoded reading, in raw sensor
    /// units.
    pub fn calibration(&self) -> i32 {
        self.calibration
    }

    /// The fixed four-step initialization sequence, run exactly once per
    /// open. The init-2 command makes the device emit two frames; both are
    /// read and discarded.
    fn handshake(&self) -> Result<(), TemperError> {
        let step = |step, source| TemperError::ProtocolError { step, source };

        self.init_control().map_err(|e| step("init control", e))?;

        self.write_command(&CMD_TEMPERATURE)
            .and_then(|_| self.read_frame())
            .map_err(|e| step("temperature query", e))?;

        self.write_command(&CMD_INIT_1)
            .and_then(|_| self.read_frame())
            .map_err(|e| step("init-1", e))?;

        self.write_command(&CMD_INIT_2)
            .and_then(|_| self.read_frame())
            .and_then(|_| self.read_frame())
            .map_err(|e| step("init-2", e))?;

        debug!("Handshake complete for device {}", self.device_index);
        Ok(())
    }

    /// Poll the sensor once and decode the response into calibrated
    /// degrees Celsius. Transfer failures propagate as
    /// [`TemperError::PollError`].
    pub fn read_celsius(&self) -> Result<f64, TemperError> {
        let frame = self
            .write_command(&CMD_TEMPERATURE)
            .and_then(|_| self.read_frame())
            .map_err(|source| TemperError::PollError { source })?;
        Ok(decode_celsius(&frame, self.calibration))
    }

    /// Poll the sensor once, substituting [`FAILED_READING_C`] when the
    /// read fails so a long-running acquisition loop keeps going.
    pub fn temperature_or_sentinel(&self) -> f64 {
        match self.read_celsius() {
            Ok(tempc) => tempc,
            Err(e) => {
                warn!("Substituting {} for failed poll: {}", FAILED_READING_C, e);
                FAILED_READING_C
            }
        }
    }

    /// Release both claimed interfaces and close the transport.
    ///
    /// Idempotent: calling on an already-closed handle is a no-op.
    pub fn close(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            for interface in [INTERFACE_1, INTERFACE_2] {
                if let Err(e) = handle.release_interface(interface) {
                    debug!("Release of interface {} failed: {}", interface, e);
                }
            }
            debug!("Closed device {}", self.device_index);
        }
    }

    /// The 2-byte control command that precedes the handshake proper.
    /// No response is read.
    fn init_control(&self) -> Result<(), TransferError> {
        let handle = self.handle.as_ref().ok_or(TransferError::Closed)?;
        let payload = [0x01, 0x01];
        handle.write_control(
            CTRL_REQUEST_TYPE,
            CTRL_REQUEST,
            CTRL_VALUE_INIT,
            CTRL_INDEX_INIT,
            &payload,
            TIMEOUT,
        )?;
        debug!("Control write {:02x?}", payload);
        Ok(())
    }

    /// Send one 8-byte command frame over the control endpoint.
    fn write_command(&self, payload: &[u8; FRAME_LEN]) -> Result<(), TransferError> {
        let handle = self.handle.as_ref().ok_or(TransferError::Closed)?;
        handle.write_control(
            CTRL_REQUEST_TYPE,
            CTRL_REQUEST,
            CTRL_VALUE_COMMAND,
            CTRL_INDEX_COMMAND,
            payload,
            TIMEOUT,
        )?;
        debug!("Control write {:02x?}", payload);
        Ok(())
    }

    /// Read one full 8-byte frame from the interrupt-in endpoint. A short
    /// read is an error: the decoder relies on a complete frame.
    fn read_frame(&self) -> Result<[u8; FRAME_LEN], TransferError> {
        let handle = self.handle.as_ref().ok_or(TransferError::Closed)?;
        let mut frame = [0u8; FRAME_LEN];
        let got = handle.read_interrupt(ENDPOINT_INT_IN, &mut frame, TIMEOUT)?;
        if got != FRAME_LEN {
            return Err(TransferError::ShortRead {
                got,
                expected: FRAME_LEN,
            });
        }
        debug!("Interrupt read {:02x?}", frame);
        Ok(frame)
    }
}

impl Drop for TemperDevice {
    fn drop(&mut self) {
        self.close();
    }
}

/// Enumerate attached devices and open the `device_index`-th one matching
/// the TEMPer vendor/product pair. Selection happens before any I/O on the
/// device itself.
fn find_device(device_index: usize) -> Result<DeviceHandle<GlobalContext>, TemperError> {
    let mut found = 0;
    for device in rusb::devices()?.iter() {
        let descriptor = match device.device_descriptor() {
            Ok(descriptor) => descriptor,
            Err(_) => continue,
        };
        if descriptor.vendor_id() != VENDOR_ID || descriptor.product_id() != PRODUCT_ID {
            continue;
        }
        if found == device_index {
            debug!(
                "TEMPer {:04x}:{:04x} found at bus {:03} address {:03}",
                VENDOR_ID,
                PRODUCT_ID,
                device.bus_number(),
                device.address()
            );
            return Ok(device.open()?);
        }
        found += 1;
    }
    Err(TemperError::DeviceNotFound {
        index: device_index,
        found,
    })
}

/// Detach a conflicting kernel driver from one interface. Failure is
/// non-fatal: the device may already be free.
fn detach_kernel_driver(handle: &mut DeviceHandle<GlobalContext>, interface: u8) {
    match handle.kernel_driver_active(interface) {
        Ok(true) => match handle.detach_kernel_driver(interface) {
            Ok(()) => debug!("Detached kernel driver from interface {}", interface),
            Err(e) => debug!(
                "Detach failed on interface {}: {}, continuing anyway",
                interface, e
            ),
        },
        Ok(false) => debug!("Interface {} already detached", interface),
        Err(e) => debug!(
            "Kernel driver query failed on interface {}: {}, continuing anyway",
            interface, e
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `celsius = ((frame[3] + (frame[2] << 8)) + calibration) * 125/32000`
    /// for every valid frame.
    #[test]
    fn decode_is_deterministic() {
        // raw = 0x1940 = 6464 -> 6464 / 256 = 25.25 C
        let frame = [0x80, 0x02, 0x19, 0x40, 0x65, 0x72, 0x00, 0x00];
        assert_eq!(decode_celsius(&frame, 0), 25.25);
        assert_eq!(decode_celsius(&frame, 0), 25.25);
    }

    #[test]
    fn zero_calibration_reproduces_uncalibrated_decode() {
        let frame = [0x80, 0x02, 0x0e, 0xc0, 0x00, 0x00, 0x00, 0x00];
        let uncalibrated = decode_celsius(&frame, 0);
        // raw = 0x0ec0 = 3776 -> 14.75 C
        assert_eq!(uncalibrated, 14.75);
    }

    /// The offset is additive in raw units and commutes with re-decoding
    /// the same frame. The scale factor is exactly 1/256, so equality is
    /// floating-point exact.
    #[test]
    fn calibration_is_additive() {
        let frame = [0x80, 0x02, 0x19, 0x40, 0x00, 0x00, 0x00, 0x00];
        for calibration in [-512, -64, 0, 64, 512] {
            assert_eq!(
                decode_celsius(&frame, calibration),
                decode_celsius(&frame, 0) + f64::from(calibration) * (125.0 / 32000.0),
            );
        }
    }

    #[test]
    fn negative_calibration_can_cross_zero() {
        let frame = [0x80, 0x02, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00];
        // raw = 128 -> 0.5 C; offset -256 pulls it to -0.5 C
        assert_eq!(decode_celsius(&frame, -256), -0.5);
    }

    /// Requesting an index with fewer matching devices attached fails with
    /// `DeviceNotFound` before any device I/O. Environments without a
    /// usable USB stack surface the enumeration error instead.
    #[test]
    fn missing_device_index_is_not_found() {
        match TemperDevice::open(99, 0) {
            Err(TemperError::DeviceNotFound { index, found }) => {
                assert_eq!(index, 99);
                assert!(found < 100);
            }
            Err(TemperError::Usb(_)) => {}
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("no TEMPer sensor should be attached at index 99"),
        }
    }
}
