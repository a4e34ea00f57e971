//! Provider boundary for serial devices.
//!
//! The runtime resolves a [`DeviceAddress`] to an exclusively-owned handle
//! through [`PortProvider::open`], then drives the handle through the
//! initialization sequence: one atomic framing call, modem-control lines,
//! receive timeout, and finally the byte streams handed to the channel.

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::port::address::DeviceAddress;
use crate::port::config::Framing;

/// Owner tag passed to the platform when opening a device.
pub const OWNER_TAG: &str = "serlink";

/// Timeout for the synchronous open call.
pub const OPEN_TIMEOUT: Duration = Duration::from_millis(1000);

/// Errors resolving a device address or opening the device.
///
/// Open failures are terminal for the connect attempt; the runtime never
/// retries internally.
#[derive(Debug, Error)]
pub enum OpenError {
    /// The address does not resolve to a device.
    #[error("no such device: {0}")]
    NotFound(DeviceAddress),
    /// The device exists but is held by another owner.
    #[error("device busy: {0}")]
    Busy(DeviceAddress),
    /// The device exists but access was denied.
    #[error("permission denied: {0}")]
    PermissionDenied(DeviceAddress),
    /// Any other I/O failure while opening.
    #[error("I/O error opening device: {0}")]
    Io(#[from] io::Error),
}

/// Errors applying a configuration value to an open device.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The hardware cannot represent the requested value.
    #[error("device rejected {setting}")]
    Invalid {
        /// Which setting was rejected (e.g. `"framing"`, `"dtr"`).
        setting: &'static str,
    },
    /// The device failed while applying the value.
    #[error("I/O error applying {setting}: {source}")]
    Io {
        setting: &'static str,
        source: io::Error,
    },
}

/// An exclusively-owned open serial device.
///
/// The handle is owned by exactly one channel; no other component may hold
/// or mutate it. All configuration methods are only called between open and
/// activation.
pub trait PortHandle {
    /// Byte stream for reads, valid until [`release`](Self::release).
    type Reader: io::Read;
    /// Byte stream for writes, valid until [`release`](Self::release).
    type Writer: io::Write;

    /// Applies baud rate, data bits, stop bits, and parity as one
    /// semantically-atomic hardware call.
    ///
    /// # Errors
    ///
    /// Returns an error if the device rejects any part of the framing.
    fn configure(&mut self, framing: Framing) -> Result<(), ConfigError>;

    /// Sets the DTR modem-control line.
    ///
    /// # Errors
    ///
    /// Returns an error if the device rejects the line change.
    fn set_dtr(&mut self, asserted: bool) -> Result<(), ConfigError>;

    /// Sets the RTS modem-control line.
    ///
    /// # Errors
    ///
    /// Returns an error if the device rejects the line change.
    fn set_rts(&mut self, asserted: bool) -> Result<(), ConfigError>;

    /// Enables the device's receive timeout; each blocking read returns
    /// after at most this long. Opaque to the runtime beyond forwarding.
    ///
    /// # Errors
    ///
    /// Returns an error if the device rejects the timeout.
    fn set_receive_timeout(&mut self, timeout: Duration) -> Result<(), ConfigError>;

    /// Returns the device's input/output byte streams.
    ///
    /// Called once, at activation.
    ///
    /// # Errors
    ///
    /// Returns an error if the streams cannot be materialized.
    fn streams(&mut self) -> Result<(Self::Reader, Self::Writer), OpenError>;

    /// Stops hardware event delivery and releases the device.
    ///
    /// Best-effort: failures are discarded. Safe to call more than once.
    fn release(&mut self);
}

/// Capability to resolve device addresses and open devices.
pub trait PortProvider {
    /// Handle type produced by [`open`](Self::open).
    type Handle: PortHandle;

    /// Synchronously resolves `device` and opens it for `owner`.
    ///
    /// # Errors
    ///
    /// Returns an [`OpenError`] if resolution or the hardware open fails.
    fn open(
        &mut self,
        device: &DeviceAddress,
        owner: &str,
        timeout: Duration,
    ) -> Result<Self::Handle, OpenError>;
}
