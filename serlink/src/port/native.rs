//! `serialport`-backed provider.
//!
//! Thin wrapper around the [`serialport`] crate with the error mapping the
//! runtime expects. The builder requires a provisional baud rate before the
//! device is open; the real framing is applied afterwards, during channel
//! initialization.

use std::io;
use std::time::Duration;

use serialport::SerialPort;

use crate::port::address::DeviceAddress;
use crate::port::config::{DataBits, Framing, Parity, StopBits};
use crate::port::provider::{ConfigError, OpenError, PortHandle, PortProvider};

/// Baud rate handed to the builder before the configured framing is applied.
const PROVISIONAL_BAUD: u32 = 9600;

/// Opens real serial devices through the `serialport` crate.
#[derive(Debug, Default)]
pub struct NativeProvider;

impl NativeProvider {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl PortProvider for NativeProvider {
    type Handle = NativeHandle;

    fn open(
        &mut self,
        device: &DeviceAddress,
        _owner: &str,
        timeout: Duration,
    ) -> Result<Self::Handle, OpenError> {
        // The platform has no owner-tag concept; exclusivity comes from the
        // OS-level open itself.
        let port = serialport::new(device.name(), PROVISIONAL_BAUD)
            .timeout(timeout)
            .open()
            .map_err(|e| open_error(device, e))?;
        Ok(NativeHandle { port: Some(port) })
    }
}

/// An open native serial device.
pub struct NativeHandle {
    /// `None` once released.
    port: Option<Box<dyn SerialPort>>,
}

impl NativeHandle {
    fn port_mut(&mut self, setting: &'static str) -> Result<&mut Box<dyn SerialPort>, ConfigError> {
        self.port.as_mut().ok_or(ConfigError::Io {
            setting,
            source: io::Error::new(io::ErrorKind::NotConnected, "device released"),
        })
    }
}

impl PortHandle for NativeHandle {
    type Reader = Box<dyn SerialPort>;
    type Writer = Box<dyn SerialPort>;

    fn configure(&mut self, framing: Framing) -> Result<(), ConfigError> {
        let port = self.port_mut("framing")?;
        port.set_baud_rate(framing.baud_rate)
            .and_then(|()| port.set_data_bits(data_bits(framing.data_bits)))
            .and_then(|()| port.set_stop_bits(stop_bits(framing.stop_bits)))
            .and_then(|()| port.set_parity(parity(framing.parity)))
            .map_err(|e| config_error("framing", e))
    }

    fn set_dtr(&mut self, asserted: bool) -> Result<(), ConfigError> {
        self.port_mut("dtr")?
            .write_data_terminal_ready(asserted)
            .map_err(|e| config_error("dtr", e))
    }

    fn set_rts(&mut self, asserted: bool) -> Result<(), ConfigError> {
        self.port_mut("rts")?
            .write_request_to_send(asserted)
            .map_err(|e| config_error("rts", e))
    }

    fn set_receive_timeout(&mut self, timeout: Duration) -> Result<(), ConfigError> {
        self.port_mut("receive timeout")?
            .set_timeout(timeout)
            .map_err(|e| config_error("receive timeout", e))
    }

    fn streams(&mut self) -> Result<(Self::Reader, Self::Writer), OpenError> {
        let port = self.port.as_mut().ok_or_else(|| {
            OpenError::Io(io::Error::new(
                io::ErrorKind::NotConnected,
                "device released",
            ))
        })?;
        let reader = port.try_clone().map_err(|e| OpenError::Io(e.into()))?;
        let writer = port.try_clone().map_err(|e| OpenError::Io(e.into()))?;
        Ok((reader, writer))
    }

    fn release(&mut self) {
        // Dropping the handle closes the OS descriptor and stops delivery.
        self.port = None;
    }
}

fn open_error(device: &DeviceAddress, e: serialport::Error) -> OpenError {
    match e.kind() {
        serialport::ErrorKind::NoDevice | serialport::ErrorKind::InvalidInput => {
            OpenError::NotFound(device.clone())
        }
        serialport::ErrorKind::Io(io::ErrorKind::PermissionDenied) => {
            OpenError::PermissionDenied(device.clone())
        }
        _ => OpenError::Io(e.into()),
    }
}

fn config_error(setting: &'static str, e: serialport::Error) -> ConfigError {
    match e.kind() {
        serialport::ErrorKind::InvalidInput => ConfigError::Invalid { setting },
        _ => ConfigError::Io {
            setting,
            source: e.into(),
        },
    }
}

const fn data_bits(bits: DataBits) -> serialport::DataBits {
    match bits {
        DataBits::Five => serialport::DataBits::Five,
        DataBits::Six => serialport::DataBits::Six,
        DataBits::Seven => serialport::DataBits::Seven,
        DataBits::Eight => serialport::DataBits::Eight,
    }
}

const fn stop_bits(bits: StopBits) -> serialport::StopBits {
    match bits {
        StopBits::One => serialport::StopBits::One,
        StopBits::Two => serialport::StopBits::Two,
    }
}

const fn parity(parity: Parity) -> serialport::Parity {
    match parity {
        Parity::None => serialport::Parity::None,
        Parity::Odd => serialport::Parity::Odd,
        Parity::Even => serialport::Parity::Even,
    }
}
