//! Scriptable in-memory provider for tests.
//!
//! Devices are registered by name; opening an unregistered name fails with
//! [`OpenError::NotFound`]. Each opened port exposes its recorded state
//! (owner tag, applied framing, modem lines, release flag, written bytes)
//! through a shared cell so tests can assert on it after the runtime has
//! torn the channel down.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::rc::Rc;
use std::time::Duration;

use crate::port::address::DeviceAddress;
use crate::port::config::Framing;
use crate::port::provider::{ConfigError, OpenError, PortHandle, PortProvider};

/// Injectable open failure for a registered device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockOpenFailure {
    Busy,
    PermissionDenied,
    Io,
}

#[derive(Debug, Default, Clone)]
struct DeviceScript {
    fail_open: Option<MockOpenFailure>,
    fail_configure: bool,
    fail_flush: bool,
    rx: Vec<u8>,
}

/// Recorded state of one opened mock port.
#[derive(Debug)]
pub struct PortState {
    /// Owner tag the runtime opened the device with.
    pub owner: String,
    /// Timeout the runtime opened the device with.
    pub open_timeout: Duration,
    /// Framing applied by the atomic configure call, if it ran.
    pub framing: Option<Framing>,
    /// Last DTR value applied.
    pub dtr: Option<bool>,
    /// Last RTS value applied.
    pub rts: Option<bool>,
    /// Receive timeout forwarded to the device.
    pub receive_timeout: Option<Duration>,
    /// True once the handle was released.
    pub released: bool,
    /// Bytes written to the device.
    pub tx: Vec<u8>,
    rx: VecDeque<u8>,
    fail_configure: bool,
    fail_flush: bool,
}

/// In-memory [`PortProvider`] for tests.
#[derive(Debug, Default)]
pub struct MockProvider {
    devices: HashMap<String, DeviceScript>,
    ports: HashMap<String, Rc<RefCell<PortState>>>,
    opens: usize,
}

impl MockProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a device that opens successfully.
    pub fn add_device(&mut self, name: &str) {
        self.devices.insert(name.to_string(), DeviceScript::default());
    }

    /// Scripts bytes the device will produce once streaming starts.
    pub fn script_rx(&mut self, name: &str, bytes: &[u8]) {
        self.devices
            .entry(name.to_string())
            .or_default()
            .rx
            .extend_from_slice(bytes);
    }

    /// Makes opening `name` fail with the given failure kind.
    pub fn fail_open(&mut self, name: &str, failure: MockOpenFailure) {
        self.devices.entry(name.to_string()).or_default().fail_open = Some(failure);
    }

    /// Makes the atomic configure call fail on the next opened port.
    pub fn fail_configure(&mut self, name: &str) {
        self.devices
            .entry(name.to_string())
            .or_default()
            .fail_configure = true;
    }

    /// Makes stream flush fail on the next opened port.
    pub fn fail_flush(&mut self, name: &str) {
        self.devices.entry(name.to_string()).or_default().fail_flush = true;
    }

    /// Returns the state cell of the most recently opened port for `name`.
    #[must_use]
    pub fn port(&self, name: &str) -> Option<Rc<RefCell<PortState>>> {
        self.ports.get(name).cloned()
    }

    /// Number of successful opens across all devices.
    #[must_use]
    pub const fn open_count(&self) -> usize {
        self.opens
    }
}

impl PortProvider for MockProvider {
    type Handle = MockHandle;

    fn open(
        &mut self,
        device: &DeviceAddress,
        owner: &str,
        timeout: Duration,
    ) -> Result<Self::Handle, OpenError> {
        let script = self
            .devices
            .get(device.name())
            .ok_or_else(|| OpenError::NotFound(device.clone()))?
            .clone();

        match script.fail_open {
            Some(MockOpenFailure::Busy) => return Err(OpenError::Busy(device.clone())),
            Some(MockOpenFailure::PermissionDenied) => {
                return Err(OpenError::PermissionDenied(device.clone()));
            }
            Some(MockOpenFailure::Io) => {
                return Err(OpenError::Io(io::Error::other("injected open failure")));
            }
            None => {}
        }

        let state = Rc::new(RefCell::new(PortState {
            owner: owner.to_string(),
            open_timeout: timeout,
            framing: None,
            dtr: None,
            rts: None,
            receive_timeout: None,
            released: false,
            tx: Vec::new(),
            rx: script.rx.into_iter().collect(),
            fail_configure: script.fail_configure,
            fail_flush: script.fail_flush,
        }));
        self.ports.insert(device.name().to_string(), state.clone());
        self.opens += 1;
        Ok(MockHandle { state })
    }
}

/// Handle to an opened mock port.
#[derive(Debug)]
pub struct MockHandle {
    state: Rc<RefCell<PortState>>,
}

impl PortHandle for MockHandle {
    type Reader = MockReader;
    type Writer = MockWriter;

    fn configure(&mut self, framing: Framing) -> Result<(), ConfigError> {
        let mut state = self.state.borrow_mut();
        if state.fail_configure {
            return Err(ConfigError::Invalid { setting: "framing" });
        }
        state.framing = Some(framing);
        Ok(())
    }

    fn set_dtr(&mut self, asserted: bool) -> Result<(), ConfigError> {
        self.state.borrow_mut().dtr = Some(asserted);
        Ok(())
    }

    fn set_rts(&mut self, asserted: bool) -> Result<(), ConfigError> {
        self.state.borrow_mut().rts = Some(asserted);
        Ok(())
    }

    fn set_receive_timeout(&mut self, timeout: Duration) -> Result<(), ConfigError> {
        self.state.borrow_mut().receive_timeout = Some(timeout);
        Ok(())
    }

    fn streams(&mut self) -> Result<(Self::Reader, Self::Writer), OpenError> {
        Ok((
            MockReader {
                state: self.state.clone(),
            },
            MockWriter {
                state: self.state.clone(),
            },
        ))
    }

    fn release(&mut self) {
        self.state.borrow_mut().released = true;
    }
}

/// Read end of a mock port; an empty receive buffer behaves like an expired
/// receive timeout.
#[derive(Debug)]
pub struct MockReader {
    state: Rc<RefCell<PortState>>,
}

impl io::Read for MockReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state.borrow_mut();
        if state.rx.is_empty() {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "receive timeout"));
        }
        let n = buf.len().min(state.rx.len());
        for slot in buf.iter_mut().take(n) {
            *slot = state.rx.pop_front().unwrap_or_default();
        }
        Ok(n)
    }
}

/// Write end of a mock port; bytes accumulate in [`PortState::tx`].
#[derive(Debug)]
pub struct MockWriter {
    state: Rc<RefCell<PortState>>,
}

impl io::Write for MockWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.state.borrow_mut().tx.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.state.borrow().fail_flush {
            return Err(io::Error::other("injected flush failure"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::config::SerialConfig;
    use std::io::{Read, Write};

    fn open(provider: &mut MockProvider, name: &str) -> MockHandle {
        provider
            .open(&DeviceAddress::new(name), "test", Duration::from_millis(5))
            .expect("open scripted device")
    }

    #[test]
    fn unknown_device_not_found() {
        let mut provider = MockProvider::new();
        let err = provider
            .open(&DeviceAddress::new("NOPE"), "test", Duration::ZERO)
            .unwrap_err();
        assert!(matches!(err, OpenError::NotFound(_)));
        assert_eq!(provider.open_count(), 0);
    }

    #[test]
    fn records_owner_and_settings() {
        let mut provider = MockProvider::new();
        provider.add_device("DEV1");
        let mut handle = open(&mut provider, "DEV1");

        handle.configure(SerialConfig::default().framing()).unwrap();
        handle.set_dtr(true).unwrap();
        handle.set_receive_timeout(Duration::from_millis(250)).unwrap();

        let state = provider.port("DEV1").unwrap();
        let state = state.borrow();
        assert_eq!(state.owner, "test");
        assert_eq!(state.open_timeout, Duration::from_millis(5));
        assert!(state.framing.is_some());
        assert_eq!(state.dtr, Some(true));
        assert_eq!(state.receive_timeout, Some(Duration::from_millis(250)));
        assert!(!state.released);
    }

    #[test]
    fn injected_configure_failure() {
        let mut provider = MockProvider::new();
        provider.add_device("DEV1");
        provider.fail_configure("DEV1");
        let mut handle = open(&mut provider, "DEV1");

        let err = handle
            .configure(SerialConfig::default().framing())
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { setting: "framing" }));
    }

    #[test]
    fn release_marks_state() {
        let mut provider = MockProvider::new();
        provider.add_device("DEV1");
        let mut handle = open(&mut provider, "DEV1");
        handle.release();
        handle.release();
        assert!(provider.port("DEV1").unwrap().borrow().released);
    }

    #[test]
    fn reader_times_out_when_empty_and_drains_script() {
        let mut provider = MockProvider::new();
        provider.add_device("DEV1");
        provider.script_rx("DEV1", b"ok");
        let mut handle = open(&mut provider, "DEV1");
        let (mut reader, mut writer) = handle.streams().unwrap();

        let mut buf = [0u8; 8];
        assert_eq!(reader.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"ok");
        let err = reader.read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);

        writer.write_all(b"cmd").unwrap();
        assert_eq!(provider.port("DEV1").unwrap().borrow().tx, b"cmd");
    }
}
