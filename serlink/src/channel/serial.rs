//! Per-channel connection state.
//!
//! A [`SerialChannel`] represents one logical connection to a device. It is
//! created detached, gains its handle and remote address on connect, and
//! permanently loses both on close. The event loop owns the channel and is
//! the only mutator.

use std::io;

use crate::channel::stream::StreamCore;
use crate::channel::types::{ChannelError, ConnectError};
use crate::port::address::DeviceAddress;
use crate::port::config::SerialConfig;
use crate::port::provider::PortHandle;

/// One logical connection to a serial device.
pub struct SerialChannel<H: PortHandle> {
    /// True until closed; closing is permanent.
    open: bool,
    remote: Option<DeviceAddress>,
    /// Exclusively owned; `None` until connect succeeds and after close.
    handle: Option<H>,
    config: SerialConfig,
    stream: StreamCore<H::Reader, H::Writer>,
}

impl<H: PortHandle> SerialChannel<H> {
    /// Creates a detached channel with the given configuration.
    #[must_use]
    pub fn new(config: SerialConfig) -> Self {
        Self {
            open: true,
            remote: None,
            handle: None,
            config,
            stream: StreamCore::new(),
        }
    }

    /// True until the channel is closed.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open
    }

    /// Derived activity: device attached AND streaming started.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.handle.is_some() && self.stream.is_active()
    }

    /// True while a device handle is attached.
    #[must_use]
    pub const fn has_handle(&self) -> bool {
        self.handle.is_some()
    }

    /// The constant local sentinel; a serial port has no local endpoint.
    #[must_use]
    pub fn local_address(&self) -> DeviceAddress {
        DeviceAddress::local()
    }

    /// The device this channel connected to, once known.
    #[must_use]
    pub fn remote_address(&self) -> Option<&DeviceAddress> {
        self.remote.as_ref()
    }

    /// The channel's configuration (read-only).
    #[must_use]
    pub const fn config(&self) -> &SerialConfig {
        &self.config
    }

    /// Attaches the freshly opened device. The channel is now
    /// resource-open but not yet active.
    pub(crate) fn attach(&mut self, remote: DeviceAddress, handle: H) {
        self.remote = Some(remote);
        self.handle = Some(handle);
    }

    /// Applies configuration and hands the device's streams to the
    /// streaming core. The single point where the channel becomes capable
    /// of streaming I/O.
    pub(crate) fn initialize(&mut self) -> Result<(), ConnectError> {
        let Some(handle) = self.handle.as_mut() else {
            return Err(ConnectError::ClosedChannel);
        };
        handle.configure(self.config.framing())?;
        handle.set_dtr(self.config.dtr)?;
        handle.set_rts(self.config.rts)?;
        handle.set_receive_timeout(self.config.read_timeout)?;
        let (reader, writer) = handle.streams()?;
        self.stream.activate(reader, writer);
        Ok(())
    }

    /// Marks the channel closed. Racing `is_open` checks observe the flag
    /// before any teardown work runs.
    pub(crate) fn mark_closed(&mut self) {
        self.open = false;
    }

    /// Runs the generic stream close (flush, detach streams).
    pub(crate) fn stream_close(&mut self) -> io::Result<()> {
        self.stream.close()
    }

    /// Detaches the device handle for release.
    pub(crate) fn take_handle(&mut self) -> Option<H> {
        self.handle.take()
    }

    /// Reads from the device once streaming; an expired receive timeout is
    /// a zero-byte read.
    ///
    /// # Errors
    ///
    /// `ClosedChannel` after close, `NotActive` before activation.
    pub(crate) fn read(&mut self, buf: &mut [u8]) -> Result<usize, ChannelError> {
        self.check_streaming()?;
        self.stream.read(buf).map_err(ChannelError::Io)
    }

    /// Writes to the device once streaming.
    ///
    /// # Errors
    ///
    /// `ClosedChannel` after close, `NotActive` before activation.
    pub(crate) fn write(&mut self, buf: &[u8]) -> Result<usize, ChannelError> {
        self.check_streaming()?;
        self.stream.write(buf).map_err(ChannelError::Io)
    }

    /// Flushes buffered writes.
    ///
    /// # Errors
    ///
    /// `ClosedChannel` after close, `NotActive` before activation.
    pub(crate) fn flush(&mut self) -> Result<(), ChannelError> {
        self.check_streaming()?;
        self.stream.flush().map_err(ChannelError::Io)
    }

    fn check_streaming(&self) -> Result<(), ChannelError> {
        if !self.open {
            return Err(ChannelError::ClosedChannel);
        }
        if !self.is_active() {
            return Err(ChannelError::NotActive);
        }
        Ok(())
    }
}
