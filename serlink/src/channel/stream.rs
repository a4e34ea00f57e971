//! Minimal byte-stream channel base.
//!
//! Holds the reader/writer pair from activation onward and carries the
//! channel's streaming I/O. The connection controller composes this rather
//! than inheriting from it; activation is the single point where a channel
//! becomes capable of streaming.

use std::io::{self, Read, Write};

/// Streaming core of one channel.
#[derive(Debug)]
pub struct StreamCore<R, W> {
    streams: Option<(R, W)>,
}

impl<R: Read, W: Write> StreamCore<R, W> {
    /// Creates an inactive core.
    #[must_use]
    pub const fn new() -> Self {
        Self { streams: None }
    }

    /// Begins streaming over the given reader/writer pair.
    pub fn activate(&mut self, reader: R, writer: W) {
        debug_assert!(self.streams.is_none(), "channel activated twice");
        self.streams = Some((reader, writer));
    }

    /// True once [`activate`](Self::activate) ran and the core was not
    /// closed since.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.streams.is_some()
    }

    /// Reads available bytes into `buf`.
    ///
    /// An expired receive timeout surfaces as `Ok(0)`: the device produced
    /// nothing this round.
    ///
    /// # Errors
    ///
    /// Returns `NotConnected` while inactive, or the stream's error.
    pub fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let (reader, _) = self.streams.as_mut().ok_or_else(not_connected)?;
        match reader.read(buf) {
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
            other => other,
        }
    }

    /// Writes `buf` to the device.
    ///
    /// # Errors
    ///
    /// Returns `NotConnected` while inactive, or the stream's error.
    pub fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let (_, writer) = self.streams.as_mut().ok_or_else(not_connected)?;
        writer.write(buf)
    }

    /// Flushes buffered writes to the device.
    ///
    /// # Errors
    ///
    /// Returns `NotConnected` while inactive, or the stream's error.
    pub fn flush(&mut self) -> io::Result<()> {
        let (_, writer) = self.streams.as_mut().ok_or_else(not_connected)?;
        writer.flush()
    }

    /// Stops streaming: flushes best-effort, then detaches the streams.
    ///
    /// Idempotent; closing an inactive core is a no-op success. The streams
    /// are detached even if the flush fails.
    ///
    /// # Errors
    ///
    /// Returns the flush error, if any.
    pub fn close(&mut self) -> io::Result<()> {
        let Some((_, mut writer)) = self.streams.take() else {
            return Ok(());
        };
        writer.flush()
    }
}

impl<R: Read, W: Write> Default for StreamCore<R, W> {
    fn default() -> Self {
        Self::new()
    }
}

fn not_connected() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "channel is not active")
}
