//! Single-threaded event loop and connection controller.
//!
//! The loop owns every channel, the timing wheel, and the provider. All
//! operations run on the thread that drives the loop: `connect` performs
//! the synchronous open inline, and a configured settle delay defers the
//! rest of initialization to a wheel timer instead of blocking the thread.
//! `tick_at`/`tick_now` advance the wheel; `next_event` drains lifecycle
//! events.
//!
//! # Ordering guarantees
//!
//! - A connect promise is resolved before the corresponding `Active` event
//!   is enqueued.
//! - The open step completes (success or failure) before any scheduling
//!   decision is made.
//! - On close, the device handle is released after, and independent of the
//!   outcome of, the generic stream close.

use std::collections::{HashMap, VecDeque};

use minstant::Instant;

use crate::channel::promise::ConnectPromise;
use crate::channel::serial::SerialChannel;
use crate::channel::types::{ChannelError, ChannelEvent, ChannelId, ConnectError};
use crate::channel::ConnectFuture;
use crate::port::address::DeviceAddress;
use crate::port::config::SerialConfig;
use crate::port::native::NativeProvider;
use crate::port::provider::{PortHandle, PortProvider, OPEN_TIMEOUT, OWNER_TAG};
use crate::runtime::wheel::TimerWheel;
use crate::trace::{debug, warn};

/// Wheel slot count; power of two.
const WHEEL_SLOTS: usize = 64;

/// Event loop over the production serial backend.
pub type NativeEventLoop = EventLoop<NativeProvider>;

/// A deferred initialization, carrying only the channel's identity and the
/// promise. Whether the channel is still open is re-derived when the timer
/// fires; the channel may have closed during the settle delay.
struct PendingInit {
    channel: ChannelId,
    promise: ConnectPromise,
}

/// Single-threaded event loop owning serial channels.
pub struct EventLoop<P: PortProvider> {
    provider: P,
    channels: HashMap<ChannelId, SerialChannel<P::Handle>>,
    wheel: TimerWheel<PendingInit>,
    events: VecDeque<ChannelEvent>,
    next_id: u32,
    /// Epoch for translating wall progress into wheel ticks (1 ms each).
    epoch: Instant,
}

impl<P: PortProvider> EventLoop<P> {
    /// Creates a loop over the given provider.
    #[must_use]
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            channels: HashMap::new(),
            wheel: TimerWheel::new(WHEEL_SLOTS),
            events: VecDeque::new(),
            next_id: 0,
            epoch: Instant::now(),
        }
    }

    /// Creates a detached channel with the given configuration.
    pub fn create_channel(&mut self, config: SerialConfig) -> ChannelId {
        let id = ChannelId::new(self.next_id);
        self.next_id += 1;
        self.channels.insert(id, SerialChannel::new(config));
        debug!(channel = %id, "channel created");
        id
    }

    /// Returns the channel's state for inspection.
    #[must_use]
    pub fn channel(&self, id: ChannelId) -> Option<&SerialChannel<P::Handle>> {
        self.channels.get(&id)
    }

    /// Returns the provider.
    #[must_use]
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    /// Connects the channel to `remote`.
    ///
    /// Resolves and opens the device synchronously on the calling thread.
    /// With a zero settle delay the rest of initialization runs inline in
    /// this call stack; otherwise it is scheduled on the wheel and fires
    /// after the delay. The returned future resolves exactly once, and any
    /// `Active` event is enqueued strictly after resolution.
    pub fn connect(&mut self, id: ChannelId, remote: DeviceAddress) -> ConnectFuture {
        let (promise, future) = ConnectPromise::new();

        let Some(channel) = self.channels.get_mut(&id) else {
            promise.fail(ConnectError::ClosedChannel);
            return future;
        };
        if !channel.is_open() {
            promise.fail(ConnectError::ClosedChannel);
            return future;
        }
        if channel.has_handle() {
            promise.fail(ConnectError::AlreadyConnected);
            return future;
        }

        debug!(channel = %id, device = %remote, "connecting");
        let handle = match self.provider.open(&remote, OWNER_TAG, OPEN_TIMEOUT) {
            Ok(handle) => handle,
            Err(err) => {
                debug!(channel = %id, device = %remote, error = %err, "open failed");
                promise.fail(ConnectError::Open(err));
                // Nothing was attached, so there is nothing to tear down;
                // the channel stays open and the caller may try again.
                return future;
            }
        };
        channel.attach(remote, handle);

        let settle = channel.config().settle_delay;
        if settle.is_zero() {
            self.finish_connect(id, promise);
        } else {
            let delay_ms = settle.as_millis() as u64;
            debug!(channel = %id, delay_ms, "initialization deferred for settle delay");
            self.wheel.schedule(
                delay_ms,
                PendingInit {
                    channel: id,
                    promise,
                },
            );
        }
        future
    }

    /// Runs deferred-or-inline initialization and resolves the promise.
    fn finish_connect(&mut self, id: ChannelId, promise: ConnectPromise) {
        let Some(channel) = self.channels.get_mut(&id) else {
            promise.fail(ConnectError::ClosedChannel);
            return;
        };
        if !channel.is_open() || !channel.has_handle() {
            // Closed while the settle delay was pending; do not activate.
            debug!(channel = %id, "initialization fired after close");
            promise.fail(ConnectError::ClosedChannel);
            return;
        }

        let was_active = channel.is_active();
        match channel.initialize() {
            Ok(()) => {
                // Promise first, then the derived event.
                promise.succeed();
                if !was_active && channel.is_active() {
                    debug!(channel = %id, "channel active");
                    self.events.push_back(ChannelEvent::Active { channel: id });
                }
            }
            Err(err) => {
                debug!(channel = %id, error = %err, "initialization failed");
                promise.fail(err);
                self.close_quietly(id);
            }
        }
    }

    /// Closes the channel and releases its device.
    ///
    /// The open flag drops first, then the generic stream close runs, and
    /// the device handle is released unconditionally afterwards. Idempotent:
    /// closing a closed (or discarded) channel is a no-op success.
    ///
    /// # Errors
    ///
    /// Returns the stream-close failure, if any; the device is released
    /// either way.
    pub fn close(&mut self, id: ChannelId) -> Result<(), ChannelError> {
        let Some(channel) = self.channels.get_mut(&id) else {
            return Ok(());
        };
        if !channel.is_open() {
            return Ok(());
        }

        let was_active = channel.is_active();
        channel.mark_closed();
        debug!(channel = %id, "closing channel");

        let stream_result = channel.stream_close();
        if let Some(mut handle) = channel.take_handle() {
            handle.release();
        }
        if was_active {
            self.events.push_back(ChannelEvent::Inactive { channel: id });
        }
        stream_result.map_err(ChannelError::Io)
    }

    /// Disconnects the channel. No half-close exists for this resource
    /// type, so this is an alias for [`close`](Self::close).
    ///
    /// # Errors
    ///
    /// Same as [`close`](Self::close).
    pub fn disconnect(&mut self, id: ChannelId) -> Result<(), ChannelError> {
        self.close(id)
    }

    /// Binding is not supported: a serial port has no bindable local
    /// endpoint. Never mutates channel state.
    ///
    /// # Errors
    ///
    /// Always `Unsupported`.
    pub fn bind(&mut self, _id: ChannelId, _local: &DeviceAddress) -> Result<(), ChannelError> {
        Err(ChannelError::Unsupported("bind"))
    }

    /// Input-only shutdown is not supported for this resource type.
    ///
    /// # Errors
    ///
    /// Always `Unsupported`.
    pub fn shutdown_input(&mut self, _id: ChannelId) -> Result<(), ChannelError> {
        Err(ChannelError::Unsupported("shutdown_input"))
    }

    /// Mirrors the overall open/closed flag; there is no distinguishable
    /// input-only shutdown.
    #[must_use]
    pub fn is_input_shutdown(&self, id: ChannelId) -> bool {
        self.channels.get(&id).map_or(true, |ch| !ch.is_open())
    }

    /// Discards a channel, closing it first if needed.
    pub fn remove_channel(&mut self, id: ChannelId) -> bool {
        if !self.channels.contains_key(&id) {
            return false;
        }
        self.close_quietly(id);
        self.channels.remove(&id).is_some()
    }

    /// Reads from an active channel; an expired receive timeout is a
    /// zero-byte read.
    ///
    /// # Errors
    ///
    /// `ClosedChannel`, `NotActive`, or the stream's I/O error.
    pub fn read(&mut self, id: ChannelId, buf: &mut [u8]) -> Result<usize, ChannelError> {
        let channel = self.channels.get_mut(&id).ok_or(ChannelError::ClosedChannel)?;
        channel.read(buf)
    }

    /// Writes to an active channel.
    ///
    /// # Errors
    ///
    /// `ClosedChannel`, `NotActive`, or the stream's I/O error.
    pub fn write(&mut self, id: ChannelId, buf: &[u8]) -> Result<usize, ChannelError> {
        let channel = self.channels.get_mut(&id).ok_or(ChannelError::ClosedChannel)?;
        channel.write(buf)
    }

    /// Flushes an active channel.
    ///
    /// # Errors
    ///
    /// `ClosedChannel`, `NotActive`, or the stream's I/O error.
    pub fn flush(&mut self, id: ChannelId) -> Result<(), ChannelError> {
        let channel = self.channels.get_mut(&id).ok_or(ChannelError::ClosedChannel)?;
        channel.flush()
    }

    /// Advances the wheel to an explicit tick (milliseconds since the loop
    /// started) and runs any due initialization. Deterministic entry point
    /// for tests and external drivers.
    pub fn tick_at(&mut self, now_ms: u64) {
        let mut due = Vec::new();
        self.wheel.advance(now_ms, |task| due.push(task));
        for task in due {
            self.finish_connect(task.channel, task.promise);
        }
    }

    /// Advances the wheel to the current monotonic time.
    pub fn tick_now(&mut self) {
        let now_ms = self.epoch.elapsed().as_millis() as u64;
        self.tick_at(now_ms);
    }

    /// Number of initializations waiting on their settle delay.
    #[must_use]
    pub const fn pending_inits(&self) -> usize {
        self.wheel.pending()
    }

    /// Takes the next lifecycle event, if any.
    pub fn next_event(&mut self) -> Option<ChannelEvent> {
        self.events.pop_front()
    }

    /// Closes for cleanup, keeping the original failure as the surfaced
    /// error: a cleanup failure here is logged and swallowed.
    fn close_quietly(&mut self, id: ChannelId) {
        if let Err(err) = self.close(id) {
            warn!(channel = %id, error = %err, "cleanup close failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::mock::MockProvider;
    use std::time::Duration;

    fn loop_with(device: &str) -> EventLoop<MockProvider> {
        let mut provider = MockProvider::new();
        provider.add_device(device);
        EventLoop::new(provider)
    }

    #[test]
    fn inline_connect_resolves_before_event_is_drained() {
        let mut ev = loop_with("DEV1");
        let id = ev.create_channel(SerialConfig::default());

        let future = ev.connect(id, DeviceAddress::new("DEV1"));

        // Resolved within the same call stack; the event is already queued
        // behind it.
        assert!(matches!(future.take(), Some(Ok(()))));
        assert_eq!(ev.next_event(), Some(ChannelEvent::Active { channel: id }));
        assert_eq!(ev.next_event(), None);
    }

    #[test]
    fn settle_delay_goes_through_the_wheel() {
        let mut ev = loop_with("DEV1");
        let id = ev.create_channel(SerialConfig {
            settle_delay: Duration::from_millis(50),
            ..SerialConfig::default()
        });

        let future = ev.connect(id, DeviceAddress::new("DEV1"));
        assert!(future.is_pending());
        assert_eq!(ev.pending_inits(), 1);

        ev.tick_at(49);
        assert!(future.is_pending());
        ev.tick_at(50);
        assert!(matches!(future.take(), Some(Ok(()))));
        assert_eq!(ev.pending_inits(), 0);
        assert_eq!(ev.next_event(), Some(ChannelEvent::Active { channel: id }));
    }

    #[test]
    fn second_connect_is_rejected_without_touching_the_first() {
        let mut ev = loop_with("DEV1");
        let id = ev.create_channel(SerialConfig::default());

        let first = ev.connect(id, DeviceAddress::new("DEV1"));
        assert!(matches!(first.take(), Some(Ok(()))));

        let second = ev.connect(id, DeviceAddress::new("DEV1"));
        assert!(matches!(
            second.take(),
            Some(Err(ConnectError::AlreadyConnected))
        ));
        assert!(ev.channel(id).unwrap().is_active());
    }

    #[test]
    fn close_releases_device_even_when_stream_close_fails() {
        let mut provider = MockProvider::new();
        provider.add_device("DEV1");
        provider.fail_flush("DEV1");
        let mut ev = EventLoop::new(provider);
        let id = ev.create_channel(SerialConfig::default());

        let future = ev.connect(id, DeviceAddress::new("DEV1"));
        assert!(matches!(future.take(), Some(Ok(()))));

        let err = ev.close(id).unwrap_err();
        assert!(matches!(err, ChannelError::Io(_)));

        let state = ev.provider().port("DEV1").unwrap();
        assert!(state.borrow().released, "handle released despite close error");
        assert!(!ev.channel(id).unwrap().is_open());
    }

    #[test]
    fn remove_channel_discards_state() {
        let mut ev = loop_with("DEV1");
        let id = ev.create_channel(SerialConfig::default());
        assert!(ev.remove_channel(id));
        assert!(!ev.remove_channel(id));
        assert!(ev.channel(id).is_none());
        assert!(ev.is_input_shutdown(id));
    }

    #[test]
    fn tick_now_is_safe_with_nothing_scheduled() {
        let mut ev = loop_with("DEV1");
        ev.tick_now();
        assert_eq!(ev.pending_inits(), 0);
    }
}
