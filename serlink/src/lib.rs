//! Event-driven channel runtime for serial devices.
//!
//! A serial port is a blocking, stream-oriented resource; serlink exposes
//! it through the non-blocking, event-driven channel shape normally used
//! for sockets. One [`EventLoop`] owns any number of channels and runs
//! their whole lifecycle on a single cooperative thread:
//!
//! 1. [`connect`](runtime::executor::EventLoop::connect) opens the device
//!    synchronously and returns a [`ConnectFuture`];
//! 2. a configured settle delay defers configuration and activation via a
//!    timer instead of blocking the loop;
//! 3. initialization applies the line settings, hands the device's streams
//!    to the channel, resolves the future, and then emits
//!    [`ChannelEvent::Active`], exactly once;
//! 4. [`close`](runtime::executor::EventLoop::close) tears the channel
//!    down and always releases the device, even when the stream close
//!    fails.
//!
//! Device access goes through [`port::PortProvider`]; production code uses
//! the `serialport`-backed [`port::NativeProvider`], tests script
//! [`port::mock::MockProvider`].

pub mod channel;
pub mod port;
pub mod runtime;

mod trace;

pub use trace::init_tracing;

pub use channel::{ChannelError, ChannelEvent, ChannelId, ConnectError, ConnectFuture};
pub use port::{DataBits, DeviceAddress, NativeProvider, Parity, SerialConfig, StopBits};
pub use runtime::{EventLoop, NativeEventLoop};
