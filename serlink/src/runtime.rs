//! Event-loop executor for serial channels.
//!
//! - `wheel`: hashed timing wheel used to schedule settle-delay
//!   initialization without blocking the loop thread.
//! - `executor`: the [`EventLoop`](executor::EventLoop), owner of all
//!   channel state and the connection controller itself.

pub mod executor;
pub mod wheel;

pub use executor::{EventLoop, NativeEventLoop};
pub use wheel::TimerWheel;
