//! Serial device access: addressing, configuration, and the provider
//! boundary the channel runtime opens devices through.
//!
//! The runtime never touches an OS serial handle directly; everything goes
//! through [`PortProvider`]/[`PortHandle`], so tests substitute
//! [`mock::MockProvider`] for the `serialport`-backed [`NativeProvider`].

pub mod address;
pub mod config;
pub mod mock;
pub mod native;
pub mod provider;

pub use address::DeviceAddress;
pub use config::{DataBits, Framing, Parity, SerialConfig, StopBits};
pub use native::NativeProvider;
pub use provider::{ConfigError, OpenError, PortHandle, PortProvider, OPEN_TIMEOUT, OWNER_TAG};
