//! Device address type.
//!
//! A serial device is identified by an opaque name (`/dev/ttyUSB0`, `COM3`).
//! The same type doubles as the constant local sentinel, since a serial
//! port has no true local endpoint to report.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Name used as the local-address sentinel.
const LOCAL_NAME: &str = "localhost";

/// An opaque serial device identifier.
///
/// Wrapper around the platform device name that provides a stable API
/// across provider backends. Supports equality so callers can correlate
/// channels with the device they asked for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceAddress(String);

impl DeviceAddress {
    /// Creates an address from a platform device name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the sentinel used as every channel's local address.
    #[must_use]
    pub fn local() -> Self {
        Self(LOCAL_NAME.to_string())
    }

    /// Returns the underlying device name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceAddress {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for DeviceAddress {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}
