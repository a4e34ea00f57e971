//! Per-channel serial configuration.
//!
//! The option set is fixed and strongly typed; every field has a default,
//! so initialization never reads an unset value.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataBits {
    Five,
    Six,
    Seven,
    Eight,
}

impl DataBits {
    /// Returns the raw bit count.
    #[must_use]
    pub const fn count(self) -> u8 {
        match self {
            Self::Five => 5,
            Self::Six => 6,
            Self::Seven => 7,
            Self::Eight => 8,
        }
    }
}

/// Number of stop bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopBits {
    One,
    Two,
}

/// Parity checking mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Parity {
    None,
    Odd,
    Even,
}

/// Line framing: the settings the hardware applies as one atomic call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Framing {
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub stop_bits: StopBits,
    pub parity: Parity,
}

/// Configuration for one serial channel.
///
/// Read-only from the runtime's perspective: the event loop consumes it
/// during initialization and never mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialConfig {
    /// Line speed in baud.
    pub baud_rate: u32,
    /// Data bits per character.
    pub data_bits: DataBits,
    /// Stop bits per character.
    pub stop_bits: StopBits,
    /// Parity mode.
    pub parity: Parity,
    /// Assert DTR after configuring the line.
    pub dtr: bool,
    /// Assert RTS after configuring the line.
    pub rts: bool,
    /// Receive timeout forwarded to the device; bounds each blocking read.
    pub read_timeout: Duration,
    /// Pause between opening the device and applying configuration, to let
    /// hardware lines stabilize. Zero means initialize inline.
    pub settle_delay: Duration,
}

impl SerialConfig {
    /// Returns the framing subset applied in the atomic configure call.
    #[must_use]
    pub const fn framing(&self) -> Framing {
        Framing {
            baud_rate: self.baud_rate,
            data_bits: self.data_bits,
            stop_bits: self.stop_bits,
            parity: self.parity,
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            data_bits: DataBits::Eight,
            stop_bits: StopBits::One,
            parity: Parity::None,
            dtr: false,
            rts: false,
            read_timeout: Duration::from_millis(1000),
            settle_delay: Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_option_has_a_default() {
        let config = SerialConfig::default();
        assert_eq!(config.baud_rate, 115_200);
        assert_eq!(config.data_bits, DataBits::Eight);
        assert_eq!(config.stop_bits, StopBits::One);
        assert_eq!(config.parity, Parity::None);
        assert!(!config.dtr);
        assert!(!config.rts);
        assert_eq!(config.read_timeout, Duration::from_millis(1000));
        assert_eq!(config.settle_delay, Duration::ZERO);
    }

    #[test]
    fn framing_mirrors_line_settings() {
        let config = SerialConfig {
            baud_rate: 9600,
            data_bits: DataBits::Seven,
            parity: Parity::Even,
            ..SerialConfig::default()
        };
        let framing = config.framing();
        assert_eq!(framing.baud_rate, 9600);
        assert_eq!(framing.data_bits, DataBits::Seven);
        assert_eq!(framing.stop_bits, StopBits::One);
        assert_eq!(framing.parity, Parity::Even);
    }

    #[test]
    fn data_bits_count() {
        assert_eq!(DataBits::Seven.count(), 7);
        assert_eq!(DataBits::Eight.count(), 8);
    }
}
