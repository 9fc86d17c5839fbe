//! Serial port configuration.

use tokio_serial::{DataBits, FlowControl, Parity, StopBits};

/// Serial port configuration.
///
/// Defaults to 9600 baud, 8N1, no flow control, which is what switch
/// consoles ship with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Port name (e.g. `/dev/ttyUSB0`, `COM3`).
    pub port: String,

    /// Line speed.
    pub baud_rate: u32,

    /// Data bits per character.
    pub data_bits: DataBits,

    /// Parity checking mode.
    pub parity: Parity,

    /// Stop bits per character.
    pub stop_bits: StopBits,

    /// Flow control mode.
    pub flow_control: FlowControl,
}

impl SerialConfig {
    /// Create a config for the given port and speed with 8N1 framing.
    pub fn new(port: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port: port.into(),
            baud_rate,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            flow_control: FlowControl::None,
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self::new("/dev/ttyUSB0", 9600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_framing() {
        let config = SerialConfig::new("/dev/ttyS1", 115200);
        assert_eq!(config.port, "/dev/ttyS1");
        assert_eq!(config.baud_rate, 115200);
        assert_eq!(config.data_bits, DataBits::Eight);
        assert_eq!(config.parity, Parity::None);
        assert_eq!(config.stop_bits, StopBits::One);
        assert_eq!(config.flow_control, FlowControl::None);
    }
}
