//! Packed flag bytes.
//!
//! A few FM API fields are bitmasks rather than enumerations. They are kept as
//! `bitflags` types in memory and written as their raw byte.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Link state flags of a physical port (byte 13 of a port info block)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct LinkStateFlags: u8 {
        /// Lanes are in reverse order
        const LANE_REVERSAL = 0b0000_0001;

        /// PERST# is asserted
        const PERST = 0b0000_0010;

        /// PRSNT# indicates a device is present
        const PRSNT = 0b0000_0100;

        /// PWR_CTRL is asserted
        const PWR_CTRL = 0b0000_1000;
    }
}

bitflags! {
    /// QoS telemetry controls and capabilities of an MLD
    ///
    /// Used both for the telemetry capability bits of Get LD Info and the
    /// enable bits of QoS control.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct QosTelemetry: u8 {
        /// Egress port congestion
        const EGRESS_PORT_CONGESTION = 0b0000_0001;

        /// Temporary throughput reduction
        const TEMPORARY_THROUGHPUT_REDUCTION = 0b0000_0010;
    }
}

impl LinkStateFlags {
    /// Create flags from a raw byte
    ///
    /// Infallible: bits outside the four defined flags are retained so that
    /// `from_byte(b).to_byte() == b`; the encoder rejects them.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Self {
        Self::from_bits_retain(byte)
    }

    /// Convert to raw byte value
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        self.bits()
    }
}

impl QosTelemetry {
    /// Create flags from a raw byte, retaining unknown bits
    #[must_use]
    pub const fn from_byte(byte: u8) -> Self {
        Self::from_bits_retain(byte)
    }

    /// Convert to raw byte value
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        self.bits()
    }
}

impl Default for LinkStateFlags {
    fn default() -> Self {
        Self::empty()
    }
}

impl Default for QosTelemetry {
    fn default() -> Self {
        Self::empty()
    }
}
