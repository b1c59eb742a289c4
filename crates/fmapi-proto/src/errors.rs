//! Error types for the FM API codec.
//!
//! All errors are structured, testable, and provide actionable information.
//! Every failure is reported before any byte is committed to the caller's
//! buffer, so a returned error never leaves a half-written message behind.

use thiserror::Error;

use crate::Kind;

/// Errors raised while encoding or decoding FM API messages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    // Argument errors
    /// Object kind ordinal outside the known enumeration
    #[error("unknown object kind: {0}")]
    UnknownKind(u8),

    /// A context-dependent list was decoded without its originating request
    #[error("{kind:?} cannot be decoded without the originating request")]
    MissingContext {
        /// Kind that required the context
        kind: Kind,
    },

    // Decode errors
    /// Source buffer is shorter than the object layout requires
    #[error("truncated {kind:?}: needed {needed} bytes, {available} available")]
    Truncated {
        /// Kind being decoded when the buffer ran out
        kind: Kind,
        /// Bytes required to finish the current field
        needed: usize,
        /// Bytes left in the buffer
        available: usize,
    },

    /// A length field holds a value the layout cannot express
    #[error("invalid length field in {kind:?}: {value}")]
    InvalidLength {
        /// Kind carrying the length field
        kind: Kind,
        /// Raw value found on the wire
        value: u32,
    },

    /// Header category is neither request nor response
    #[error("invalid message category: {0:#x}")]
    InvalidCategory(u8),

    /// Header claims more payload bytes than the buffer holds
    #[error("payload truncated: header claims {expected} bytes, only {actual} available")]
    PayloadTruncated {
        /// Payload length from the header
        expected: usize,
        /// Bytes actually available after the header
        actual: usize,
    },

    /// Decoded payload did not consume exactly the header's length
    #[error("payload size mismatch: header says {header} bytes, payload used {actual}")]
    PayloadSizeMismatch {
        /// Length claimed in the header
        header: usize,
        /// Bytes consumed by the payload decoder
        actual: usize,
    },

    // Encode errors
    /// A field value does not fit its wire width
    #[error("{field} value {value:#x} exceeds maximum {max:#x}")]
    ValueOutOfRange {
        /// Field name
        field: &'static str,
        /// Offending value
        value: u64,
        /// Largest value the field can carry
        max: u64,
    },

    /// A list holds more entries than the protocol allows
    #[error("{what} holds {len} entries, maximum is {max}")]
    CapacityExceeded {
        /// List name
        what: &'static str,
        /// Attempted length
        len: usize,
        /// Protocol maximum
        max: usize,
    },

    /// Message exceeds the configured transport limit
    #[error("message too large: {size} bytes exceeds maximum {max}")]
    MessageTooLarge {
        /// Total message size (header + payload)
        size: usize,
        /// Configured maximum
        max: usize,
    },

    // Configuration errors
    /// Codec configuration is inconsistent
    #[error("invalid codec configuration: {0}")]
    InvalidConfig(String),
}

/// Convenient Result type alias for codec operations
pub type Result<T> = std::result::Result<T, ProtocolError>;
