//! # FM API Protocol: Wire Format
//!
//! This crate implements the binary encoding of the CXL Fabric Management
//! (FM) API: the messages a fabric manager exchanges with CXL switches and
//! multi-logical devices to inspect ports, bind virtual PPBs, tunnel commands
//! to MLDs and configure LD memory and QoS.
//!
//! ## Protocol Design
//!
//! Every message is a 12-byte little-endian [`Header`] followed by a payload
//! whose shape (its [`Kind`]) is fixed by the header's opcode and category:
//! - **Header**: category, tag, opcode, a 21-bit payload length, background
//!   flag, return code and extended status
//! - **Payload**: one of ~36 fixed layouts, some followed by a list or blob
//!   whose length is carried in the payload itself
//!
//! Payload bytes are not self-describing. [`kind_for_request`] and
//! [`kind_for_response`] map an opcode to its kind, and [`Payload::decode`]
//! dispatches on the kind. [`Message`] does both in one step.
//!
//! ## Implementation Notes
//!
//! - **Packing at the Boundary**: in-memory types hold every field as a plain
//!   integer or flag set. Sub-byte fields are packed and unpacked only by the
//!   codec, and a value too wide for its field is rejected with
//!   [`ProtocolError::ValueOutOfRange`] instead of being truncated.
//!
//! - **Bounded Lists**: variable-length lists are `heapless::Vec`s sized to
//!   the protocol maximum, so a count read off the wire can never drive an
//!   unbounded allocation.
//!
//! - **Context-Dependent Responses**: the size of a Get Virtual CXL Switch
//!   Info response depends on the request that produced it. Decoding one
//!   requires that request as context.
//!
//! ## Security Properties
//!
//! - **No Unsafe Deserialization**: the header is cast with `zerocopy` and
//!   every other read goes through a bounds-checked reader. Short input is an
//!   error, never a panic.
//!
//! - **Size Limits**: [`CodecConfig`] bounds whole messages at both encode
//!   and decode.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod builder;
pub mod config;
pub mod errors;
pub mod flags;
pub mod header;
pub mod kinds;
pub mod message;
pub mod opcodes;
pub mod payloads;
pub mod wire;

pub use config::CodecConfig;
pub use errors::{ProtocolError, Result};
pub use flags::{LinkStateFlags, QosTelemetry};
pub use header::Header;
pub use kinds::{Direction, Kind, kind_for, kind_for_request, kind_for_response};
pub use message::Message;
pub use opcodes::{CommandSet, Opcode, ReturnCode};
pub use payloads::{Decode, Payload, WireObject};
