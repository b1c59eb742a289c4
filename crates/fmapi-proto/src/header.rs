//! FM API message header.
//!
//! Every FM API message starts with a fixed 12-byte header (little endian).
//! Several fields are narrower than a byte boundary, so the in-memory
//! [`Header`] keeps each field in a plain integer and the packing happens only
//! at the encode/decode boundary through a `zerocopy` wire image.
//!
//! ```text
//! byte 0      bits 7..4 category, bits 3..0 reserved
//! byte 1      tag
//! byte 2      reserved
//! bytes 3-4   opcode
//! bytes 5-6   payload length bits 0..15
//! byte 7      bits 7..3 payload length bits 16..20, bit 0 background
//! bytes 8-9   return code
//! bytes 10-11 vendor specific extended status
//! ```

use bytes::BufMut;
use serde::{Deserialize, Serialize};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::{
    Direction, Kind, Opcode, ReturnCode,
    errors::{ProtocolError, Result},
    wire::check_width,
};

/// Raw 12-byte header as it appears on the wire
///
/// Fields are byte arrays so that every 12-byte pattern is a valid value and
/// casting untrusted input cannot fail on alignment.
#[repr(C)]
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
struct WireHeader {
    category: u8,        // bits 7..4
    tag: u8,
    reserved: u8,
    opcode: [u8; 2],
    len_low: [u8; 2],    // len bits 0..15
    len_high: u8,        // len bits 16..20 in bits 7..3, background in bit 0
    return_code: [u8; 2],
    ext_status: [u8; 2],
}

/// Decoded FM API message header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Header {
    /// Message category (4 bits): 0 request, 1 response
    pub category: u8,
    /// Tag echoed from request to response
    pub tag: u8,
    /// Command opcode, kept raw so unknown opcodes survive a decode
    pub opcode: u16,
    /// Command runs as a background operation
    pub background: bool,
    /// Payload length in bytes (21 bits)
    pub len: u32,
    /// Return code (responses only)
    pub return_code: u16,
    /// Vendor specific extended status
    pub ext_status: u16,
}

impl Header {
    /// Size of the serialized header
    pub const SIZE: usize = 12;

    /// Largest payload length the 21-bit length field can carry
    pub const MAX_LEN: u32 = 0x1F_FFFF;

    /// Largest category value (4 bits)
    pub const MAX_CATEGORY: u8 = 0x0F;

    /// Request header for `opcode` with everything else zero
    #[must_use]
    pub const fn new(opcode: Opcode) -> Self {
        Self::request(opcode.to_u16(), 0)
    }

    /// Request header with a tag
    #[must_use]
    pub const fn request(opcode: u16, tag: u8) -> Self {
        Self::fill(Direction::Request.category(), tag, opcode, false, 0, 0, 0)
    }

    /// Response header with a tag and return code
    #[must_use]
    pub const fn response(opcode: u16, tag: u8, return_code: u16) -> Self {
        Self::fill(Direction::Response.category(), tag, opcode, false, 0, return_code, 0)
    }

    /// Header with every field given explicitly
    #[must_use]
    pub const fn fill(
        category: u8,
        tag: u8,
        opcode: u16,
        background: bool,
        len: u32,
        return_code: u16,
        ext_status: u16,
    ) -> Self {
        Self { category, tag, opcode, background, len, return_code, ext_status }
    }

    /// Total message length described by this header, header included
    #[must_use]
    pub const fn message_len(&self) -> usize {
        Self::SIZE + self.len as usize
    }

    /// Direction named by the category, if it is a defined one
    #[must_use]
    pub const fn direction(&self) -> Option<Direction> {
        Direction::from_category(self.category)
    }

    /// Opcode as an enum (if known)
    #[must_use]
    pub const fn opcode_enum(&self) -> Option<Opcode> {
        Opcode::from_u16(self.opcode)
    }

    /// Return code as an enum (if known)
    #[must_use]
    pub const fn return_code_enum(&self) -> Option<ReturnCode> {
        ReturnCode::from_u16(self.return_code)
    }

    /// Payload kind this header announces
    ///
    /// Returns `None` when the category is neither request nor response.
    #[must_use]
    pub const fn payload_kind(&self) -> Option<Kind> {
        match self.direction() {
            Some(direction) => Some(crate::kind_for(self.opcode, direction)),
            None => None,
        }
    }

    /// Serialize the header into `dst`
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::ValueOutOfRange`] if the category exceeds 4
    /// bits or the length exceeds 21 bits. Nothing is written on error.
    pub fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        dst.put_slice(&self.to_bytes()?);
        Ok(())
    }

    /// Serialize the header to an array
    ///
    /// # Errors
    ///
    /// See [`Header::encode`].
    pub fn to_bytes(&self) -> Result<[u8; Self::SIZE]> {
        check_width("header.category", u64::from(self.category), u64::from(Self::MAX_CATEGORY))?;
        check_width("header.len", u64::from(self.len), u64::from(Self::MAX_LEN))?;

        let len = self.len.to_le_bytes();
        let wire = WireHeader {
            category: self.category << 4,
            tag: self.tag,
            reserved: 0,
            opcode: self.opcode.to_le_bytes(),
            len_low: [len[0], len[1]],
            len_high: (len[2] << 3) | u8::from(self.background),
            return_code: self.return_code.to_le_bytes(),
            ext_status: self.ext_status.to_le_bytes(),
        };

        let mut out = [0u8; Self::SIZE];
        out.copy_from_slice(wire.as_bytes());
        Ok(out)
    }

    /// Parse a header from the front of `src`
    ///
    /// Reserved bits are ignored. Opcode, category and return code are not
    /// validated here; [`Message::decode`](crate::Message::decode) decides
    /// what an unknown category means.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Truncated`] if `src` is shorter than 12 bytes.
    pub fn decode(src: &[u8]) -> Result<Self> {
        let (wire, _) = WireHeader::ref_from_prefix(src).map_err(|_| ProtocolError::Truncated {
            kind: Kind::Header,
            needed: Self::SIZE,
            available: src.len(),
        })?;

        let len = u32::from(u16::from_le_bytes(wire.len_low)) | (u32::from(wire.len_high >> 3) << 16);

        Ok(Self {
            category: wire.category >> 4,
            tag: wire.tag,
            opcode: u16::from_le_bytes(wire.opcode),
            background: wire.len_high & 0x01 != 0,
            len,
            return_code: u16::from_le_bytes(wire.return_code),
            ext_status: u16::from_le_bytes(wire.ext_status),
        })
    }
}
