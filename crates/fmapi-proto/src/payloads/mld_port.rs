//! MLD Port command set payloads.
//!
//! The tunnel commands carry a complete FM API message (header and payload)
//! addressed to the MLD behind a switch port. Their length field counts the
//! MCTP type byte as well as the embedded message, so the value on the wire is
//! one more than the number of message bytes that follow.

use bytes::{BufMut, Bytes};
use serde::{Deserialize, Serialize};

use super::{Decode, Payload, WireObject};
use crate::{
    CodecConfig, Kind, Message,
    errors::{ProtocolError, Result},
    wire::{Reader, check_capacity, check_width, len_u16},
};

/// Most data bytes in one LD CXL.io memory transaction
pub const MAX_LD_MEMORY_LEN: usize = 4096;

/// MCTP message type of an FM API message carried in a tunnel
pub const MCTP_TYPE_FMAPI: u8 = 0x07;

/// MCTP message type of a CXL CCI message carried in a tunnel
pub const MCTP_TYPE_CCI: u8 = 0x08;

fn tunnel_len_field(field: &'static str, message: &[u8]) -> Result<u16> {
    len_u16(field, message.len() + 1)
}

fn tunnel_message_len(kind: Kind, raw: u16) -> Result<usize> {
    match raw {
        0 => Err(ProtocolError::InvalidLength { kind, value: 0 }),
        raw => Ok(usize::from(raw) - 1),
    }
}

fn decode_embedded(message: &[u8], context: Option<&Payload>, config: &CodecConfig) -> Result<Message> {
    let (inner, consumed) = Message::decode(message, context, config)?;
    if config.strict_payload_len && consumed != message.len() {
        return Err(ProtocolError::PayloadSizeMismatch { header: message.len(), actual: consumed });
    }
    Ok(inner)
}

/// Tunnel Management Command request
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TunnelRequest {
    /// Physical port the target MLD is connected to
    pub ppid: u8,
    /// MCTP message type of the embedded message
    pub mctp_type: u8,
    /// Embedded message, header included
    pub message: Bytes,
}

impl TunnelRequest {
    /// Decode the embedded message
    ///
    /// # Errors
    ///
    /// Returns any error [`Message::decode`] raises for the embedded bytes,
    /// or [`ProtocolError::PayloadSizeMismatch`] if the embedded message does
    /// not fill the tunnel exactly and the configuration is strict.
    pub fn inner_message(&self, config: &CodecConfig) -> Result<Message> {
        decode_embedded(&self.message, None, config)
    }
}

impl WireObject for TunnelRequest {
    const KIND: Kind = Kind::TunnelRequest;

    fn encoded_len(&self) -> usize {
        Self::KIND.fixed_len() + self.message.len()
    }

    fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        let len = tunnel_len_field("tunnel_request.len", &self.message)?;

        dst.put_u8(self.ppid);
        dst.put_u8(0);
        dst.put_u16_le(len);
        dst.put_u8(self.mctp_type);
        dst.put_slice(&self.message);
        Ok(())
    }
}

impl Decode for TunnelRequest {
    fn decode(r: &mut Reader<'_>) -> Result<Self> {
        let ppid = r.u8()?;
        r.skip(1)?;
        let len = tunnel_message_len(Self::KIND, r.u16()?)?;
        let mctp_type = r.u8()?;

        Ok(Self { ppid, mctp_type, message: r.bytes(len)? })
    }
}

/// Tunnel Management Command response
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TunnelResponse {
    /// MCTP message type of the embedded message
    pub mctp_type: u8,
    /// Embedded response message, header included
    pub message: Bytes,
}

impl TunnelResponse {
    /// Decode the embedded response
    ///
    /// `context` is the request the embedded response answers; only needed
    /// when it is a Get Virtual CXL Switch Info response.
    ///
    /// # Errors
    ///
    /// See [`TunnelRequest::inner_message`].
    pub fn inner_message(&self, context: Option<&Payload>, config: &CodecConfig) -> Result<Message> {
        decode_embedded(&self.message, context, config)
    }
}

impl WireObject for TunnelResponse {
    const KIND: Kind = Kind::TunnelResponse;

    fn encoded_len(&self) -> usize {
        Self::KIND.fixed_len() + self.message.len()
    }

    fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        let len = tunnel_len_field("tunnel_response.len", &self.message)?;

        dst.put_u16_le(len);
        dst.put_bytes(0, 2);
        dst.put_u8(self.mctp_type);
        dst.put_slice(&self.message);
        Ok(())
    }
}

impl Decode for TunnelResponse {
    fn decode(r: &mut Reader<'_>) -> Result<Self> {
        let len = tunnel_message_len(Self::KIND, r.u16()?)?;
        r.skip(2)?;
        let mctp_type = r.u8()?;

        Ok(Self { mctp_type, message: r.bytes(len)? })
    }
}

/// Send LD CXL.io Configuration request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LdConfigRequest {
    /// Physical port of the MLD
    pub ppid: u8,
    /// Register number
    pub register: u8,
    /// Extended register number (4 bits)
    pub ext_register: u8,
    /// First dword byte enable (4 bits)
    pub fdbe: u8,
    /// Write transaction; read when false
    pub write: bool,
    /// Target LD ID
    pub ldid: u16,
    /// Data for a write
    pub data: [u8; 4],
}

impl WireObject for LdConfigRequest {
    const KIND: Kind = Kind::LdConfigRequest;

    fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        check_width("ld_config.ext_register", u64::from(self.ext_register), 0x0F)?;
        check_width("ld_config.fdbe", u64::from(self.fdbe), 0x0F)?;

        dst.put_u8(self.ppid);
        dst.put_u8(self.register);
        dst.put_u8((self.fdbe << 4) | self.ext_register);
        dst.put_u8(u8::from(self.write) << 7);
        dst.put_u16_le(self.ldid);
        dst.put_bytes(0, 2);
        dst.put_slice(&self.data);
        Ok(())
    }
}

impl Decode for LdConfigRequest {
    fn decode(r: &mut Reader<'_>) -> Result<Self> {
        let [ppid, register, enables, transaction] = r.array()?;
        let ldid = r.u16()?;
        r.skip(2)?;

        Ok(Self {
            ppid,
            register,
            ext_register: enables & 0x0F,
            fdbe: enables >> 4,
            write: transaction & 0x80 != 0,
            ldid,
            data: r.array()?,
        })
    }
}

/// Send LD CXL.io Configuration response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LdConfigResponse {
    /// Data read from the register
    pub data: [u8; 4],
}

impl WireObject for LdConfigResponse {
    const KIND: Kind = Kind::LdConfigResponse;

    fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        dst.put_slice(&self.data);
        Ok(())
    }
}

impl Decode for LdConfigResponse {
    fn decode(r: &mut Reader<'_>) -> Result<Self> {
        Ok(Self { data: r.array()? })
    }
}

/// Send LD CXL.io Memory request
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LdMemoryRequest {
    /// Physical port of the MLD
    pub ppid: u8,
    /// First dword byte enable (4 bits)
    pub fdbe: u8,
    /// Last dword byte enable (4 bits)
    pub ldbe: u8,
    /// Write transaction; read when false
    pub write: bool,
    /// Target LD ID
    pub ldid: u16,
    /// Offset into the LD's memory space
    pub offset: u64,
    /// Transaction data, at most 4096 bytes
    pub data: Bytes,
}

impl WireObject for LdMemoryRequest {
    const KIND: Kind = Kind::LdMemoryRequest;

    fn encoded_len(&self) -> usize {
        Self::KIND.fixed_len() + self.data.len()
    }

    fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        check_width("ld_memory.fdbe", u64::from(self.fdbe), 0x0F)?;
        check_width("ld_memory.ldbe", u64::from(self.ldbe), 0x0F)?;
        check_capacity("ld_memory_request.data", self.data.len(), MAX_LD_MEMORY_LEN)?;
        let len = len_u16("ld_memory_request.len", self.data.len())?;

        dst.put_u8(self.ppid);
        dst.put_u8(0);
        dst.put_u8(self.fdbe << 4);
        dst.put_u8((u8::from(self.write) << 7) | self.ldbe);
        dst.put_u16_le(self.ldid);
        dst.put_u16_le(len);
        dst.put_u64_le(self.offset);
        dst.put_slice(&self.data);
        Ok(())
    }
}

impl Decode for LdMemoryRequest {
    fn decode(r: &mut Reader<'_>) -> Result<Self> {
        let [ppid, _, enables, transaction] = r.array()?;
        let ldid = r.u16()?;
        let len = usize::from(r.u16()?);
        let offset = r.u64()?;
        check_capacity("ld_memory_request.data", len, MAX_LD_MEMORY_LEN)?;

        Ok(Self {
            ppid,
            fdbe: enables >> 4,
            ldbe: transaction & 0x0F,
            write: transaction & 0x80 != 0,
            ldid,
            offset,
            data: r.bytes(len)?,
        })
    }
}

/// Send LD CXL.io Memory response
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LdMemoryResponse {
    /// Data read, at most 4096 bytes
    pub data: Bytes,
}

impl WireObject for LdMemoryResponse {
    const KIND: Kind = Kind::LdMemoryResponse;

    fn encoded_len(&self) -> usize {
        Self::KIND.fixed_len() + self.data.len()
    }

    fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        check_capacity("ld_memory_response.data", self.data.len(), MAX_LD_MEMORY_LEN)?;
        let len = len_u16("ld_memory_response.len", self.data.len())?;

        dst.put_u16_le(len);
        dst.put_bytes(0, 2);
        dst.put_slice(&self.data);
        Ok(())
    }
}

impl Decode for LdMemoryResponse {
    fn decode(r: &mut Reader<'_>) -> Result<Self> {
        let len = usize::from(r.u16()?);
        r.skip(2)?;
        check_capacity("ld_memory_response.data", len, MAX_LD_MEMORY_LEN)?;

        Ok(Self { data: r.bytes(len)? })
    }
}
