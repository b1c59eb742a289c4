//! Outbound message construction.
//!
//! One function per FM API command. Each returns a request [`Message`] with
//! tag 0, no background flag and `len` set from the payload. Field values are
//! passed through as given: a value too wide for its wire field is reported
//! when the message is encoded, not here. The only failures at build time are
//! lists longer than the protocol allows.

use bytes::{BufMut, Bytes, BytesMut};
use heapless::Vec;

use crate::{
    Header, Message, Opcode, Payload, ReturnCode,
    errors::{ProtocolError, Result},
    flags::QosTelemetry,
    payloads::{
        BindVppb, GenerateAer, GetLdAllocRequest, GetQosAllocRequest, GetQosLimitRequest, LdAllocBlock,
        LdConfigRequest, LdMemoryRequest, MessageLimit, PortControl, PortStateRequest, PpbConfigRequest, QosAlloc,
        QosControl, QosLimit, SetLdAllocRequest, TunnelRequest, TunnelResponse, UnbindVppb, VcsInfoRequest,
    },
};

/// LD allocation entries requested when the caller passes a limit of 0
pub const DEFAULT_LD_ALLOC_LIMIT: u8 = 255;

/// QoS allocation entries requested when the caller passes a limit of 0
pub const DEFAULT_QOS_ALLOC_LIMIT: u8 = 255;

/// QoS limit entries requested when the caller passes a limit of 0
pub const DEFAULT_QOS_LIMIT_LIMIT: u8 = 16;

fn request(opcode: Opcode, payload: impl Into<Payload>) -> Message {
    Message::new(Header::new(opcode), payload)
}

fn bounded<T: Clone, const N: usize>(what: &'static str, items: &[T]) -> Result<Vec<T, N>> {
    Vec::from_slice(items).map_err(|()| ProtocolError::CapacityExceeded { what, len: items.len(), max: N })
}

const fn or_default(limit: u8, default: u8) -> u8 {
    if limit == 0 { default } else { limit }
}

// Information and Status

/// Identify
#[must_use]
pub fn identify() -> Message {
    request(Opcode::Identify, Payload::Empty)
}

/// Background Operation Status
#[must_use]
pub fn background_status() -> Message {
    request(Opcode::BackgroundStatus, Payload::Empty)
}

/// Get Response Message Limit
#[must_use]
pub fn get_message_limit() -> Message {
    request(Opcode::GetMessageLimit, Payload::Empty)
}

/// Set Response Message Limit to `2^limit` bytes
#[must_use]
pub fn set_message_limit(limit: u8) -> Message {
    request(Opcode::SetMessageLimit, MessageLimit { limit })
}

// Physical Switch

/// Identify Switch Device
#[must_use]
pub fn identify_switch() -> Message {
    request(Opcode::IdentifySwitch, Payload::Empty)
}

/// Get Physical Port State for ports 0 through 254
#[must_use]
pub fn get_all_ports() -> Message {
    request(Opcode::GetPortState, PortStateRequest { ports: (0..=254).collect() })
}

/// Get Physical Port State for one port
#[must_use]
pub fn get_port(ppid: u8) -> Message {
    request(Opcode::GetPortState, PortStateRequest { ports: std::iter::once(ppid).collect() })
}

/// Get Physical Port State for a list of ports
///
/// # Errors
///
/// Returns [`ProtocolError::CapacityExceeded`] for more than 256 ports.
pub fn get_ports(ppids: &[u8]) -> Result<Message> {
    Ok(request(Opcode::GetPortState, PortStateRequest { ports: bounded("port_state_request.ports", ppids)? }))
}

/// Physical Port Control
#[must_use]
pub fn port_control(ppid: u8, action: u8) -> Message {
    request(Opcode::PortControl, PortControl { ppid, action })
}

/// Send PPB CXL.io Configuration
#[must_use]
pub fn ppb_config(ppid: u8, register: u8, ext_register: u8, fdbe: u8, write: bool, data: [u8; 4]) -> Message {
    request(Opcode::PpbConfig, PpbConfigRequest { ppid, register, ext_register, fdbe, write, data })
}

// Virtual Switch

/// Get Virtual CXL Switch Info for one VCS
///
/// Keep the returned payload: it is the context needed to decode the
/// response.
#[must_use]
pub fn get_vcs_info(vcsid: u8, vppbid_start: u8, vppbid_limit: u8) -> Message {
    let vcss = std::iter::once(vcsid).collect();
    request(Opcode::GetVcsInfo, VcsInfoRequest { vppbid_start, vppbid_limit, vcss })
}

/// Bind vPPB
#[must_use]
pub fn bind_vppb(vcsid: u8, vppbid: u8, ppid: u8, ldid: u16) -> Message {
    request(Opcode::BindVppb, BindVppb { vcsid, vppbid, ppid, ldid })
}

/// Unbind vPPB
#[must_use]
pub fn unbind_vppb(vcsid: u8, vppbid: u8, option: u8) -> Message {
    request(Opcode::UnbindVppb, UnbindVppb { vcsid, vppbid, option })
}

/// Generate AER Event
#[must_use]
pub fn generate_aer(vcsid: u8, vppbid: u8, error_type: u32, tlp_header: [u8; 32]) -> Message {
    request(Opcode::GenerateAer, GenerateAer { vcsid, vppbid, error_type, tlp_header })
}

// MLD Port

fn embed(header: Header, payload: &Payload) -> Result<Bytes> {
    let payload = payload.to_bytes()?;
    let header = Header { len: u32::try_from(payload.len()).unwrap_or(u32::MAX), ..header };

    let mut buf = BytesMut::with_capacity(Header::SIZE + payload.len());
    header.encode(&mut buf)?;
    buf.put_slice(&payload);
    Ok(buf.freeze())
}

/// Tunnel Management Command carrying `inner` to the MLD behind `ppid`
///
/// The embedded header is rebuilt as a plain request: tag 0, no background
/// flag, zero status, `len` from the encoded inner payload. Only the inner
/// opcode survives.
///
/// # Errors
///
/// Returns any error encoding the inner payload raises.
pub fn tunnel(ppid: u8, mctp_type: u8, inner: &Message) -> Result<Message> {
    let header = Header::request(inner.header.opcode, 0);
    let message = embed(header, &inner.payload)?;

    tracing::debug!(
        ppid,
        mctp_type,
        inner_opcode = inner.header.opcode,
        inner_len = message.len() - Header::SIZE,
        "built tunnel request"
    );

    Ok(request(Opcode::Tunnel, TunnelRequest { ppid, mctp_type, message }))
}

/// Tunnel Management Command response carrying `inner` back to the FM
///
/// The embedded header keeps everything but `len`, which is recomputed. The
/// outer header reports success.
///
/// # Errors
///
/// Returns any error encoding the inner message raises.
pub fn tunnel_response(mctp_type: u8, inner: &Message) -> Result<Message> {
    let message = embed(inner.header, &inner.payload)?;

    tracing::debug!(
        mctp_type,
        inner_opcode = inner.header.opcode,
        inner_len = message.len() - Header::SIZE,
        "built tunnel response"
    );

    let header = Header::response(Opcode::Tunnel.to_u16(), 0, ReturnCode::Success.to_u16());
    Ok(Message::new(header, TunnelResponse { mctp_type, message }))
}

/// Send LD CXL.io Configuration
#[must_use]
pub fn ld_config(
    ppid: u8,
    ldid: u16,
    register: u8,
    ext_register: u8,
    fdbe: u8,
    write: bool,
    data: [u8; 4],
) -> Message {
    request(Opcode::LdConfig, LdConfigRequest { ppid, register, ext_register, fdbe, write, ldid, data })
}

/// Send LD CXL.io Memory
///
/// The transaction length is the length of `data`; a read passes the
/// buffer it expects back.
#[must_use]
pub fn ld_memory(
    ppid: u8,
    ldid: u16,
    offset: u64,
    fdbe: u8,
    ldbe: u8,
    write: bool,
    data: impl Into<Bytes>,
) -> Message {
    request(Opcode::LdMemory, LdMemoryRequest { ppid, fdbe, ldbe, write, ldid, offset, data: data.into() })
}

// MLD Component

/// Get LD Info
#[must_use]
pub fn get_ld_info() -> Message {
    request(Opcode::GetLdInfo, Payload::Empty)
}

/// Get LD Allocations; a `limit` of 0 asks for up to 255 entries
#[must_use]
pub fn get_ld_alloc(start: u8, limit: u8) -> Message {
    request(Opcode::GetLdAlloc, GetLdAllocRequest { start, limit: or_default(limit, DEFAULT_LD_ALLOC_LIMIT) })
}

/// Set LD Allocations starting at LD `start`
///
/// # Errors
///
/// Returns [`ProtocolError::CapacityExceeded`] for more than 16 blocks.
pub fn set_ld_alloc(start: u8, blocks: &[LdAllocBlock]) -> Result<Message> {
    let blocks = bounded("set_ld_alloc_request.blocks", blocks)?;
    Ok(request(Opcode::SetLdAlloc, SetLdAllocRequest { start, blocks }))
}

/// Get QoS Control
#[must_use]
pub fn get_qos_control() -> Message {
    request(Opcode::GetQosControl, Payload::Empty)
}

/// Set QoS Control
#[must_use]
pub fn set_qos_control(
    enable: QosTelemetry,
    moderate_pct: u8,
    severe_pct: u8,
    sample_interval: u8,
    req_cmp_basis: u16,
    completion_interval: u8,
) -> Message {
    request(
        Opcode::SetQosControl,
        QosControl { enable, moderate_pct, severe_pct, sample_interval, req_cmp_basis, completion_interval },
    )
}

/// Get QoS Status
#[must_use]
pub fn get_qos_status() -> Message {
    request(Opcode::GetQosStatus, Payload::Empty)
}

/// Get QoS Allocated BW; a `count` of 0 asks for up to 255 entries
#[must_use]
pub fn get_qos_alloc(start: u8, count: u8) -> Message {
    request(Opcode::GetQosAlloc, GetQosAllocRequest { count: or_default(count, DEFAULT_QOS_ALLOC_LIMIT), start })
}

/// Set QoS Allocated BW starting at LD `start`
///
/// # Errors
///
/// Returns [`ProtocolError::CapacityExceeded`] for more than 16 fractions.
pub fn set_qos_alloc(start: u8, fractions: &[u8]) -> Result<Message> {
    let fractions = bounded("qos_alloc.fractions", fractions)?;
    Ok(request(Opcode::SetQosAlloc, QosAlloc { start, fractions }))
}

/// Get QoS BW Limit; a `count` of 0 asks for 16 entries
#[must_use]
pub fn get_qos_limit(start: u8, count: u8) -> Message {
    request(Opcode::GetQosLimit, GetQosLimitRequest { count: or_default(count, DEFAULT_QOS_LIMIT_LIMIT), start })
}

/// Set QoS BW Limit starting at LD `start`
///
/// # Errors
///
/// Returns [`ProtocolError::CapacityExceeded`] for more than 16 fractions.
pub fn set_qos_limit(start: u8, fractions: &[u8]) -> Result<Message> {
    let fractions = bounded("qos_limit.fractions", fractions)?;
    Ok(request(Opcode::SetQosLimit, QosLimit { start, fractions }))
}
