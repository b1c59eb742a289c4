//! Object kinds and the opcode to kind dispatch tables.
//!
//! A [`Kind`] names one of the payload shapes the codec knows how to encode
//! and decode. Payload bytes never describe their own kind: it follows from
//! the header opcode and whether the message is a request or a response.
//! [`kind_for_request`] and [`kind_for_response`] are total over the full
//! opcode space and return [`Kind::Empty`] when the message carries no
//! payload, including for unknown opcodes.

use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::{
    Opcode,
    errors::{ProtocolError, Result},
};

/// Payload shapes of the FM API
///
/// The ordinals are stable and are what a harness uses to select a kind.
/// They are not transmitted on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum Kind {
    /// No payload bytes
    Empty = 0,
    /// Message header
    Header = 1,

    // Physical Switch
    /// Identify Switch Device response
    SwitchIdentity = 2,
    /// Get Physical Port State request
    PortStateRequest = 3,
    /// Per-port block of a port state response
    PortInfo = 4,
    /// Get Physical Port State response
    PortStateResponse = 5,
    /// Physical Port Control request
    PortControl = 6,
    /// Send PPB CXL.io Configuration request
    PpbConfigRequest = 7,
    /// Send PPB CXL.io Configuration response
    PpbConfigResponse = 8,

    // Virtual Switch
    /// Get Virtual CXL Switch Info request
    VcsInfoRequest = 9,
    /// Per-vPPB block of a VCS info block
    PpbStatusBlock = 10,
    /// Per-VCS block of a VCS info response
    VcsInfoBlock = 11,
    /// Get Virtual CXL Switch Info response
    VcsInfoResponse = 12,
    /// Bind vPPB request
    BindVppb = 13,
    /// Unbind vPPB request
    UnbindVppb = 14,
    /// Generate AER Event request
    GenerateAer = 15,

    // MLD Port
    /// Tunnel Management Command request
    TunnelRequest = 16,
    /// Tunnel Management Command response
    TunnelResponse = 17,
    /// Send LD CXL.io Configuration request
    LdConfigRequest = 18,
    /// Send LD CXL.io Configuration response
    LdConfigResponse = 19,
    /// Send LD CXL.io Memory request
    LdMemoryRequest = 20,
    /// Send LD CXL.io Memory response
    LdMemoryResponse = 21,

    // MLD Component
    /// Get LD Info response
    LdInfo = 22,
    /// Per-LD block of an allocation list
    LdAllocBlock = 23,
    /// Get LD Allocations request
    GetLdAllocRequest = 24,
    /// Get LD Allocations response
    GetLdAllocResponse = 25,
    /// Set LD Allocations request
    SetLdAllocRequest = 26,
    /// Set LD Allocations response
    SetLdAllocResponse = 27,
    /// QoS control payload (get response, set request and response)
    QosControl = 28,
    /// Get QoS Status response
    QosStatus = 29,
    /// Get QoS Allocated BW request
    GetQosAllocRequest = 30,
    /// QoS allocated bandwidth payload
    QosAlloc = 31,
    /// Get QoS BW Limit request
    GetQosLimitRequest = 32,
    /// QoS bandwidth limit payload
    QosLimit = 33,

    // Information and Status
    /// Identify response
    Identify = 34,
    /// Response message limit payload
    MessageLimit = 35,
    /// Background Operation Status response
    BackgroundStatus = 36,
}

impl Kind {
    /// Number of kinds, `Empty` included
    pub const COUNT: usize = 37;

    /// All kinds in ordinal order
    pub const ALL: [Kind; Self::COUNT] = [
        Self::Empty,
        Self::Header,
        Self::SwitchIdentity,
        Self::PortStateRequest,
        Self::PortInfo,
        Self::PortStateResponse,
        Self::PortControl,
        Self::PpbConfigRequest,
        Self::PpbConfigResponse,
        Self::VcsInfoRequest,
        Self::PpbStatusBlock,
        Self::VcsInfoBlock,
        Self::VcsInfoResponse,
        Self::BindVppb,
        Self::UnbindVppb,
        Self::GenerateAer,
        Self::TunnelRequest,
        Self::TunnelResponse,
        Self::LdConfigRequest,
        Self::LdConfigResponse,
        Self::LdMemoryRequest,
        Self::LdMemoryResponse,
        Self::LdInfo,
        Self::LdAllocBlock,
        Self::GetLdAllocRequest,
        Self::GetLdAllocResponse,
        Self::SetLdAllocRequest,
        Self::SetLdAllocResponse,
        Self::QosControl,
        Self::QosStatus,
        Self::GetQosAllocRequest,
        Self::QosAlloc,
        Self::GetQosLimitRequest,
        Self::QosLimit,
        Self::Identify,
        Self::MessageLimit,
        Self::BackgroundStatus,
    ];

    /// Stable ordinal of this kind
    #[must_use]
    pub const fn ordinal(self) -> u8 {
        self as u8
    }

    /// Look up a kind by ordinal
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnknownKind`] for ordinals outside the
    /// enumeration.
    pub fn from_ordinal(ordinal: u8) -> Result<Self> {
        Self::ALL.get(usize::from(ordinal)).copied().ok_or(ProtocolError::UnknownKind(ordinal))
    }

    /// Serialized length of the fixed portion of this kind
    ///
    /// Variable-length kinds extend past this minimum by their list or blob.
    #[must_use]
    pub const fn fixed_len(self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Header => 12,
            Self::SwitchIdentity => 93,
            Self::PortStateRequest => 1,
            Self::PortInfo => 16,
            Self::PortStateResponse => 4,
            Self::PortControl => 2,
            Self::PpbConfigRequest => 8,
            Self::PpbConfigResponse => 4,
            Self::VcsInfoRequest => 3,
            Self::PpbStatusBlock => 4,
            Self::VcsInfoBlock => 4,
            Self::VcsInfoResponse => 4,
            Self::BindVppb => 6,
            Self::UnbindVppb => 3,
            Self::GenerateAer => 40,
            Self::TunnelRequest => 5,
            Self::TunnelResponse => 5,
            Self::LdConfigRequest => 12,
            Self::LdConfigResponse => 4,
            Self::LdMemoryRequest => 16,
            Self::LdMemoryResponse => 4,
            Self::LdInfo => 11,
            Self::LdAllocBlock => 16,
            Self::GetLdAllocRequest => 2,
            Self::GetLdAllocResponse => 4,
            Self::SetLdAllocRequest => 4,
            Self::SetLdAllocResponse => 4,
            Self::QosControl => 7,
            Self::QosStatus => 1,
            Self::GetQosAllocRequest => 2,
            Self::QosAlloc => 2,
            Self::GetQosLimitRequest => 2,
            Self::QosLimit => 2,
            Self::Identify => 17,
            Self::MessageLimit => 1,
            Self::BackgroundStatus => 8,
        }
    }

    /// Whether this kind carries no payload bytes
    #[must_use]
    pub const fn is_empty(self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Whether decoding this kind requires the originating request
    #[must_use]
    pub const fn needs_context(self) -> bool {
        matches!(self, Self::VcsInfoBlock | Self::VcsInfoResponse)
    }
}

impl TryFrom<u8> for Kind {
    type Error = ProtocolError;

    fn try_from(ordinal: u8) -> Result<Self> {
        Self::from_ordinal(ordinal)
    }
}

/// Message direction, carried in the header category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Request (category 0)
    Request,
    /// Response (category 1)
    Response,
}

impl Direction {
    /// Header category value for this direction
    #[must_use]
    pub const fn category(self) -> u8 {
        match self {
            Self::Request => 0,
            Self::Response => 1,
        }
    }

    /// Direction for a header category, if it is one the FM API defines
    #[must_use]
    pub const fn from_category(category: u8) -> Option<Self> {
        match category {
            0 => Some(Self::Request),
            1 => Some(Self::Response),
            _ => None,
        }
    }
}

/// Kind carried by a request with the given opcode
#[must_use]
pub const fn kind_for_request(opcode: u16) -> Kind {
    let Some(opcode) = Opcode::from_u16(opcode) else {
        return Kind::Empty;
    };

    match opcode {
        Opcode::Identify
        | Opcode::BackgroundStatus
        | Opcode::GetMessageLimit
        | Opcode::IdentifySwitch
        | Opcode::GetLdInfo
        | Opcode::GetQosControl
        | Opcode::GetQosStatus => Kind::Empty,

        Opcode::SetMessageLimit => Kind::MessageLimit,

        Opcode::GetPortState => Kind::PortStateRequest,
        Opcode::PortControl => Kind::PortControl,
        Opcode::PpbConfig => Kind::PpbConfigRequest,

        Opcode::GetVcsInfo => Kind::VcsInfoRequest,
        Opcode::BindVppb => Kind::BindVppb,
        Opcode::UnbindVppb => Kind::UnbindVppb,
        Opcode::GenerateAer => Kind::GenerateAer,

        Opcode::Tunnel => Kind::TunnelRequest,
        Opcode::LdConfig => Kind::LdConfigRequest,
        Opcode::LdMemory => Kind::LdMemoryRequest,

        Opcode::GetLdAlloc => Kind::GetLdAllocRequest,
        Opcode::SetLdAlloc => Kind::SetLdAllocRequest,
        Opcode::SetQosControl => Kind::QosControl,
        Opcode::GetQosAlloc => Kind::GetQosAllocRequest,
        Opcode::SetQosAlloc => Kind::QosAlloc,
        Opcode::GetQosLimit => Kind::GetQosLimitRequest,
        Opcode::SetQosLimit => Kind::QosLimit,
    }
}

/// Kind carried by a response with the given opcode
#[must_use]
pub const fn kind_for_response(opcode: u16) -> Kind {
    let Some(opcode) = Opcode::from_u16(opcode) else {
        return Kind::Empty;
    };

    match opcode {
        Opcode::Identify => Kind::Identify,
        Opcode::BackgroundStatus => Kind::BackgroundStatus,
        Opcode::GetMessageLimit | Opcode::SetMessageLimit => Kind::MessageLimit,

        Opcode::IdentifySwitch => Kind::SwitchIdentity,
        Opcode::GetPortState => Kind::PortStateResponse,
        Opcode::PpbConfig => Kind::PpbConfigResponse,

        Opcode::GetVcsInfo => Kind::VcsInfoResponse,

        Opcode::PortControl | Opcode::BindVppb | Opcode::UnbindVppb | Opcode::GenerateAer => {
            Kind::Empty
        },

        Opcode::Tunnel => Kind::TunnelResponse,
        Opcode::LdConfig => Kind::LdConfigResponse,
        Opcode::LdMemory => Kind::LdMemoryResponse,

        Opcode::GetLdInfo => Kind::LdInfo,
        Opcode::GetLdAlloc => Kind::GetLdAllocResponse,
        Opcode::SetLdAlloc => Kind::SetLdAllocResponse,
        Opcode::GetQosControl | Opcode::SetQosControl => Kind::QosControl,
        Opcode::GetQosStatus => Kind::QosStatus,
        Opcode::GetQosAlloc | Opcode::SetQosAlloc => Kind::QosAlloc,
        Opcode::GetQosLimit | Opcode::SetQosLimit => Kind::QosLimit,
    }
}

/// Kind carried by a message with the given opcode and direction
#[must_use]
pub const fn kind_for(opcode: u16, direction: Direction) -> Kind {
    match direction {
        Direction::Request => kind_for_request(opcode),
        Direction::Response => kind_for_response(opcode),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals_match_positions() {
        for (i, kind) in Kind::ALL.iter().enumerate() {
            assert_eq!(usize::from(kind.ordinal()), i);
            assert_eq!(Kind::from_ordinal(kind.ordinal()), Ok(*kind));
        }
    }

    #[test]
    fn unknown_ordinal_rejected() {
        assert_eq!(Kind::from_ordinal(37), Err(ProtocolError::UnknownKind(37)));
        assert_eq!(Kind::try_from(0xFF), Err(ProtocolError::UnknownKind(0xFF)));
    }

    #[test]
    fn identify_switch_is_asymmetric() {
        assert_eq!(kind_for_request(0x5100), Kind::Empty);
        assert_eq!(kind_for_response(0x5100), Kind::SwitchIdentity);
    }

    #[test]
    fn info_status_set_is_asymmetric() {
        assert_eq!(kind_for_request(0x0001), Kind::Empty);
        assert_eq!(kind_for_response(0x0001), Kind::Identify);
        assert_eq!(kind_for_request(0x0004), Kind::MessageLimit);
        assert_eq!(kind_for_response(0x0003), Kind::MessageLimit);
    }

    #[test]
    fn virtual_switch_commands_have_empty_responses() {
        for op in [0x5201, 0x5202, 0x5203] {
            assert!(!kind_for_request(op).is_empty());
            assert_eq!(kind_for_response(op), Kind::Empty);
        }
    }

    #[test]
    fn qos_shapes_shared_across_directions() {
        assert_eq!(kind_for_request(0x5404), Kind::QosControl);
        assert_eq!(kind_for_response(0x5403), Kind::QosControl);
        assert_eq!(kind_for_response(0x5404), Kind::QosControl);
        assert_eq!(kind_for_request(0x5407), Kind::QosAlloc);
        assert_eq!(kind_for_response(0x5406), Kind::QosAlloc);
        assert_eq!(kind_for_request(0x5409), Kind::QosLimit);
        assert_eq!(kind_for_response(0x5408), Kind::QosLimit);
    }

    #[test]
    fn unknown_opcodes_map_to_empty() {
        for op in [0x0000, 0x0005, 0x5104, 0x540A, 0xFFFF] {
            assert_eq!(kind_for_request(op), Kind::Empty);
            assert_eq!(kind_for_response(op), Kind::Empty);
        }
    }

    #[test]
    fn sub_objects_never_selected_by_opcode() {
        let sub = [Kind::Header, Kind::PortInfo, Kind::PpbStatusBlock, Kind::VcsInfoBlock, Kind::LdAllocBlock];
        for raw in 0..=u16::MAX {
            assert!(!sub.contains(&kind_for_request(raw)));
            assert!(!sub.contains(&kind_for_response(raw)));
        }
    }

    #[test]
    fn direction_categories() {
        assert_eq!(Direction::from_category(0), Some(Direction::Request));
        assert_eq!(Direction::from_category(1), Some(Direction::Response));
        assert_eq!(Direction::from_category(2), None);
        assert_eq!(kind_for(0x5201, Direction::Request), Kind::BindVppb);
        assert_eq!(kind_for(0x5201, Direction::Response), Kind::Empty);
    }
}
