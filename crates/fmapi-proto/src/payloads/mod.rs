//! FM API payload objects.
//!
//! Every object has a fixed little-endian layout, optionally followed by a
//! list or blob whose length is carried in the object itself. Payload bytes do
//! not identify their own shape: the caller picks the [`Kind`] (usually via
//! [`kind_for_request`](crate::kind_for_request) or
//! [`kind_for_response`](crate::kind_for_response)) and the [`Payload`] enum
//! dispatches on it.
//!
//! # Encoding Rules
//!
//! - Reserved bytes and bits are written as zero and ignored on decode.
//! - Sub-byte fields are plain integers in memory and packed only on the wire.
//!   A value that does not fit its field is rejected at encode time with
//!   [`ProtocolError::ValueOutOfRange`], never truncated.
//! - List counts and blob lengths are derived from the in-memory collection,
//!   so they can never disagree with the data.
//! - `bytes consumed by decode == bytes produced by encode == encoded_len()`.

pub mod info;
pub mod mld_component;
pub mod mld_port;
pub mod switch;
pub mod vcs;

#[cfg(test)]
pub(crate) mod testing;

use bytes::{BufMut, Bytes, BytesMut};
use heapless::Vec;
use serde::{Deserialize, Serialize};

pub use self::{
    info::{BackgroundStatus, Identify, MessageLimit},
    mld_component::{
        GetLdAllocRequest, GetLdAllocResponse, GetQosAllocRequest, GetQosLimitRequest, LdAllocBlock, LdInfo,
        QosAlloc, QosControl, QosLimit, QosStatus, SetLdAllocRequest, SetLdAllocResponse,
    },
    mld_port::{LdConfigRequest, LdConfigResponse, LdMemoryRequest, LdMemoryResponse, TunnelRequest, TunnelResponse},
    switch::{PortControl, PortInfo, PortStateRequest, PortStateResponse, PpbConfigRequest, PpbConfigResponse, SwitchIdentity},
    vcs::{BindVppb, GenerateAer, PpbStatusBlock, UnbindVppb, VcsInfoBlock, VcsInfoRequest, VcsInfoResponse},
};
use crate::{
    Header, Kind,
    errors::{ProtocolError, Result},
    wire::{Reader, check_capacity},
};

/// An object with a fixed wire layout
pub trait WireObject {
    /// Kind this object encodes as
    const KIND: Kind;

    /// Serialized length in bytes
    fn encoded_len(&self) -> usize {
        Self::KIND.fixed_len()
    }

    /// Serialize into `dst`
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::ValueOutOfRange`] or
    /// [`ProtocolError::CapacityExceeded`] if a field cannot be represented.
    /// `dst` may hold a partial object on error; [`Payload::encode`] never
    /// exposes one.
    fn encode(&self, dst: &mut impl BufMut) -> Result<()>;
}

/// An object that decodes without outside context
pub trait Decode: WireObject + Sized {
    /// Deserialize from the reader's current position
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Truncated`] if the buffer ends early, or
    /// [`ProtocolError::CapacityExceeded`] if a count exceeds its list bound.
    fn decode(r: &mut Reader<'_>) -> Result<Self>;
}

pub(crate) fn encode_list<T: WireObject>(list: &[T], dst: &mut impl BufMut) -> Result<()> {
    for item in list {
        item.encode(dst)?;
    }
    Ok(())
}

pub(crate) fn decode_list<T: Decode, const N: usize>(
    r: &mut Reader<'_>,
    count: usize,
    what: &'static str,
) -> Result<Vec<T, N>> {
    check_capacity(what, count, N)?;

    let mut list = Vec::new();
    for _ in 0..count {
        let item = r.scoped(T::KIND, T::decode)?;
        list.push(item).map_err(|_| ProtocolError::CapacityExceeded { what, len: count, max: N })?;
    }
    Ok(list)
}

pub(crate) fn decode_byte_list<const N: usize>(
    r: &mut Reader<'_>,
    count: usize,
    what: &'static str,
) -> Result<Vec<u8, N>> {
    check_capacity(what, count, N)?;
    Vec::from_slice(r.take(count)?).map_err(|()| ProtocolError::CapacityExceeded { what, len: count, max: N })
}

/// Any FM API object, tagged by kind
///
/// # Invariants
///
/// - **Kind Uniqueness**: each variant corresponds to exactly one [`Kind`],
///   returned by [`Payload::kind`].
///
/// - **Round Trip**: encoding a payload and decoding the bytes with the same
///   kind (and, for VCS info, the originating request) yields an equal value
///   and consumes exactly the bytes produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::large_enum_variant)] // bounded lists are stored inline
pub enum Payload {
    /// No payload bytes
    Empty,
    /// Message header (12 bytes)
    Header(Header),

    // Physical Switch
    /// Identify Switch Device response
    SwitchIdentity(SwitchIdentity),
    /// Get Physical Port State request
    PortStateRequest(PortStateRequest),
    /// One port state block
    PortInfo(PortInfo),
    /// Get Physical Port State response
    PortStateResponse(PortStateResponse),
    /// Physical Port Control request
    PortControl(PortControl),
    /// Send PPB CXL.io Configuration request
    PpbConfigRequest(PpbConfigRequest),
    /// Send PPB CXL.io Configuration response
    PpbConfigResponse(PpbConfigResponse),

    // Virtual Switch
    /// Get Virtual CXL Switch Info request
    VcsInfoRequest(VcsInfoRequest),
    /// One vPPB status block
    PpbStatusBlock(PpbStatusBlock),
    /// One VCS info block
    VcsInfoBlock(VcsInfoBlock),
    /// Get Virtual CXL Switch Info response
    VcsInfoResponse(VcsInfoResponse),
    /// Bind vPPB request
    BindVppb(BindVppb),
    /// Unbind vPPB request
    UnbindVppb(UnbindVppb),
    /// Generate AER Event request
    GenerateAer(GenerateAer),

    // MLD Port
    /// Tunnel Management Command request
    TunnelRequest(TunnelRequest),
    /// Tunnel Management Command response
    TunnelResponse(TunnelResponse),
    /// Send LD CXL.io Configuration request
    LdConfigRequest(LdConfigRequest),
    /// Send LD CXL.io Configuration response
    LdConfigResponse(LdConfigResponse),
    /// Send LD CXL.io Memory request
    LdMemoryRequest(LdMemoryRequest),
    /// Send LD CXL.io Memory response
    LdMemoryResponse(LdMemoryResponse),

    // MLD Component
    /// Get LD Info response
    LdInfo(LdInfo),
    /// One LD allocation block
    LdAllocBlock(LdAllocBlock),
    /// Get LD Allocations request
    GetLdAllocRequest(GetLdAllocRequest),
    /// Get LD Allocations response
    GetLdAllocResponse(GetLdAllocResponse),
    /// Set LD Allocations request
    SetLdAllocRequest(SetLdAllocRequest),
    /// Set LD Allocations response
    SetLdAllocResponse(SetLdAllocResponse),
    /// QoS control (get response, set request and response)
    QosControl(QosControl),
    /// Get QoS Status response
    QosStatus(QosStatus),
    /// Get QoS Allocated BW request
    GetQosAllocRequest(GetQosAllocRequest),
    /// QoS allocated bandwidth
    QosAlloc(QosAlloc),
    /// Get QoS BW Limit request
    GetQosLimitRequest(GetQosLimitRequest),
    /// QoS bandwidth limit
    QosLimit(QosLimit),

    // Information and Status
    /// Identify response
    Identify(Identify),
    /// Response message limit
    MessageLimit(MessageLimit),
    /// Background Operation Status response
    BackgroundStatus(BackgroundStatus),
}

impl Payload {
    /// Kind of this payload
    #[must_use]
    pub const fn kind(&self) -> Kind {
        match self {
            Self::Empty => Kind::Empty,
            Self::Header(_) => Kind::Header,
            Self::SwitchIdentity(_) => Kind::SwitchIdentity,
            Self::PortStateRequest(_) => Kind::PortStateRequest,
            Self::PortInfo(_) => Kind::PortInfo,
            Self::PortStateResponse(_) => Kind::PortStateResponse,
            Self::PortControl(_) => Kind::PortControl,
            Self::PpbConfigRequest(_) => Kind::PpbConfigRequest,
            Self::PpbConfigResponse(_) => Kind::PpbConfigResponse,
            Self::VcsInfoRequest(_) => Kind::VcsInfoRequest,
            Self::PpbStatusBlock(_) => Kind::PpbStatusBlock,
            Self::VcsInfoBlock(_) => Kind::VcsInfoBlock,
            Self::VcsInfoResponse(_) => Kind::VcsInfoResponse,
            Self::BindVppb(_) => Kind::BindVppb,
            Self::UnbindVppb(_) => Kind::UnbindVppb,
            Self::GenerateAer(_) => Kind::GenerateAer,
            Self::TunnelRequest(_) => Kind::TunnelRequest,
            Self::TunnelResponse(_) => Kind::TunnelResponse,
            Self::LdConfigRequest(_) => Kind::LdConfigRequest,
            Self::LdConfigResponse(_) => Kind::LdConfigResponse,
            Self::LdMemoryRequest(_) => Kind::LdMemoryRequest,
            Self::LdMemoryResponse(_) => Kind::LdMemoryResponse,
            Self::LdInfo(_) => Kind::LdInfo,
            Self::LdAllocBlock(_) => Kind::LdAllocBlock,
            Self::GetLdAllocRequest(_) => Kind::GetLdAllocRequest,
            Self::GetLdAllocResponse(_) => Kind::GetLdAllocResponse,
            Self::SetLdAllocRequest(_) => Kind::SetLdAllocRequest,
            Self::SetLdAllocResponse(_) => Kind::SetLdAllocResponse,
            Self::QosControl(_) => Kind::QosControl,
            Self::QosStatus(_) => Kind::QosStatus,
            Self::GetQosAllocRequest(_) => Kind::GetQosAllocRequest,
            Self::QosAlloc(_) => Kind::QosAlloc,
            Self::GetQosLimitRequest(_) => Kind::GetQosLimitRequest,
            Self::QosLimit(_) => Kind::QosLimit,
            Self::Identify(_) => Kind::Identify,
            Self::MessageLimit(_) => Kind::MessageLimit,
            Self::BackgroundStatus(_) => Kind::BackgroundStatus,
        }
    }

    /// Whether this payload carries no bytes
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Serialized length in bytes
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Header(_) => Header::SIZE,
            Self::SwitchIdentity(inner) => inner.encoded_len(),
            Self::PortStateRequest(inner) => inner.encoded_len(),
            Self::PortInfo(inner) => inner.encoded_len(),
            Self::PortStateResponse(inner) => inner.encoded_len(),
            Self::PortControl(inner) => inner.encoded_len(),
            Self::PpbConfigRequest(inner) => inner.encoded_len(),
            Self::PpbConfigResponse(inner) => inner.encoded_len(),
            Self::VcsInfoRequest(inner) => inner.encoded_len(),
            Self::PpbStatusBlock(inner) => inner.encoded_len(),
            Self::VcsInfoBlock(inner) => inner.encoded_len(),
            Self::VcsInfoResponse(inner) => inner.encoded_len(),
            Self::BindVppb(inner) => inner.encoded_len(),
            Self::UnbindVppb(inner) => inner.encoded_len(),
            Self::GenerateAer(inner) => inner.encoded_len(),
            Self::TunnelRequest(inner) => inner.encoded_len(),
            Self::TunnelResponse(inner) => inner.encoded_len(),
            Self::LdConfigRequest(inner) => inner.encoded_len(),
            Self::LdConfigResponse(inner) => inner.encoded_len(),
            Self::LdMemoryRequest(inner) => inner.encoded_len(),
            Self::LdMemoryResponse(inner) => inner.encoded_len(),
            Self::LdInfo(inner) => inner.encoded_len(),
            Self::LdAllocBlock(inner) => inner.encoded_len(),
            Self::GetLdAllocRequest(inner) => inner.encoded_len(),
            Self::GetLdAllocResponse(inner) => inner.encoded_len(),
            Self::SetLdAllocRequest(inner) => inner.encoded_len(),
            Self::SetLdAllocResponse(inner) => inner.encoded_len(),
            Self::QosControl(inner) => inner.encoded_len(),
            Self::QosStatus(inner) => inner.encoded_len(),
            Self::GetQosAllocRequest(inner) => inner.encoded_len(),
            Self::QosAlloc(inner) => inner.encoded_len(),
            Self::GetQosLimitRequest(inner) => inner.encoded_len(),
            Self::QosLimit(inner) => inner.encoded_len(),
            Self::Identify(inner) => inner.encoded_len(),
            Self::MessageLimit(inner) => inner.encoded_len(),
            Self::BackgroundStatus(inner) => inner.encoded_len(),
        }
    }

    /// Serialize into `dst`, returning the number of bytes produced
    ///
    /// The whole object is validated and staged before anything reaches
    /// `dst`, so on error `dst` is untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::ValueOutOfRange`] if a field does not fit its
    /// wire width, or [`ProtocolError::CapacityExceeded`] if a blob is longer
    /// than the protocol allows.
    pub fn encode(&self, dst: &mut impl BufMut) -> Result<usize> {
        let staged = self.to_bytes()?;
        dst.put_slice(&staged);
        Ok(staged.len())
    }

    /// Serialize into a new buffer
    ///
    /// # Errors
    ///
    /// See [`Payload::encode`].
    pub fn to_bytes(&self) -> Result<Bytes> {
        let mut staged = BytesMut::with_capacity(self.encoded_len());
        self.encode_object(&mut staged)?;
        debug_assert_eq!(staged.len(), self.encoded_len());
        Ok(staged.freeze())
    }

    fn encode_object(&self, dst: &mut BytesMut) -> Result<()> {
        match self {
            Self::Empty => Ok(()),
            Self::Header(inner) => inner.encode(dst),
            Self::SwitchIdentity(inner) => inner.encode(dst),
            Self::PortStateRequest(inner) => inner.encode(dst),
            Self::PortInfo(inner) => inner.encode(dst),
            Self::PortStateResponse(inner) => inner.encode(dst),
            Self::PortControl(inner) => inner.encode(dst),
            Self::PpbConfigRequest(inner) => inner.encode(dst),
            Self::PpbConfigResponse(inner) => inner.encode(dst),
            Self::VcsInfoRequest(inner) => inner.encode(dst),
            Self::PpbStatusBlock(inner) => inner.encode(dst),
            Self::VcsInfoBlock(inner) => inner.encode(dst),
            Self::VcsInfoResponse(inner) => inner.encode(dst),
            Self::BindVppb(inner) => inner.encode(dst),
            Self::UnbindVppb(inner) => inner.encode(dst),
            Self::GenerateAer(inner) => inner.encode(dst),
            Self::TunnelRequest(inner) => inner.encode(dst),
            Self::TunnelResponse(inner) => inner.encode(dst),
            Self::LdConfigRequest(inner) => inner.encode(dst),
            Self::LdConfigResponse(inner) => inner.encode(dst),
            Self::LdMemoryRequest(inner) => inner.encode(dst),
            Self::LdMemoryResponse(inner) => inner.encode(dst),
            Self::LdInfo(inner) => inner.encode(dst),
            Self::LdAllocBlock(inner) => inner.encode(dst),
            Self::GetLdAllocRequest(inner) => inner.encode(dst),
            Self::GetLdAllocResponse(inner) => inner.encode(dst),
            Self::SetLdAllocRequest(inner) => inner.encode(dst),
            Self::SetLdAllocResponse(inner) => inner.encode(dst),
            Self::QosControl(inner) => inner.encode(dst),
            Self::QosStatus(inner) => inner.encode(dst),
            Self::GetQosAllocRequest(inner) => inner.encode(dst),
            Self::QosAlloc(inner) => inner.encode(dst),
            Self::GetQosLimitRequest(inner) => inner.encode(dst),
            Self::QosLimit(inner) => inner.encode(dst),
            Self::Identify(inner) => inner.encode(dst),
            Self::MessageLimit(inner) => inner.encode(dst),
            Self::BackgroundStatus(inner) => inner.encode(dst),
        }
    }

    /// Decode a payload of `kind` from the front of `src`
    ///
    /// Returns the payload and the number of bytes consumed. Bytes past the
    /// object are left alone. `context` is the originating request and is
    /// only consulted for [`Kind::VcsInfoBlock`] and
    /// [`Kind::VcsInfoResponse`].
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::MissingContext`] if a VCS info kind is decoded
    ///   without a [`Payload::VcsInfoRequest`] context
    /// - [`ProtocolError::Truncated`] if `src` is shorter than the layout
    /// - [`ProtocolError::CapacityExceeded`] if a count exceeds its list bound
    /// - [`ProtocolError::InvalidLength`] for a tunnel length field of zero
    pub fn decode(kind: Kind, src: &[u8], context: Option<&Payload>) -> Result<(Self, usize)> {
        let mut r = Reader::new(src, kind);

        let payload = match kind {
            Kind::Empty => Self::Empty,
            Kind::Header => Self::Header(Header::decode(r.take(Header::SIZE)?)?),
            Kind::SwitchIdentity => Self::SwitchIdentity(SwitchIdentity::decode(&mut r)?),
            Kind::PortStateRequest => Self::PortStateRequest(PortStateRequest::decode(&mut r)?),
            Kind::PortInfo => Self::PortInfo(PortInfo::decode(&mut r)?),
            Kind::PortStateResponse => Self::PortStateResponse(PortStateResponse::decode(&mut r)?),
            Kind::PortControl => Self::PortControl(PortControl::decode(&mut r)?),
            Kind::PpbConfigRequest => Self::PpbConfigRequest(PpbConfigRequest::decode(&mut r)?),
            Kind::PpbConfigResponse => Self::PpbConfigResponse(PpbConfigResponse::decode(&mut r)?),
            Kind::VcsInfoRequest => Self::VcsInfoRequest(VcsInfoRequest::decode(&mut r)?),
            Kind::PpbStatusBlock => Self::PpbStatusBlock(PpbStatusBlock::decode(&mut r)?),
            Kind::VcsInfoBlock => {
                Self::VcsInfoBlock(VcsInfoBlock::decode(&mut r, vcs_context(kind, context)?)?)
            },
            Kind::VcsInfoResponse => {
                Self::VcsInfoResponse(VcsInfoResponse::decode(&mut r, vcs_context(kind, context)?)?)
            },
            Kind::BindVppb => Self::BindVppb(BindVppb::decode(&mut r)?),
            Kind::UnbindVppb => Self::UnbindVppb(UnbindVppb::decode(&mut r)?),
            Kind::GenerateAer => Self::GenerateAer(GenerateAer::decode(&mut r)?),
            Kind::TunnelRequest => Self::TunnelRequest(TunnelRequest::decode(&mut r)?),
            Kind::TunnelResponse => Self::TunnelResponse(TunnelResponse::decode(&mut r)?),
            Kind::LdConfigRequest => Self::LdConfigRequest(LdConfigRequest::decode(&mut r)?),
            Kind::LdConfigResponse => Self::LdConfigResponse(LdConfigResponse::decode(&mut r)?),
            Kind::LdMemoryRequest => Self::LdMemoryRequest(LdMemoryRequest::decode(&mut r)?),
            Kind::LdMemoryResponse => Self::LdMemoryResponse(LdMemoryResponse::decode(&mut r)?),
            Kind::LdInfo => Self::LdInfo(LdInfo::decode(&mut r)?),
            Kind::LdAllocBlock => Self::LdAllocBlock(LdAllocBlock::decode(&mut r)?),
            Kind::GetLdAllocRequest => Self::GetLdAllocRequest(GetLdAllocRequest::decode(&mut r)?),
            Kind::GetLdAllocResponse => Self::GetLdAllocResponse(GetLdAllocResponse::decode(&mut r)?),
            Kind::SetLdAllocRequest => Self::SetLdAllocRequest(SetLdAllocRequest::decode(&mut r)?),
            Kind::SetLdAllocResponse => Self::SetLdAllocResponse(SetLdAllocResponse::decode(&mut r)?),
            Kind::QosControl => Self::QosControl(QosControl::decode(&mut r)?),
            Kind::QosStatus => Self::QosStatus(QosStatus::decode(&mut r)?),
            Kind::GetQosAllocRequest => Self::GetQosAllocRequest(GetQosAllocRequest::decode(&mut r)?),
            Kind::QosAlloc => Self::QosAlloc(QosAlloc::decode(&mut r)?),
            Kind::GetQosLimitRequest => Self::GetQosLimitRequest(GetQosLimitRequest::decode(&mut r)?),
            Kind::QosLimit => Self::QosLimit(QosLimit::decode(&mut r)?),
            Kind::Identify => Self::Identify(Identify::decode(&mut r)?),
            Kind::MessageLimit => Self::MessageLimit(MessageLimit::decode(&mut r)?),
            Kind::BackgroundStatus => Self::BackgroundStatus(BackgroundStatus::decode(&mut r)?),
        };

        Ok((payload, r.position()))
    }
}

fn vcs_context(kind: Kind, context: Option<&Payload>) -> Result<&VcsInfoRequest> {
    match context {
        Some(Payload::VcsInfoRequest(request)) => Ok(request),
        _ => Err(ProtocolError::MissingContext { kind }),
    }
}

macro_rules! impl_from_object {
    ($($variant:ident),+ $(,)?) => {
        $(
            impl From<$variant> for Payload {
                fn from(inner: $variant) -> Self {
                    Self::$variant(inner)
                }
            }
        )+
    };
}

impl_from_object!(
    Header,
    SwitchIdentity,
    PortStateRequest,
    PortInfo,
    PortStateResponse,
    PortControl,
    PpbConfigRequest,
    PpbConfigResponse,
    VcsInfoRequest,
    PpbStatusBlock,
    VcsInfoBlock,
    VcsInfoResponse,
    BindVppb,
    UnbindVppb,
    GenerateAer,
    TunnelRequest,
    TunnelResponse,
    LdConfigRequest,
    LdConfigResponse,
    LdMemoryRequest,
    LdMemoryResponse,
    LdInfo,
    LdAllocBlock,
    GetLdAllocRequest,
    GetLdAllocResponse,
    SetLdAllocRequest,
    SetLdAllocResponse,
    QosControl,
    QosStatus,
    GetQosAllocRequest,
    QosAlloc,
    GetQosLimitRequest,
    QosLimit,
    Identify,
    MessageLimit,
    BackgroundStatus,
);
