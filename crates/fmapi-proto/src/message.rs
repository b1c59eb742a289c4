//! Message type combining header and payload.
//!
//! A [`Message`] is one complete FM API transfer:
//! `[Header: 12 bytes] + [payload: header.len bytes]`.
//!
//! Unlike the object codec, which needs the caller to name a [`Kind`], a
//! message carries enough in its header (opcode and category) to pick the
//! payload kind itself.

use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::{
    CodecConfig, Header, Kind, Payload,
    errors::{ProtocolError, Result},
};

/// Complete FM API message
///
/// # Invariants
///
/// - **Length Consistency**: the `len` written on the wire always equals the
///   encoded payload length. [`Message::new`] sets it and [`Message::encode`]
///   recomputes it, so a stale `header.len` never reaches the wire.
///
/// - **Size Limit**: an encoded message never exceeds
///   [`CodecConfig::max_message_len`]. Violations are rejected by both
///   [`Message::encode`] and [`Message::decode`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Message header
    pub header: Header,

    /// Decoded payload
    pub payload: Payload,
}

impl Message {
    /// Create a message, setting `header.len` from the payload
    #[must_use]
    pub fn new(mut header: Header, payload: impl Into<Payload>) -> Self {
        let payload = payload.into();
        header.len = u32::try_from(payload.encoded_len()).unwrap_or(u32::MAX);
        Self { header, payload }
    }

    /// Kind of the payload
    #[must_use]
    pub const fn kind(&self) -> Kind {
        self.payload.kind()
    }

    /// Encoded length, header included
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        Header::SIZE + self.payload.encoded_len()
    }

    /// Encode the message into `dst`, returning the number of bytes written
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::MessageTooLarge`] if the message exceeds
    ///   `config.max_message_len`
    /// - [`ProtocolError::ValueOutOfRange`] if a header or payload field does
    ///   not fit its wire width
    /// - [`ProtocolError::CapacityExceeded`] if a payload blob is oversized
    ///
    /// - [`ProtocolError::InvalidConfig`] if `config` fails validation
    ///
    /// Nothing is written to `dst` on error.
    pub fn encode(&self, dst: &mut impl BufMut, config: &CodecConfig) -> Result<usize> {
        config.validate()?;
        let payload = self.payload.to_bytes()?;

        let size = Header::SIZE + payload.len();
        if size > config.max_message_len {
            return Err(ProtocolError::MessageTooLarge { size, max: config.max_message_len });
        }

        let mut header = self.header;
        header.len = u32::try_from(payload.len()).unwrap_or(u32::MAX);
        let header = header.to_bytes()?;

        dst.put_slice(&header);
        dst.put_slice(&payload);

        tracing::trace!(
            opcode = self.header.opcode,
            kind = ?self.payload.kind(),
            len = payload.len(),
            "encoded message"
        );

        Ok(size)
    }

    /// Encode the message into a new buffer
    ///
    /// # Errors
    ///
    /// See [`Message::encode`].
    pub fn to_bytes(&self, config: &CodecConfig) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode(&mut buf, config)?;
        Ok(buf.freeze())
    }

    /// Decode a message from the front of `src`
    ///
    /// Returns the message and the number of bytes it occupied
    /// (`12 + header.len`). Bytes after the message are left alone.
    /// `context` is the originating request, needed only when the message is
    /// a Get Virtual CXL Switch Info response.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::Truncated`] if `src` is shorter than a header
    /// - [`ProtocolError::InvalidCategory`] if the category is neither
    ///   request nor response
    /// - [`ProtocolError::MessageTooLarge`] if the header announces more than
    ///   `config.max_message_len`
    /// - [`ProtocolError::PayloadTruncated`] if `src` ends before `header.len`
    ///   payload bytes
    /// - [`ProtocolError::PayloadSizeMismatch`] if the payload does not
    ///   consume exactly `header.len` bytes and the configuration is strict
    /// - [`ProtocolError::InvalidConfig`] if `config` fails validation
    /// - any error of [`Payload::decode`]
    pub fn decode(src: &[u8], context: Option<&Payload>, config: &CodecConfig) -> Result<(Self, usize)> {
        decode_message(src, context, config).inspect_err(|e| {
            tracing::debug!(error = %e, available = src.len(), "failed to decode message");
        })
    }
}

fn decode_message(src: &[u8], context: Option<&Payload>, config: &CodecConfig) -> Result<(Message, usize)> {
    config.validate()?;
    let header = Header::decode(src)?;
    let direction = header.direction().ok_or(ProtocolError::InvalidCategory(header.category))?;

    let size = header.message_len();
    if size > config.max_message_len {
        return Err(ProtocolError::MessageTooLarge { size, max: config.max_message_len });
    }

    let available = src.len() - Header::SIZE;
    let expected = size - Header::SIZE;
    if expected > available {
        return Err(ProtocolError::PayloadTruncated { expected, actual: available });
    }

    let kind = crate::kind_for(header.opcode, direction);
    let (payload, consumed) = Payload::decode(kind, &src[Header::SIZE..size], context)?;
    if config.strict_payload_len && consumed != expected {
        return Err(ProtocolError::PayloadSizeMismatch { header: expected, actual: consumed });
    }

    tracing::trace!(opcode = header.opcode, ?direction, ?kind, len = expected, "decoded message");

    Ok((Message { header, payload }, size))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::{
        Direction, Opcode,
        payloads::{BindVppb, GetLdAllocResponse, LdAllocBlock, MessageLimit, PortControl, VcsInfoRequest},
    };

    fn strict() -> CodecConfig {
        CodecConfig::default()
    }

    fn lenient() -> CodecConfig {
        CodecConfig { strict_payload_len: false, ..CodecConfig::default() }
    }

    proptest! {
        #[test]
        fn message_round_trip(
            tag in any::<u8>(),
            vcsid in any::<u8>(),
            vppbid in any::<u8>(),
            ppid in any::<u8>(),
            ldid in any::<u16>(),
        ) {
            let message = Message::new(
                Header::request(Opcode::BindVppb.to_u16(), tag),
                BindVppb { vcsid, vppbid, ppid, ldid },
            );

            let wire = message.to_bytes(&strict()).expect("should encode");
            let (parsed, consumed) = Message::decode(&wire, None, &strict()).expect("should decode");
            prop_assert_eq!(consumed, wire.len());
            prop_assert_eq!(parsed, message);
        }

        #[test]
        fn decode_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
            if let Ok((_, consumed)) = Message::decode(&bytes, None, &lenient()) {
                prop_assert!(consumed <= bytes.len());
            }
        }
    }

    #[test]
    fn new_sets_len() {
        let message = Message::new(Header::new(Opcode::BindVppb), BindVppb::default());
        assert_eq!(message.header.len, 6);
        assert_eq!(message.encoded_len(), 18);
    }

    #[test]
    fn encode_recomputes_stale_len() {
        let mut message = Message::new(Header::new(Opcode::PortControl), PortControl { ppid: 4, action: 2 });
        message.header.len = 99;

        let wire = message.to_bytes(&strict()).unwrap();
        assert_eq!(wire.len(), 14);
        assert_eq!(Header::decode(&wire).unwrap().len, 2);
    }

    #[test]
    fn response_kind_follows_category() {
        let request = Message::new(Header::new(Opcode::SetMessageLimit), MessageLimit { limit: 10 });
        let response = Message::new(
            Header::response(Opcode::SetMessageLimit.to_u16(), 0, 0),
            MessageLimit { limit: 9 },
        );

        for message in [request, response] {
            let wire = message.to_bytes(&strict()).unwrap();
            let (parsed, _) = Message::decode(&wire, None, &strict()).unwrap();
            assert_eq!(parsed.kind(), Kind::MessageLimit);
            assert_eq!(parsed, message);
        }
    }

    #[test]
    fn vcs_info_response_needs_context() {
        let request = Payload::VcsInfoRequest(VcsInfoRequest::default());
        let mut wire = Header::response(Opcode::GetVcsInfo.to_u16(), 0, 0).to_bytes().unwrap().to_vec();
        wire[5] = 4;
        wire.extend_from_slice(&[0, 0, 0, 0]);

        assert_eq!(
            Message::decode(&wire, None, &strict()),
            Err(ProtocolError::MissingContext { kind: Kind::VcsInfoResponse })
        );
        let (message, _) = Message::decode(&wire, Some(&request), &strict()).unwrap();
        assert_eq!(message.kind(), Kind::VcsInfoResponse);
        assert_eq!(message.header.direction(), Some(Direction::Response));
    }

    #[test]
    fn rejects_unknown_category() {
        let mut wire = Header::new(Opcode::Identify).to_bytes().unwrap();
        wire[0] = 0x20;

        assert_eq!(Message::decode(&wire, None, &strict()), Err(ProtocolError::InvalidCategory(2)));
    }

    #[test]
    fn rejects_truncated_header() {
        assert_eq!(
            Message::decode(&[0u8; 11], None, &strict()),
            Err(ProtocolError::Truncated { kind: Kind::Header, needed: 12, available: 11 })
        );
    }

    #[test]
    fn rejects_truncated_payload() {
        let message = Message::new(Header::new(Opcode::BindVppb), BindVppb::default());
        let wire = message.to_bytes(&strict()).unwrap();

        assert_eq!(
            Message::decode(&wire[..15], None, &strict()),
            Err(ProtocolError::PayloadTruncated { expected: 6, actual: 3 })
        );
    }

    #[test]
    fn trailing_bytes_after_message_are_left_alone() {
        let message = Message::new(Header::new(Opcode::BindVppb), BindVppb { vcsid: 1, ..Default::default() });
        let mut wire = message.to_bytes(&strict()).unwrap().to_vec();
        wire.extend_from_slice(&[0xEE; 5]);

        let (parsed, consumed) = Message::decode(&wire, None, &strict()).unwrap();
        assert_eq!(consumed, 18);
        assert_eq!(parsed, message);
    }

    #[test]
    fn payload_must_fill_len_when_strict() {
        // Bind vPPB with two extra payload bytes counted in len
        let mut header = Header::new(Opcode::BindVppb);
        header.len = 8;
        let mut wire = header.to_bytes().unwrap().to_vec();
        wire.extend_from_slice(&[1, 2, 3, 0, 4, 5, 0xAA, 0xBB]);

        assert_eq!(
            Message::decode(&wire, None, &strict()),
            Err(ProtocolError::PayloadSizeMismatch { header: 8, actual: 6 })
        );

        let (message, consumed) = Message::decode(&wire, None, &lenient()).unwrap();
        assert_eq!(consumed, 20);
        assert_eq!(message.payload, Payload::BindVppb(BindVppb { vcsid: 1, vppbid: 2, ppid: 3, ldid: 0x0504 }));
    }

    #[test]
    fn unknown_opcode_carries_empty_payload() {
        let header = Header::request(0xFFFF, 7);
        let wire = header.to_bytes().unwrap();

        let (message, consumed) = Message::decode(&wire, None, &strict()).unwrap();
        assert_eq!(consumed, 12);
        assert_eq!(message.payload, Payload::Empty);
        assert_eq!(message.header.opcode_enum(), None);
    }

    #[test]
    fn size_limit_applies_both_ways() {
        let config = CodecConfig::new(64).unwrap();
        let blocks = (0..4u64).map(|i| LdAllocBlock { range1: i, range2: i }).collect();
        let message = Message::new(
            Header::response(Opcode::GetLdAlloc.to_u16(), 0, 0),
            GetLdAllocResponse { total: 4, granularity: 0, start: 0, blocks },
        );
        assert_eq!(message.encoded_len(), 80);

        let mut dst = Vec::new();
        assert_eq!(
            message.encode(&mut dst, &config),
            Err(ProtocolError::MessageTooLarge { size: 80, max: 64 })
        );
        assert!(dst.is_empty());

        let wire = message.to_bytes(&strict()).unwrap();
        assert_eq!(
            Message::decode(&wire, None, &config),
            Err(ProtocolError::MessageTooLarge { size: 80, max: 64 })
        );
    }

    #[test]
    fn unvalidated_config_is_rejected() {
        let oversized = CodecConfig { max_message_len: 4_000_000, ..CodecConfig::default() };
        let message = Message::new(Header::new(Opcode::BindVppb), BindVppb::default());

        let mut dst = Vec::new();
        assert!(matches!(message.encode(&mut dst, &oversized), Err(ProtocolError::InvalidConfig(_))));
        assert!(dst.is_empty());

        // Header announcing the largest 21-bit payload
        let mut header = Header::new(Opcode::BindVppb);
        header.len = Header::MAX_LEN;
        let wire = header.to_bytes().unwrap();
        assert!(matches!(Message::decode(&wire, None, &oversized), Err(ProtocolError::InvalidConfig(_))));

        let empty = CodecConfig { max_message_len: 0, ..CodecConfig::default() };
        assert!(matches!(Message::decode(&wire, None, &empty), Err(ProtocolError::InvalidConfig(_))));
    }
}
