//! Information and Status command set payloads.
//!
//! These commands are implemented by every FM API endpoint, switch or MLD,
//! and describe the component itself rather than the fabric.

use bytes::BufMut;
use serde::{Deserialize, Serialize};

use super::{Decode, WireObject};
use crate::{Kind, errors::Result, wire::Reader, wire::check_width};

/// Identify response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identify {
    /// PCIe vendor ID
    pub vid: u16,
    /// PCIe device ID
    pub did: u16,
    /// PCIe subsystem vendor ID
    pub svid: u16,
    /// PCIe subsystem ID
    pub ssid: u16,
    /// Device serial number
    pub serial: u64,
    /// Maximum supported message size, as a power of two
    pub max_msg_size_exp: u8,
}

impl WireObject for Identify {
    const KIND: Kind = Kind::Identify;

    fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        dst.put_u16_le(self.vid);
        dst.put_u16_le(self.did);
        dst.put_u16_le(self.svid);
        dst.put_u16_le(self.ssid);
        dst.put_u64_le(self.serial);
        dst.put_u8(self.max_msg_size_exp);
        Ok(())
    }
}

impl Decode for Identify {
    fn decode(r: &mut Reader<'_>) -> Result<Self> {
        Ok(Self {
            vid: r.u16()?,
            did: r.u16()?,
            svid: r.u16()?,
            ssid: r.u16()?,
            serial: r.u64()?,
            max_msg_size_exp: r.u8()?,
        })
    }
}

/// Response message limit, carried by both get and set
///
/// The limit is the exponent `n` of a `2^n` byte response ceiling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageLimit {
    /// Limit exponent
    pub limit: u8,
}

impl WireObject for MessageLimit {
    const KIND: Kind = Kind::MessageLimit;

    fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        dst.put_u8(self.limit);
        Ok(())
    }
}

impl Decode for MessageLimit {
    fn decode(r: &mut Reader<'_>) -> Result<Self> {
        Ok(Self { limit: r.u8()? })
    }
}

/// Background operation status response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BackgroundStatus {
    /// A background operation is running
    pub running: bool,
    /// Percent complete (7 bits)
    pub percent: u8,
    /// Opcode of the background command
    pub opcode: u16,
    /// Return code of the background command
    pub return_code: u16,
    /// Vendor specific extended status
    pub ext_status: u16,
}

impl BackgroundStatus {
    /// Largest value of the 7-bit percent field
    pub const MAX_PERCENT: u8 = 0x7F;
}

impl WireObject for BackgroundStatus {
    const KIND: Kind = Kind::BackgroundStatus;

    fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        check_width("background_status.percent", u64::from(self.percent), u64::from(Self::MAX_PERCENT))?;

        dst.put_u8((self.percent << 1) | u8::from(self.running));
        dst.put_u8(0);
        dst.put_u16_le(self.opcode);
        dst.put_u16_le(self.return_code);
        dst.put_u16_le(self.ext_status);
        Ok(())
    }
}

impl Decode for BackgroundStatus {
    fn decode(r: &mut Reader<'_>) -> Result<Self> {
        let packed = r.u8()?;
        r.skip(1)?;

        Ok(Self {
            running: packed & 0x01 != 0,
            percent: packed >> 1,
            opcode: r.u16()?,
            return_code: r.u16()?,
            ext_status: r.u16()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProtocolError;

    fn encode(obj: &impl WireObject) -> Vec<u8> {
        let mut buf = Vec::new();
        obj.encode(&mut buf).unwrap();
        buf
    }

    #[test]
    fn identify_layout() {
        let id = Identify {
            vid: 0x1AB4,
            did: 0x0002,
            svid: 0x1AB4,
            ssid: 0x0010,
            serial: 0x0102_0304_0506_0708,
            max_msg_size_exp: 13,
        };
        let bytes = encode(&id);

        assert_eq!(bytes.len(), Kind::Identify.fixed_len());
        assert_eq!(&bytes[0..4], &[0xB4, 0x1A, 0x02, 0x00]);
        assert_eq!(&bytes[8..16], &[0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]);
        assert_eq!(bytes[16], 13);

        let mut r = Reader::new(&bytes, Kind::Identify);
        assert_eq!(Identify::decode(&mut r).unwrap(), id);
        assert_eq!(r.position(), 17);
    }

    #[test]
    fn background_status_packs_percent_and_running() {
        let bos = BackgroundStatus {
            running: true,
            percent: 0x7F,
            opcode: 0x5402,
            return_code: 0x0001,
            ext_status: 0xBEEF,
        };
        let bytes = encode(&bos);

        assert_eq!(bytes, [0xFF, 0x00, 0x02, 0x54, 0x01, 0x00, 0xEF, 0xBE]);
        assert_eq!(BackgroundStatus::decode(&mut Reader::new(&bytes, Kind::BackgroundStatus)).unwrap(), bos);
    }

    #[test]
    fn background_status_rejects_wide_percent() {
        let bos = BackgroundStatus { percent: 0x80, ..BackgroundStatus::default() };
        let mut buf = Vec::new();
        assert_eq!(
            bos.encode(&mut buf),
            Err(ProtocolError::ValueOutOfRange { field: "background_status.percent", value: 0x80, max: 0x7F })
        );
    }

    #[test]
    fn message_limit_truncated() {
        let mut r = Reader::new(&[], Kind::MessageLimit);
        assert_eq!(
            MessageLimit::decode(&mut r),
            Err(ProtocolError::Truncated { kind: Kind::MessageLimit, needed: 1, available: 0 })
        );
    }
}
