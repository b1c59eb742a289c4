//! Little-endian wire primitives.
//!
//! Decoding goes through [`Reader`], which checks bounds on every read and
//! attributes a short buffer to the object being decoded. Encoding writes
//! straight into a [`bytes::BufMut`]; the helpers here only validate that a
//! value fits the wire field before it is packed.

use bytes::Bytes;

use crate::{
    Kind,
    errors::{ProtocolError, Result},
};

/// Bounds-checked cursor over a payload
#[derive(Debug)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
    kind: Kind,
}

impl<'a> Reader<'a> {
    /// Start reading an object of `kind` from the front of `buf`
    #[must_use]
    pub const fn new(buf: &'a [u8], kind: Kind) -> Self {
        Self { buf, pos: 0, kind }
    }

    /// Kind a truncation is currently attributed to
    #[must_use]
    pub const fn kind(&self) -> Kind {
        self.kind
    }

    /// Bytes consumed so far
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Decode a nested object, attributing truncation to `kind`
    ///
    /// # Errors
    ///
    /// Propagates whatever `f` returns.
    pub fn scoped<T>(&mut self, kind: Kind, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let outer = std::mem::replace(&mut self.kind, kind);
        let result = f(self);
        self.kind = outer;
        result
    }

    /// Borrow the next `n` bytes
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Truncated`] if fewer than `n` bytes remain.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let available = self.remaining();
        if n > available {
            return Err(ProtocolError::Truncated { kind: self.kind, needed: n, available });
        }

        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Skip reserved bytes
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Truncated`] if fewer than `n` bytes remain.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.take(n).map(|_| ())
    }

    /// Read a fixed-size byte array
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Truncated`] if fewer than `N` bytes remain.
    pub fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Read `n` bytes into an owned buffer
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Truncated`] if fewer than `n` bytes remain.
    pub fn bytes(&mut self, n: usize) -> Result<Bytes> {
        self.take(n).map(Bytes::copy_from_slice)
    }

    /// Read a byte
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Truncated`] at the end of the buffer.
    pub fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    /// Read a little-endian `u16`
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Truncated`] if fewer than 2 bytes remain.
    pub fn u16(&mut self) -> Result<u16> {
        self.array().map(u16::from_le_bytes)
    }

    /// Read a little-endian `u32`
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Truncated`] if fewer than 4 bytes remain.
    pub fn u32(&mut self) -> Result<u32> {
        self.array().map(u32::from_le_bytes)
    }

    /// Read a little-endian `u64`
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Truncated`] if fewer than 8 bytes remain.
    pub fn u64(&mut self) -> Result<u64> {
        self.array().map(u64::from_le_bytes)
    }
}

/// Check that `value` fits a field whose largest value is `max`
///
/// # Errors
///
/// Returns [`ProtocolError::ValueOutOfRange`] naming `field`.
pub const fn check_width(field: &'static str, value: u64, max: u64) -> Result<()> {
    if value > max {
        return Err(ProtocolError::ValueOutOfRange { field, value, max });
    }
    Ok(())
}

/// Check that a list of `len` entries fits behind an 8-bit count
///
/// # Errors
///
/// Returns [`ProtocolError::ValueOutOfRange`] if `len` exceeds 255.
pub fn count_u8(field: &'static str, len: usize) -> Result<u8> {
    u8::try_from(len).map_err(|_| ProtocolError::ValueOutOfRange {
        field,
        value: len as u64,
        max: u64::from(u8::MAX),
    })
}

/// Check that a blob of `len` bytes fits behind a 16-bit length
///
/// # Errors
///
/// Returns [`ProtocolError::ValueOutOfRange`] if `len` exceeds 65535.
pub fn len_u16(field: &'static str, len: usize) -> Result<u16> {
    u16::try_from(len).map_err(|_| ProtocolError::ValueOutOfRange {
        field,
        value: len as u64,
        max: u64::from(u16::MAX),
    })
}

/// Check a list or blob against its protocol capacity
///
/// # Errors
///
/// Returns [`ProtocolError::CapacityExceeded`] if `len` exceeds `max`.
pub const fn check_capacity(what: &'static str, len: usize, max: usize) -> Result<()> {
    if len > max {
        return Err(ProtocolError::CapacityExceeded { what, len, max });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian() {
        let buf = [0x01, 0x34, 0x12, 0x78, 0x56, 0x34, 0x12, 0xEF, 0xCD, 0xAB, 0x89, 0x67, 0x45, 0x23, 0x01];
        let mut r = Reader::new(&buf, Kind::Identify);

        assert_eq!(r.u8().unwrap(), 0x01);
        assert_eq!(r.u16().unwrap(), 0x1234);
        assert_eq!(r.u32().unwrap(), 0x1234_5678);
        assert_eq!(r.u64().unwrap(), 0x0123_4567_89AB_CDEF);
        assert_eq!(r.position(), 15);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn truncation_names_the_kind() {
        let mut r = Reader::new(&[0xAA, 0xBB, 0xCC], Kind::LdInfo);
        r.u8().unwrap();

        assert_eq!(r.u32(), Err(ProtocolError::Truncated { kind: Kind::LdInfo, needed: 4, available: 2 }));
        // Failed read consumes nothing
        assert_eq!(r.position(), 1);
    }

    #[test]
    fn scoped_restores_outer_kind() {
        let mut r = Reader::new(&[0u8; 2], Kind::PortStateResponse);

        let inner = r.scoped(Kind::PortInfo, |r| r.array::<4>());
        assert_eq!(inner, Err(ProtocolError::Truncated { kind: Kind::PortInfo, needed: 4, available: 2 }));
        assert_eq!(r.kind(), Kind::PortStateResponse);
    }

    #[test]
    fn width_checks() {
        assert!(check_width("f", 0x0F, 0x0F).is_ok());
        assert_eq!(
            check_width("f", 0x10, 0x0F),
            Err(ProtocolError::ValueOutOfRange { field: "f", value: 0x10, max: 0x0F })
        );
        assert_eq!(count_u8("n", 255), Ok(255));
        assert!(count_u8("n", 256).is_err());
        assert_eq!(len_u16("l", 65535), Ok(65535));
        assert!(len_u16("l", 65536).is_err());
        assert_eq!(
            check_capacity("lds", 17, 16),
            Err(ProtocolError::CapacityExceeded { what: "lds", len: 17, max: 16 })
        );
    }
}
