//! Codec limits.
//!
//! The FM API itself does not bound a message beyond the 21-bit header length,
//! but every transport does (MCTP message assembly buffers, mailbox sizes).
//! [`CodecConfig`] carries those limits into [`Message`](crate::Message)
//! encode and decode.

use serde::{Deserialize, Serialize};

use crate::{
    Header,
    errors::{ProtocolError, Result},
};

/// Limits applied at the message boundary
///
/// Deserialization runs [`CodecConfig::validate`], and so does every
/// [`Message`](crate::Message) encode and decode, so a configuration built as
/// a struct literal cannot lift the limit past the ceiling either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCodecConfig")]
pub struct CodecConfig {
    /// Largest accepted message, header included
    pub max_message_len: usize,

    /// Require a decoded payload to consume exactly the header's `len` bytes
    ///
    /// When disabled, trailing payload bytes the object layout does not cover
    /// are skipped instead of rejected.
    pub strict_payload_len: bool,
}

impl CodecConfig {
    /// Default message limit (8 KiB)
    pub const DEFAULT_MAX_MESSAGE_LEN: usize = 8192;

    /// Ceiling for the message limit (64 KiB)
    pub const MAX_MESSAGE_LEN_CEILING: usize = 65536;

    /// Create a strict configuration with the given message limit
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidConfig`] unless the limit leaves room
    /// for a payload and stays within [`Self::MAX_MESSAGE_LEN_CEILING`].
    pub fn new(max_message_len: usize) -> Result<Self> {
        let config = Self { max_message_len, ..Self::default() };
        config.validate()?;
        Ok(config)
    }

    /// Check the limits for consistency
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidConfig`] describing the first problem.
    pub fn validate(&self) -> Result<()> {
        if self.max_message_len <= Header::SIZE {
            return Err(ProtocolError::InvalidConfig(format!(
                "max_message_len {} leaves no room for a payload",
                self.max_message_len
            )));
        }

        if self.max_message_len > Self::MAX_MESSAGE_LEN_CEILING {
            return Err(ProtocolError::InvalidConfig(format!(
                "max_message_len {} exceeds ceiling {}",
                self.max_message_len,
                Self::MAX_MESSAGE_LEN_CEILING
            )));
        }

        Ok(())
    }

    /// Largest payload that fits the message limit
    #[must_use]
    pub const fn max_payload_len(&self) -> usize {
        self.max_message_len.saturating_sub(Header::SIZE)
    }

    /// Largest payload of a message embedded in a tunnel request
    ///
    /// The tunnel envelope costs its own header, the 5-byte tunnel prefix and
    /// the inner header.
    #[must_use]
    pub const fn max_tunnel_payload_len(&self) -> usize {
        self.max_payload_len().saturating_sub(5 + Header::SIZE)
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self { max_message_len: Self::DEFAULT_MAX_MESSAGE_LEN, strict_payload_len: true }
    }
}

/// Unvalidated form of [`CodecConfig`] as it appears in configuration files
#[derive(Deserialize)]
#[serde(default)]
struct RawCodecConfig {
    max_message_len: usize,
    strict_payload_len: bool,
}

impl Default for RawCodecConfig {
    fn default() -> Self {
        let CodecConfig { max_message_len, strict_payload_len } = CodecConfig::default();
        Self { max_message_len, strict_payload_len }
    }
}

impl TryFrom<RawCodecConfig> for CodecConfig {
    type Error = ProtocolError;

    fn try_from(raw: RawCodecConfig) -> Result<Self> {
        let config = Self { max_message_len: raw.max_message_len, strict_payload_len: raw.strict_payload_len };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits() {
        let config = CodecConfig::default();
        assert_eq!(config.max_message_len, 8192);
        assert!(config.strict_payload_len);
        assert_eq!(config.max_payload_len(), 8180);
        assert_eq!(config.max_tunnel_payload_len(), 8163);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_limits_without_payload_room() {
        assert!(matches!(CodecConfig::new(12), Err(ProtocolError::InvalidConfig(_))));
        assert!(matches!(CodecConfig::new(0), Err(ProtocolError::InvalidConfig(_))));
        assert!(CodecConfig::new(13).is_ok());
    }

    #[test]
    fn rejects_limits_above_ceiling() {
        assert!(CodecConfig::new(65536).is_ok());
        assert!(matches!(CodecConfig::new(65537), Err(ProtocolError::InvalidConfig(_))));
    }

    #[test]
    fn tunnel_payload_saturates() {
        let config = CodecConfig::new(20).unwrap();
        assert_eq!(config.max_payload_len(), 8);
        assert_eq!(config.max_tunnel_payload_len(), 0);
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: CodecConfig = serde_json::from_str(r#"{"max_message_len": 4096}"#).unwrap();
        assert_eq!(config.max_message_len, 4096);
        assert!(config.strict_payload_len);
    }

    #[test]
    fn deserialization_validates_limits() {
        let over = serde_json::from_str::<CodecConfig>(r#"{"max_message_len": 4000000}"#);
        assert!(over.unwrap_err().to_string().contains("exceeds ceiling 65536"));

        let under = serde_json::from_str::<CodecConfig>(r#"{"max_message_len": 12}"#);
        assert!(under.is_err());

        let lenient: CodecConfig = serde_json::from_str(r#"{"strict_payload_len": false}"#).unwrap();
        assert_eq!(lenient, CodecConfig { strict_payload_len: false, ..CodecConfig::default() });
    }
}
