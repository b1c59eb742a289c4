//! FM API command opcodes.
//!
//! Opcodes identify the command carried by a message. They are organized into
//! command sets that can be told apart by the opcode value alone:
//!
//! # Opcode Ranges
//!
//! - `0x0001-0x00FF`: Information and Status (identify, background status,
//!   response message limit)
//! - `0x51xx`: Physical Switch (identify switch, port state, port control,
//!   PPB config)
//! - `0x52xx`: Virtual Switch (VCS info, bind, unbind, AER)
//! - `0x53xx`: MLD Port (tunnel, LD config, LD memory)
//! - `0x54xx`: MLD Component (LD info, allocations, QoS), normally reached
//!   through a tunnel

use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

/// FM API command opcodes
///
/// Serialized as a little-endian `u16` at bytes 3-4 of the message header.
/// The header itself carries the raw value so that unknown opcodes survive a
/// decode; use [`Opcode::from_u16`] to classify it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u16)]
pub enum Opcode {
    // Information and Status (0x0001-0x00FF)
    /// Identify component
    Identify = 0x0001,
    /// Background operation status
    BackgroundStatus = 0x0002,
    /// Get response message limit
    GetMessageLimit = 0x0003,
    /// Set response message limit
    SetMessageLimit = 0x0004,

    // Physical Switch (0x51xx)
    /// Identify switch device
    IdentifySwitch = 0x5100,
    /// Get physical port state
    GetPortState = 0x5101,
    /// Physical port control
    PortControl = 0x5102,
    /// Send PPB CXL.io configuration request
    PpbConfig = 0x5103,

    // Virtual Switch (0x52xx)
    /// Get virtual CXL switch info
    GetVcsInfo = 0x5200,
    /// Bind vPPB
    BindVppb = 0x5201,
    /// Unbind vPPB
    UnbindVppb = 0x5202,
    /// Generate AER event
    GenerateAer = 0x5203,

    // MLD Port (0x53xx)
    /// Tunnel management command
    Tunnel = 0x5300,
    /// Send LD CXL.io configuration request
    LdConfig = 0x5301,
    /// Send LD CXL.io memory request
    LdMemory = 0x5302,

    // MLD Component (0x54xx)
    /// Get LD info
    GetLdInfo = 0x5400,
    /// Get LD allocations
    GetLdAlloc = 0x5401,
    /// Set LD allocations
    SetLdAlloc = 0x5402,
    /// Get QoS control
    GetQosControl = 0x5403,
    /// Set QoS control
    SetQosControl = 0x5404,
    /// Get QoS status
    GetQosStatus = 0x5405,
    /// Get QoS allocated bandwidth
    GetQosAlloc = 0x5406,
    /// Set QoS allocated bandwidth
    SetQosAlloc = 0x5407,
    /// Get QoS bandwidth limit
    GetQosLimit = 0x5408,
    /// Set QoS bandwidth limit
    SetQosLimit = 0x5409,
}

impl Opcode {
    /// Convert to raw u16 value
    #[must_use]
    pub const fn to_u16(self) -> u16 {
        self as u16
    }

    /// Convert from raw u16 value
    ///
    /// Returns `None` if the value doesn't correspond to a known opcode.
    #[must_use]
    pub const fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x0001 => Some(Self::Identify),
            0x0002 => Some(Self::BackgroundStatus),
            0x0003 => Some(Self::GetMessageLimit),
            0x0004 => Some(Self::SetMessageLimit),

            0x5100 => Some(Self::IdentifySwitch),
            0x5101 => Some(Self::GetPortState),
            0x5102 => Some(Self::PortControl),
            0x5103 => Some(Self::PpbConfig),

            0x5200 => Some(Self::GetVcsInfo),
            0x5201 => Some(Self::BindVppb),
            0x5202 => Some(Self::UnbindVppb),
            0x5203 => Some(Self::GenerateAer),

            0x5300 => Some(Self::Tunnel),
            0x5301 => Some(Self::LdConfig),
            0x5302 => Some(Self::LdMemory),

            0x5400 => Some(Self::GetLdInfo),
            0x5401 => Some(Self::GetLdAlloc),
            0x5402 => Some(Self::SetLdAlloc),
            0x5403 => Some(Self::GetQosControl),
            0x5404 => Some(Self::SetQosControl),
            0x5405 => Some(Self::GetQosStatus),
            0x5406 => Some(Self::GetQosAlloc),
            0x5407 => Some(Self::SetQosAlloc),
            0x5408 => Some(Self::GetQosLimit),
            0x5409 => Some(Self::SetQosLimit),

            _ => None,
        }
    }

    /// Command set this opcode belongs to
    #[must_use]
    pub const fn command_set(self) -> CommandSet {
        match CommandSet::of(self.to_u16()) {
            Some(set) => set,
            None => unreachable!(),
        }
    }
}

impl From<Opcode> for u16 {
    fn from(opcode: Opcode) -> Self {
        opcode.to_u16()
    }
}

/// Command sets (families) of the FM API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandSet {
    /// Generic component commands (`0x0001-0x00FF`)
    InfoStatus,
    /// Physical switch commands (`0x51xx`)
    PhysicalSwitch,
    /// Virtual switch commands (`0x52xx`)
    VirtualSwitch,
    /// MLD port commands (`0x53xx`)
    MldPort,
    /// MLD component commands (`0x54xx`)
    MldComponent,
}

impl CommandSet {
    /// Classify a raw opcode by its value range
    ///
    /// Low-numbered opcodes form the information and status set; everything
    /// else is classified by the high byte. Returns `None` for ranges the FM
    /// API does not define, including `0x0000`.
    #[must_use]
    pub const fn of(opcode: u16) -> Option<Self> {
        match opcode {
            0x0001..=0x00FF => Some(Self::InfoStatus),
            _ => match opcode >> 8 {
                0x51 => Some(Self::PhysicalSwitch),
                0x52 => Some(Self::VirtualSwitch),
                0x53 => Some(Self::MldPort),
                0x54 => Some(Self::MldComponent),
                _ => None,
            },
        }
    }
}

/// FM API command return codes
///
/// Carried as a raw `u16` in the message header; unknown values decode fine
/// and classify as `None` through [`ReturnCode::from_u16`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u16)]
pub enum ReturnCode {
    /// Command completed
    Success = 0x0000,
    /// Command continues as a background operation
    BackgroundOpStarted = 0x0001,
    /// Input payload was invalid
    InvalidInput = 0x0002,
    /// Command is not supported
    Unsupported = 0x0003,
    /// Internal device error
    InternalError = 0x0004,
    /// Retry required
    RetryRequired = 0x0005,
    /// Component busy
    Busy = 0x0006,
    /// Media disabled
    MediaDisabled = 0x0007,
    /// Firmware transfer in progress
    FwTransferInProgress = 0x0008,
    /// Firmware transfer out of order
    FwTransferOutOfOrder = 0x0009,
    /// Firmware authentication failed
    FwAuthFailed = 0x000A,
    /// Invalid firmware slot
    FwInvalidSlot = 0x000B,
    /// Firmware activation failed, rolled back
    FwActivationRolledBack = 0x000C,
    /// Firmware activation failed, reset required
    FwActivationResetRequired = 0x000D,
    /// Invalid handle
    InvalidHandle = 0x000E,
    /// Invalid physical address
    InvalidPhysicalAddress = 0x000F,
    /// Poison limit reached
    PoisonLimitReached = 0x0010,
    /// Media failure
    MediaFailure = 0x0011,
    /// Command aborted
    Aborted = 0x0012,
    /// Invalid security state
    InvalidSecurityState = 0x0013,
    /// Incorrect passphrase
    IncorrectPassphrase = 0x0014,
    /// Unsupported mailbox
    UnsupportedMailbox = 0x0015,
    /// Invalid payload length
    InvalidPayloadLength = 0x0016,
}

impl ReturnCode {
    /// Convert to raw u16 value
    #[must_use]
    pub const fn to_u16(self) -> u16 {
        self as u16
    }

    /// Convert from raw u16 value
    #[must_use]
    pub const fn from_u16(value: u16) -> Option<Self> {
        Some(match value {
            0x0000 => Self::Success,
            0x0001 => Self::BackgroundOpStarted,
            0x0002 => Self::InvalidInput,
            0x0003 => Self::Unsupported,
            0x0004 => Self::InternalError,
            0x0005 => Self::RetryRequired,
            0x0006 => Self::Busy,
            0x0007 => Self::MediaDisabled,
            0x0008 => Self::FwTransferInProgress,
            0x0009 => Self::FwTransferOutOfOrder,
            0x000A => Self::FwAuthFailed,
            0x000B => Self::FwInvalidSlot,
            0x000C => Self::FwActivationRolledBack,
            0x000D => Self::FwActivationResetRequired,
            0x000E => Self::InvalidHandle,
            0x000F => Self::InvalidPhysicalAddress,
            0x0010 => Self::PoisonLimitReached,
            0x0011 => Self::MediaFailure,
            0x0012 => Self::Aborted,
            0x0013 => Self::InvalidSecurityState,
            0x0014 => Self::IncorrectPassphrase,
            0x0015 => Self::UnsupportedMailbox,
            0x0016 => Self::InvalidPayloadLength,
            _ => return None,
        })
    }

    /// Whether the command completed, in the foreground or background
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success | Self::BackgroundOpStarted)
    }
}

impl From<ReturnCode> for u16 {
    fn from(code: ReturnCode) -> Self {
        code.to_u16()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_round_trip() {
        let opcodes = [
            Opcode::Identify,
            Opcode::IdentifySwitch,
            Opcode::BindVppb,
            Opcode::Tunnel,
            Opcode::GetLdInfo,
            Opcode::SetQosLimit,
        ];

        for opcode in opcodes {
            let value = opcode.to_u16();
            let parsed = Opcode::from_u16(value);
            assert_eq!(Some(opcode), parsed);
        }
    }

    #[test]
    fn invalid_opcode() {
        assert_eq!(Opcode::from_u16(0x0000), None);
        assert_eq!(Opcode::from_u16(0x5104), None);
        assert_eq!(Opcode::from_u16(0xFFFF), None);
    }

    #[test]
    fn command_sets_by_range() {
        assert_eq!(CommandSet::of(0x0002), Some(CommandSet::InfoStatus));
        assert_eq!(CommandSet::of(0x5103), Some(CommandSet::PhysicalSwitch));
        assert_eq!(CommandSet::of(0x52FF), Some(CommandSet::VirtualSwitch));
        assert_eq!(CommandSet::of(0x5300), Some(CommandSet::MldPort));
        assert_eq!(CommandSet::of(0x5409), Some(CommandSet::MldComponent));
        assert_eq!(CommandSet::of(0x0000), None);
        assert_eq!(CommandSet::of(0x5500), None);
        assert_eq!(CommandSet::of(0x0100), None);
    }

    #[test]
    fn return_codes() {
        for raw in 0x0000..=0x0016 {
            let code = ReturnCode::from_u16(raw).unwrap();
            assert_eq!(code.to_u16(), raw);
        }
        assert_eq!(ReturnCode::from_u16(0x0017), None);
        assert!(ReturnCode::BackgroundOpStarted.is_success());
        assert!(!ReturnCode::Busy.is_success());
    }

    #[test]
    fn every_opcode_has_a_command_set() {
        for raw in 0..=u16::MAX {
            if let Some(opcode) = Opcode::from_u16(raw) {
                assert_eq!(Some(opcode.command_set()), CommandSet::of(raw));
            }
        }
    }
}
