//! Physical Switch command set payloads.

use bytes::BufMut;
use heapless::Vec;
use serde::{Deserialize, Serialize};

use super::{Decode, WireObject, decode_byte_list, decode_list, encode_list};
use crate::{
    Kind,
    errors::Result,
    flags::LinkStateFlags,
    wire::{Reader, check_width, count_u8},
};

/// Most physical ports a switch can report
pub const MAX_PORTS: usize = 256;

/// Identify Switch Device response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SwitchIdentity {
    /// Physical port the FM is connected through
    pub ingress_port: u8,
    /// Number of physical ports
    pub num_ports: u8,
    /// Number of virtual CXL switches
    pub num_vcss: u8,
    /// Bitmask of active physical ports
    pub active_ports: [u8; 32],
    /// Bitmask of active VCSs
    pub active_vcss: [u8; 32],
    /// Total number of vPPBs
    pub num_vppbs: u16,
    /// Number of bound vPPBs
    pub active_vppbs: u16,
    /// HDM decoders available per USP
    pub num_decoders: u8,
}

impl SwitchIdentity {
    /// Whether physical port `ppid` is marked active
    #[must_use]
    pub const fn port_active(&self, ppid: u8) -> bool {
        self.active_ports[(ppid / 8) as usize] & (1 << (ppid % 8)) != 0
    }

    /// Whether VCS `vcsid` is marked active
    #[must_use]
    pub const fn vcs_active(&self, vcsid: u8) -> bool {
        self.active_vcss[(vcsid / 8) as usize] & (1 << (vcsid % 8)) != 0
    }
}

impl WireObject for SwitchIdentity {
    const KIND: Kind = Kind::SwitchIdentity;

    fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        dst.put_u8(self.ingress_port);
        dst.put_u8(0);
        dst.put_u8(self.num_ports);
        dst.put_u8(self.num_vcss);
        dst.put_slice(&self.active_ports);
        dst.put_slice(&self.active_vcss);
        dst.put_u16_le(self.num_vppbs);
        dst.put_u16_le(self.active_vppbs);
        dst.put_u8(self.num_decoders);
        dst.put_bytes(0, 20);
        Ok(())
    }
}

impl Decode for SwitchIdentity {
    fn decode(r: &mut Reader<'_>) -> Result<Self> {
        let ingress_port = r.u8()?;
        r.skip(1)?;
        let id = Self {
            ingress_port,
            num_ports: r.u8()?,
            num_vcss: r.u8()?,
            active_ports: r.array()?,
            active_vcss: r.array()?,
            num_vppbs: r.u16()?,
            active_vppbs: r.u16()?,
            num_decoders: r.u8()?,
        };
        r.skip(20)?;
        Ok(id)
    }
}

/// Get Physical Port State request
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortStateRequest {
    /// Physical port IDs to query
    pub ports: Vec<u8, MAX_PORTS>,
}

impl WireObject for PortStateRequest {
    const KIND: Kind = Kind::PortStateRequest;

    fn encoded_len(&self) -> usize {
        Self::KIND.fixed_len() + self.ports.len()
    }

    fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        dst.put_u8(count_u8("port_state_request.count", self.ports.len())?);
        dst.put_slice(&self.ports);
        Ok(())
    }
}

impl Decode for PortStateRequest {
    fn decode(r: &mut Reader<'_>) -> Result<Self> {
        let count = usize::from(r.u8()?);
        Ok(Self { ports: decode_byte_list(r, count, "port_state_request.ports")? })
    }
}

/// State of one physical port
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortInfo {
    /// Physical port ID
    pub ppid: u8,
    /// Current port configuration state
    pub state: u8,
    /// Connected device CXL version
    pub device_version: u8,
    /// Connected device type
    pub device_type: u8,
    /// Supported CXL versions (bitmask)
    pub cxl_versions: u8,
    /// Maximum link width
    pub max_width: u8,
    /// Negotiated link width
    pub negotiated_width: u8,
    /// Supported link speeds (bitmask)
    pub supported_speeds: u8,
    /// Maximum link speed
    pub max_speed: u8,
    /// Current link speed
    pub current_speed: u8,
    /// LTSSM state
    pub ltssm: u8,
    /// First negotiated lane number
    pub first_lane: u8,
    /// Link state flags
    pub flags: LinkStateFlags,
    /// Number of LDs supported by the connected device
    pub num_ld: u8,
}

impl WireObject for PortInfo {
    const KIND: Kind = Kind::PortInfo;

    fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        check_width(
            "port_info.flags",
            u64::from(self.flags.to_byte()),
            u64::from(LinkStateFlags::all().to_byte()),
        )?;

        dst.put_u8(self.ppid);
        dst.put_u8(self.state);
        dst.put_u8(self.device_version);
        dst.put_u8(0);
        dst.put_u8(self.device_type);
        dst.put_u8(self.cxl_versions);
        dst.put_u8(self.max_width);
        dst.put_u8(self.negotiated_width);
        dst.put_u8(self.supported_speeds);
        dst.put_u8(self.max_speed);
        dst.put_u8(self.current_speed);
        dst.put_u8(self.ltssm);
        dst.put_u8(self.first_lane);
        dst.put_u8(self.flags.to_byte());
        dst.put_u8(0);
        dst.put_u8(self.num_ld);
        Ok(())
    }
}

impl Decode for PortInfo {
    fn decode(r: &mut Reader<'_>) -> Result<Self> {
        let [
            ppid,
            state,
            device_version,
            _,
            device_type,
            cxl_versions,
            max_width,
            negotiated_width,
            supported_speeds,
            max_speed,
            current_speed,
            ltssm,
            first_lane,
            flags,
            _,
            num_ld,
        ] = r.array::<16>()?;

        Ok(Self {
            ppid,
            state,
            device_version,
            device_type,
            cxl_versions,
            max_width,
            negotiated_width,
            supported_speeds,
            max_speed,
            current_speed,
            ltssm,
            first_lane,
            flags: LinkStateFlags::from_bits_truncate(flags),
            num_ld,
        })
    }
}

/// Get Physical Port State response
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortStateResponse {
    /// One block per requested port
    pub ports: Vec<PortInfo, MAX_PORTS>,
}

impl WireObject for PortStateResponse {
    const KIND: Kind = Kind::PortStateResponse;

    fn encoded_len(&self) -> usize {
        Self::KIND.fixed_len() + self.ports.len() * Kind::PortInfo.fixed_len()
    }

    fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        dst.put_u8(count_u8("port_state_response.count", self.ports.len())?);
        dst.put_bytes(0, 3);
        encode_list(&self.ports, dst)
    }
}

impl Decode for PortStateResponse {
    fn decode(r: &mut Reader<'_>) -> Result<Self> {
        let count = usize::from(r.u8()?);
        r.skip(3)?;
        Ok(Self { ports: decode_list(r, count, "port_state_response.ports")? })
    }
}

/// Physical Port Control request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortControl {
    /// Physical port ID
    pub ppid: u8,
    /// Port action: 0 assert PERST, 1 deassert PERST, 2 reset PPB
    pub action: u8,
}

impl PortControl {
    /// Assert PERST#
    pub const ASSERT_PERST: u8 = 0x00;
    /// Deassert PERST#
    pub const DEASSERT_PERST: u8 = 0x01;
    /// Reset the PPB
    pub const RESET_PPB: u8 = 0x02;
}

impl WireObject for PortControl {
    const KIND: Kind = Kind::PortControl;

    fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        dst.put_u8(self.ppid);
        dst.put_u8(self.action);
        Ok(())
    }
}

impl Decode for PortControl {
    fn decode(r: &mut Reader<'_>) -> Result<Self> {
        Ok(Self { ppid: r.u8()?, action: r.u8()? })
    }
}

/// Send PPB CXL.io Configuration request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PpbConfigRequest {
    /// Physical port ID of the PPB
    pub ppid: u8,
    /// Register number
    pub register: u8,
    /// Extended register number (4 bits)
    pub ext_register: u8,
    /// First dword byte enable (4 bits)
    pub fdbe: u8,
    /// Write transaction; read when false
    pub write: bool,
    /// Data for a write
    pub data: [u8; 4],
}

impl WireObject for PpbConfigRequest {
    const KIND: Kind = Kind::PpbConfigRequest;

    fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        check_width("ppb_config.ext_register", u64::from(self.ext_register), 0x0F)?;
        check_width("ppb_config.fdbe", u64::from(self.fdbe), 0x0F)?;

        dst.put_u8(self.ppid);
        dst.put_u8(self.register);
        dst.put_u8((self.fdbe << 4) | self.ext_register);
        dst.put_u8(u8::from(self.write) << 7);
        dst.put_slice(&self.data);
        Ok(())
    }
}

impl Decode for PpbConfigRequest {
    fn decode(r: &mut Reader<'_>) -> Result<Self> {
        let ppid = r.u8()?;
        let register = r.u8()?;
        let enables = r.u8()?;
        let transaction = r.u8()?;

        Ok(Self {
            ppid,
            register,
            ext_register: enables & 0x0F,
            fdbe: enables >> 4,
            write: transaction & 0x80 != 0,
            data: r.array()?,
        })
    }
}

/// Send PPB CXL.io Configuration response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PpbConfigResponse {
    /// Data read from the register
    pub data: [u8; 4],
}

impl WireObject for PpbConfigResponse {
    const KIND: Kind = Kind::PpbConfigResponse;

    fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        dst.put_slice(&self.data);
        Ok(())
    }
}

impl Decode for PpbConfigResponse {
    fn decode(r: &mut Reader<'_>) -> Result<Self> {
        Ok(Self { data: r.array()? })
    }
}
