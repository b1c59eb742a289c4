//! Virtual Switch command set payloads.
//!
//! Get Virtual CXL Switch Info is the one exchange in the FM API whose
//! response cannot be decoded on its own: a VCS info block does not carry the
//! number of vPPB entries that follow it. That number is derived from the
//! block's `total` together with the window (`vppbid_start`, `vppbid_limit`)
//! of the originating request, so both [`VcsInfoBlock::decode`] and
//! [`VcsInfoResponse::decode`] take the request explicitly.

use bytes::BufMut;
use heapless::Vec;
use serde::{Deserialize, Serialize};

use super::{Decode, WireObject, decode_byte_list, encode_list};
use crate::{
    Kind,
    errors::{ProtocolError, Result},
    wire::{Reader, check_capacity, check_width, count_u8},
};

/// Most VCSs a switch can host
pub const MAX_VCS: usize = 256;

/// Most vPPBs a VCS block can report, bounded by its 8-bit `total`
pub const MAX_VPPBS: usize = 255;

/// Most VCS blocks in one response
pub const MAX_VCS_PER_RESPONSE: usize = 7;

/// Get Virtual CXL Switch Info request
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VcsInfoRequest {
    /// First vPPB to report for each VCS
    pub vppbid_start: u8,
    /// Most vPPBs to report for each VCS
    pub vppbid_limit: u8,
    /// VCS IDs to report on
    pub vcss: Vec<u8, MAX_VCS>,
}

impl VcsInfoRequest {
    /// Number of vPPB entries a response block with `total` vPPBs carries
    #[must_use]
    pub fn entries_for(&self, total: u8) -> usize {
        usize::from(self.vppbid_limit.min(total.saturating_sub(self.vppbid_start)))
    }
}

impl WireObject for VcsInfoRequest {
    const KIND: Kind = Kind::VcsInfoRequest;

    fn encoded_len(&self) -> usize {
        Self::KIND.fixed_len() + self.vcss.len()
    }

    fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        dst.put_u8(self.vppbid_start);
        dst.put_u8(self.vppbid_limit);
        dst.put_u8(count_u8("vcs_info_request.count", self.vcss.len())?);
        dst.put_slice(&self.vcss);
        Ok(())
    }
}

impl Decode for VcsInfoRequest {
    fn decode(r: &mut Reader<'_>) -> Result<Self> {
        let vppbid_start = r.u8()?;
        let vppbid_limit = r.u8()?;
        let count = usize::from(r.u8()?);

        Ok(Self { vppbid_start, vppbid_limit, vcss: decode_byte_list(r, count, "vcs_info_request.vcss")? })
    }
}

/// Binding status of one vPPB
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PpbStatusBlock {
    /// Binding status
    pub status: u8,
    /// Bound physical port ID
    pub ppid: u8,
    /// Bound LD ID
    pub ldid: u8,
}

impl WireObject for PpbStatusBlock {
    const KIND: Kind = Kind::PpbStatusBlock;

    fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        dst.put_u8(self.status);
        dst.put_u8(self.ppid);
        dst.put_u8(self.ldid);
        dst.put_u8(0);
        Ok(())
    }
}

impl Decode for PpbStatusBlock {
    fn decode(r: &mut Reader<'_>) -> Result<Self> {
        let [status, ppid, ldid, _] = r.array()?;
        Ok(Self { status, ppid, ldid })
    }
}

/// Information about one VCS
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VcsInfoBlock {
    /// VCS ID
    pub vcsid: u8,
    /// VCS state
    pub state: u8,
    /// Upstream physical port ID
    pub uspid: u8,
    /// Total number of vPPBs in the VCS
    pub total: u8,
    /// Status of the vPPBs inside the requested window
    pub ppbs: Vec<PpbStatusBlock, MAX_VPPBS>,
}

impl VcsInfoBlock {
    /// Decode a block answering `request`
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Truncated`] if the buffer ends early.
    pub fn decode(r: &mut Reader<'_>, request: &VcsInfoRequest) -> Result<Self> {
        let [vcsid, state, uspid, total] = r.array()?;
        let count = request.entries_for(total);

        let mut ppbs = Vec::new();
        for _ in 0..count {
            let ppb = r.scoped(Kind::PpbStatusBlock, PpbStatusBlock::decode)?;
            ppbs.push(ppb).map_err(|_| ProtocolError::CapacityExceeded {
                what: "vcs_info_block.ppbs",
                len: count,
                max: MAX_VPPBS,
            })?;
        }

        Ok(Self { vcsid, state, uspid, total, ppbs })
    }
}

impl WireObject for VcsInfoBlock {
    const KIND: Kind = Kind::VcsInfoBlock;

    fn encoded_len(&self) -> usize {
        Self::KIND.fixed_len() + self.ppbs.len() * Kind::PpbStatusBlock.fixed_len()
    }

    fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        // A decoder never reads more entries than `total` allows
        check_width("vcs_info_block.ppbs", self.ppbs.len() as u64, u64::from(self.total))?;

        dst.put_u8(self.vcsid);
        dst.put_u8(self.state);
        dst.put_u8(self.uspid);
        dst.put_u8(self.total);
        encode_list(&self.ppbs, dst)
    }
}

/// Get Virtual CXL Switch Info response
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VcsInfoResponse {
    /// One block per reported VCS
    pub blocks: Vec<VcsInfoBlock, MAX_VCS_PER_RESPONSE>,
}

impl VcsInfoResponse {
    /// Decode a response to `request`
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::CapacityExceeded`] if the response claims
    /// more than seven blocks, or [`ProtocolError::Truncated`] if the buffer
    /// ends early.
    pub fn decode(r: &mut Reader<'_>, request: &VcsInfoRequest) -> Result<Self> {
        let count = usize::from(r.u8()?);
        r.skip(3)?;
        check_capacity("vcs_info_response.blocks", count, MAX_VCS_PER_RESPONSE)?;

        let mut blocks = Vec::new();
        for _ in 0..count {
            let block = r.scoped(Kind::VcsInfoBlock, |r| VcsInfoBlock::decode(r, request))?;
            blocks.push(block).map_err(|_| ProtocolError::CapacityExceeded {
                what: "vcs_info_response.blocks",
                len: count,
                max: MAX_VCS_PER_RESPONSE,
            })?;
        }

        Ok(Self { blocks })
    }
}

impl WireObject for VcsInfoResponse {
    const KIND: Kind = Kind::VcsInfoResponse;

    fn encoded_len(&self) -> usize {
        Self::KIND.fixed_len() + self.blocks.iter().map(|block| block.encoded_len()).sum::<usize>()
    }

    fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        dst.put_u8(count_u8("vcs_info_response.count", self.blocks.len())?);
        dst.put_bytes(0, 3);
        encode_list(&self.blocks, dst)
    }
}

/// Bind vPPB request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BindVppb {
    /// VCS ID
    pub vcsid: u8,
    /// vPPB ID within the VCS
    pub vppbid: u8,
    /// Physical port to bind
    pub ppid: u8,
    /// LD ID to bind, `0xFFFF` for a non-MLD port
    pub ldid: u16,
}

impl WireObject for BindVppb {
    const KIND: Kind = Kind::BindVppb;

    fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        dst.put_u8(self.vcsid);
        dst.put_u8(self.vppbid);
        dst.put_u8(self.ppid);
        dst.put_u8(0);
        dst.put_u16_le(self.ldid);
        Ok(())
    }
}

impl Decode for BindVppb {
    fn decode(r: &mut Reader<'_>) -> Result<Self> {
        let [vcsid, vppbid, ppid, _] = r.array()?;
        Ok(Self { vcsid, vppbid, ppid, ldid: r.u16()? })
    }
}

/// Unbind vPPB request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnbindVppb {
    /// VCS ID
    pub vcsid: u8,
    /// vPPB ID within the VCS
    pub vppbid: u8,
    /// Unbind option (4 bits): 0 wait, 1 managed hot remove, 2 surprise
    pub option: u8,
}

impl WireObject for UnbindVppb {
    const KIND: Kind = Kind::UnbindVppb;

    fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        check_width("unbind_vppb.option", u64::from(self.option), 0x0F)?;

        dst.put_u8(self.vcsid);
        dst.put_u8(self.vppbid);
        dst.put_u8(self.option);
        Ok(())
    }
}

impl Decode for UnbindVppb {
    fn decode(r: &mut Reader<'_>) -> Result<Self> {
        let [vcsid, vppbid, option] = r.array()?;
        Ok(Self { vcsid, vppbid, option: option & 0x0F })
    }
}

/// Generate AER Event request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GenerateAer {
    /// VCS ID
    pub vcsid: u8,
    /// vPPB ID within the VCS
    pub vppbid: u8,
    /// AER error type
    pub error_type: u32,
    /// TLP header log
    pub tlp_header: [u8; 32],
}

impl WireObject for GenerateAer {
    const KIND: Kind = Kind::GenerateAer;

    fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        dst.put_u8(self.vcsid);
        dst.put_u8(self.vppbid);
        dst.put_bytes(0, 2);
        dst.put_u32_le(self.error_type);
        dst.put_slice(&self.tlp_header);
        Ok(())
    }
}

impl Decode for GenerateAer {
    fn decode(r: &mut Reader<'_>) -> Result<Self> {
        let [vcsid, vppbid, _, _] = r.array()?;
        Ok(Self { vcsid, vppbid, error_type: r.u32()?, tlp_header: r.array()? })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(start: u8, limit: u8) -> VcsInfoRequest {
        VcsInfoRequest { vppbid_start: start, vppbid_limit: limit, vcss: Vec::from_slice(&[0, 1]).unwrap() }
    }

    fn encode(obj: &impl WireObject) -> std::vec::Vec<u8> {
        let mut buf = std::vec::Vec::new();
        obj.encode(&mut buf).unwrap();
        assert_eq!(buf.len(), obj.encoded_len());
        buf
    }

    fn block_on_wire(total: u8, entries: u8) -> std::vec::Vec<u8> {
        let mut bytes = vec![3, 1, 9, total];
        for i in 0..entries {
            bytes.extend_from_slice(&[2, i, 0, 0]);
        }
        bytes
    }

    #[test]
    fn entries_follow_request_window() {
        assert_eq!(request(2, 6).entries_for(10), 6);
        assert_eq!(request(2, 6).entries_for(5), 3);
        assert_eq!(request(0, 0).entries_for(200), 0);
        assert_eq!(request(8, 4).entries_for(5), 0);
    }

    #[test]
    fn block_sized_by_context() {
        let bytes = block_on_wire(10, 6);
        let mut r = Reader::new(&bytes, Kind::VcsInfoBlock);
        let block = VcsInfoBlock::decode(&mut r, &request(2, 6)).unwrap();

        assert_eq!(block.ppbs.len(), 6);
        assert_eq!(r.position(), 4 + 6 * 4);
        assert_eq!(encode(&block), bytes);
    }

    #[test]
    fn short_window_uses_remaining_vppbs() {
        let bytes = block_on_wire(5, 3);
        let block = VcsInfoBlock::decode(&mut Reader::new(&bytes, Kind::VcsInfoBlock), &request(2, 6)).unwrap();
        assert_eq!(block.ppbs.len(), 3);
        assert_eq!(block.ppbs[2], PpbStatusBlock { status: 2, ppid: 2, ldid: 0 });
    }

    #[test]
    fn block_rejects_more_entries_than_total() {
        let block = VcsInfoBlock {
            vcsid: 3,
            state: 1,
            uspid: 9,
            total: 2,
            ppbs: [PpbStatusBlock::default(); 5].into_iter().collect(),
        };

        let mut buf = std::vec::Vec::new();
        assert_eq!(
            block.encode(&mut buf),
            Err(ProtocolError::ValueOutOfRange { field: "vcs_info_block.ppbs", value: 5, max: 2 })
        );
        assert!(buf.is_empty());

        let fits = VcsInfoBlock { ppbs: block.ppbs.iter().copied().take(2).collect(), ..block };
        let bytes = encode(&fits);
        let mut r = Reader::new(&bytes, Kind::VcsInfoBlock);
        assert_eq!(VcsInfoBlock::decode(&mut r, &request(0, 255)).unwrap(), fits);
        assert_eq!(r.position(), bytes.len());
    }

    #[test]
    fn full_window_reports_every_vppb() {
        let bytes = block_on_wire(255, 255);
        let mut r = Reader::new(&bytes, Kind::VcsInfoBlock);
        let block = VcsInfoBlock::decode(&mut r, &request(0, 255)).unwrap();

        assert_eq!(block.ppbs.len(), MAX_VPPBS);
        assert_eq!(r.position(), 4 + 255 * 4);
        assert_eq!(encode(&block), bytes);
    }

    #[test]
    fn response_carries_multiple_blocks() {
        let req = request(0, 2);
        let mut bytes = vec![2, 0, 0, 0];
        bytes.extend(block_on_wire(2, 2));
        bytes.extend(block_on_wire(1, 1));

        let mut r = Reader::new(&bytes, Kind::VcsInfoResponse);
        let rsp = VcsInfoResponse::decode(&mut r, &req).unwrap();

        assert_eq!(rsp.blocks.len(), 2);
        assert_eq!(rsp.blocks[0].ppbs.len(), 2);
        assert_eq!(rsp.blocks[1].ppbs.len(), 1);
        assert_eq!(r.position(), bytes.len());
        assert_eq!(encode(&rsp), bytes);
    }

    #[test]
    fn response_rejects_more_than_seven_blocks() {
        let bytes = [8, 0, 0, 0];
        assert_eq!(
            VcsInfoResponse::decode(&mut Reader::new(&bytes, Kind::VcsInfoResponse), &request(0, 0)),
            Err(ProtocolError::CapacityExceeded { what: "vcs_info_response.blocks", len: 8, max: 7 })
        );
    }

    #[test]
    fn truncated_block_entry() {
        let bytes = [1, 0, 0, 0, 3, 1, 9, 4, 2, 0];
        assert_eq!(
            VcsInfoResponse::decode(&mut Reader::new(&bytes, Kind::VcsInfoResponse), &request(0, 4)),
            Err(ProtocolError::Truncated { kind: Kind::PpbStatusBlock, needed: 4, available: 2 })
        );
    }

    #[test]
    fn bind_layout() {
        let bind = BindVppb { vcsid: 0x42, vppbid: 0x0A, ppid: 0x0B, ldid: 0x0C0D };
        let bytes = encode(&bind);
        assert_eq!(bytes, [0x42, 0x0A, 0x0B, 0x00, 0x0D, 0x0C]);
        assert_eq!(BindVppb::decode(&mut Reader::new(&bytes, Kind::BindVppb)).unwrap(), bind);
    }

    #[test]
    fn unbind_option_is_four_bits() {
        let unbind = UnbindVppb { vcsid: 1, vppbid: 2, option: 0x10 };
        assert!(matches!(
            unbind.encode(&mut std::vec::Vec::new()),
            Err(ProtocolError::ValueOutOfRange { field: "unbind_vppb.option", .. })
        ));

        let parsed = UnbindVppb::decode(&mut Reader::new(&[1, 2, 0xF2], Kind::UnbindVppb)).unwrap();
        assert_eq!(parsed, UnbindVppb { vcsid: 1, vppbid: 2, option: 2 });
    }

    #[test]
    fn aer_layout() {
        let mut aer = GenerateAer { vcsid: 1, vppbid: 2, error_type: 0x0000_4000, tlp_header: [0; 32] };
        aer.tlp_header[31] = 0xEE;

        let bytes = encode(&aer);
        assert_eq!(bytes.len(), 40);
        assert_eq!(&bytes[0..8], &[1, 2, 0, 0, 0x00, 0x40, 0x00, 0x00]);
        assert_eq!(bytes[39], 0xEE);
        assert_eq!(GenerateAer::decode(&mut Reader::new(&bytes, Kind::GenerateAer)).unwrap(), aer);
    }
}
