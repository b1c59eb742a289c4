//! MLD Component command set payloads.
//!
//! These commands are executed by a multi-logical device, usually reached
//! through a tunnel from the switch. Every list here is indexed by LD and
//! therefore bounded by the sixteen LDs an MLD can expose.

use bytes::BufMut;
use heapless::Vec;
use serde::{Deserialize, Serialize};

use super::{Decode, WireObject, decode_byte_list, decode_list, encode_list};
use crate::{
    Kind,
    errors::Result,
    flags::QosTelemetry,
    wire::{Reader, check_width, count_u8},
};

/// Most logical devices behind one MLD
pub const MAX_LDS: usize = 16;

fn check_telemetry(field: &'static str, bits: QosTelemetry) -> Result<()> {
    check_width(field, u64::from(bits.to_byte()), u64::from(QosTelemetry::all().to_byte()))
}

/// Get LD Info response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LdInfo {
    /// Total memory capacity of the MLD in bytes
    pub memory_size: u64,
    /// Number of LDs supported
    pub ld_count: u16,
    /// Supported QoS telemetry
    pub telemetry: QosTelemetry,
}

impl WireObject for LdInfo {
    const KIND: Kind = Kind::LdInfo;

    fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        check_telemetry("ld_info.telemetry", self.telemetry)?;

        dst.put_u64_le(self.memory_size);
        dst.put_u16_le(self.ld_count);
        dst.put_u8(self.telemetry.to_byte());
        Ok(())
    }
}

impl Decode for LdInfo {
    fn decode(r: &mut Reader<'_>) -> Result<Self> {
        Ok(Self {
            memory_size: r.u64()?,
            ld_count: r.u16()?,
            telemetry: QosTelemetry::from_bits_truncate(r.u8()?),
        })
    }
}

/// Memory allocation of one LD, in multiples of the allocation granularity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LdAllocBlock {
    /// Range 1 allocation multiplier
    pub range1: u64,
    /// Range 2 allocation multiplier
    pub range2: u64,
}

impl WireObject for LdAllocBlock {
    const KIND: Kind = Kind::LdAllocBlock;

    fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        dst.put_u64_le(self.range1);
        dst.put_u64_le(self.range2);
        Ok(())
    }
}

impl Decode for LdAllocBlock {
    fn decode(r: &mut Reader<'_>) -> Result<Self> {
        Ok(Self { range1: r.u64()?, range2: r.u64()? })
    }
}

/// Get LD Allocations request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GetLdAllocRequest {
    /// First LD ID to report
    pub start: u8,
    /// Most LDs to report
    pub limit: u8,
}

impl WireObject for GetLdAllocRequest {
    const KIND: Kind = Kind::GetLdAllocRequest;

    fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        dst.put_u8(self.start);
        dst.put_u8(self.limit);
        Ok(())
    }
}

impl Decode for GetLdAllocRequest {
    fn decode(r: &mut Reader<'_>) -> Result<Self> {
        Ok(Self { start: r.u8()?, limit: r.u8()? })
    }
}

/// Get LD Allocations response
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GetLdAllocResponse {
    /// Number of LDs enabled in the device
    pub total: u8,
    /// Allocation granularity (0 256 MB, 1 512 MB, 2 1 GB)
    pub granularity: u8,
    /// First LD ID in the list
    pub start: u8,
    /// Allocations starting at `start`
    pub blocks: Vec<LdAllocBlock, MAX_LDS>,
}

impl WireObject for GetLdAllocResponse {
    const KIND: Kind = Kind::GetLdAllocResponse;

    fn encoded_len(&self) -> usize {
        Self::KIND.fixed_len() + self.blocks.len() * Kind::LdAllocBlock.fixed_len()
    }

    fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        dst.put_u8(self.total);
        dst.put_u8(self.granularity);
        dst.put_u8(self.start);
        dst.put_u8(count_u8("get_ld_alloc_response.count", self.blocks.len())?);
        encode_list(&self.blocks, dst)
    }
}

impl Decode for GetLdAllocResponse {
    fn decode(r: &mut Reader<'_>) -> Result<Self> {
        let [total, granularity, start, count] = r.array()?;
        let blocks = decode_list(r, usize::from(count), "get_ld_alloc_response.blocks")?;
        Ok(Self { total, granularity, start, blocks })
    }
}

fn encode_set_alloc(
    field: &'static str,
    start: u8,
    blocks: &[LdAllocBlock],
    dst: &mut impl BufMut,
) -> Result<()> {
    dst.put_u8(count_u8(field, blocks.len())?);
    dst.put_u8(start);
    dst.put_bytes(0, 2);
    encode_list(blocks, dst)
}

fn decode_set_alloc(r: &mut Reader<'_>, what: &'static str) -> Result<(u8, Vec<LdAllocBlock, MAX_LDS>)> {
    let [count, start, _, _] = r.array()?;
    Ok((start, decode_list(r, usize::from(count), what)?))
}

/// Set LD Allocations request
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SetLdAllocRequest {
    /// First LD ID to configure
    pub start: u8,
    /// Allocations starting at `start`
    pub blocks: Vec<LdAllocBlock, MAX_LDS>,
}

impl WireObject for SetLdAllocRequest {
    const KIND: Kind = Kind::SetLdAllocRequest;

    fn encoded_len(&self) -> usize {
        Self::KIND.fixed_len() + self.blocks.len() * Kind::LdAllocBlock.fixed_len()
    }

    fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        encode_set_alloc("set_ld_alloc_request.count", self.start, &self.blocks, dst)
    }
}

impl Decode for SetLdAllocRequest {
    fn decode(r: &mut Reader<'_>) -> Result<Self> {
        let (start, blocks) = decode_set_alloc(r, "set_ld_alloc_request.blocks")?;
        Ok(Self { start, blocks })
    }
}

/// Set LD Allocations response, echoing the allocations applied
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SetLdAllocResponse {
    /// First LD ID configured
    pub start: u8,
    /// Allocations starting at `start`
    pub blocks: Vec<LdAllocBlock, MAX_LDS>,
}

impl WireObject for SetLdAllocResponse {
    const KIND: Kind = Kind::SetLdAllocResponse;

    fn encoded_len(&self) -> usize {
        Self::KIND.fixed_len() + self.blocks.len() * Kind::LdAllocBlock.fixed_len()
    }

    fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        encode_set_alloc("set_ld_alloc_response.count", self.start, &self.blocks, dst)
    }
}

impl Decode for SetLdAllocResponse {
    fn decode(r: &mut Reader<'_>) -> Result<Self> {
        let (start, blocks) = decode_set_alloc(r, "set_ld_alloc_response.blocks")?;
        Ok(Self { start, blocks })
    }
}

/// QoS control parameters, shared by get and set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QosControl {
    /// Enabled telemetry
    pub enable: QosTelemetry,
    /// Egress moderate congestion threshold, percent
    pub moderate_pct: u8,
    /// Egress severe congestion threshold, percent
    pub severe_pct: u8,
    /// Backpressure sample interval
    pub sample_interval: u8,
    /// ReqCmpBasis
    pub req_cmp_basis: u16,
    /// Completion collection interval
    pub completion_interval: u8,
}

impl WireObject for QosControl {
    const KIND: Kind = Kind::QosControl;

    fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        check_telemetry("qos_control.enable", self.enable)?;

        dst.put_u8(self.enable.to_byte());
        dst.put_u8(self.moderate_pct);
        dst.put_u8(self.severe_pct);
        dst.put_u8(self.sample_interval);
        dst.put_u16_le(self.req_cmp_basis);
        dst.put_u8(self.completion_interval);
        Ok(())
    }
}

impl Decode for QosControl {
    fn decode(r: &mut Reader<'_>) -> Result<Self> {
        let [enable, moderate_pct, severe_pct, sample_interval] = r.array()?;

        Ok(Self {
            enable: QosTelemetry::from_bits_truncate(enable),
            moderate_pct,
            severe_pct,
            sample_interval,
            req_cmp_basis: r.u16()?,
            completion_interval: r.u8()?,
        })
    }
}

/// Get QoS Status response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QosStatus {
    /// Average backpressure, percent
    pub backpressure_avg_pct: u8,
}

impl WireObject for QosStatus {
    const KIND: Kind = Kind::QosStatus;

    fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        dst.put_u8(self.backpressure_avg_pct);
        Ok(())
    }
}

impl Decode for QosStatus {
    fn decode(r: &mut Reader<'_>) -> Result<Self> {
        Ok(Self { backpressure_avg_pct: r.u8()? })
    }
}

/// Get QoS Allocated BW request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GetQosAllocRequest {
    /// Number of LDs to report
    pub count: u8,
    /// First LD ID to report
    pub start: u8,
}

impl WireObject for GetQosAllocRequest {
    const KIND: Kind = Kind::GetQosAllocRequest;

    fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        dst.put_u8(self.count);
        dst.put_u8(self.start);
        Ok(())
    }
}

impl Decode for GetQosAllocRequest {
    fn decode(r: &mut Reader<'_>) -> Result<Self> {
        Ok(Self { count: r.u8()?, start: r.u8()? })
    }
}

/// QoS allocated bandwidth per LD, as fractions of 256
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QosAlloc {
    /// First LD ID in the list
    pub start: u8,
    /// Bandwidth fractions starting at `start`
    pub fractions: Vec<u8, MAX_LDS>,
}

impl WireObject for QosAlloc {
    const KIND: Kind = Kind::QosAlloc;

    fn encoded_len(&self) -> usize {
        Self::KIND.fixed_len() + self.fractions.len()
    }

    fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        dst.put_u8(count_u8("qos_alloc.count", self.fractions.len())?);
        dst.put_u8(self.start);
        dst.put_slice(&self.fractions);
        Ok(())
    }
}

impl Decode for QosAlloc {
    fn decode(r: &mut Reader<'_>) -> Result<Self> {
        let [count, start] = r.array()?;
        Ok(Self { start, fractions: decode_byte_list(r, usize::from(count), "qos_alloc.fractions")? })
    }
}

/// Get QoS BW Limit request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GetQosLimitRequest {
    /// Number of LDs to report
    pub count: u8,
    /// First LD ID to report
    pub start: u8,
}

impl WireObject for GetQosLimitRequest {
    const KIND: Kind = Kind::GetQosLimitRequest;

    fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        dst.put_u8(self.count);
        dst.put_u8(self.start);
        Ok(())
    }
}

impl Decode for GetQosLimitRequest {
    fn decode(r: &mut Reader<'_>) -> Result<Self> {
        Ok(Self { count: r.u8()?, start: r.u8()? })
    }
}

/// QoS bandwidth limit per LD, as fractions of 256
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QosLimit {
    /// First LD ID in the list
    pub start: u8,
    /// Bandwidth limit fractions starting at `start`
    pub fractions: Vec<u8, MAX_LDS>,
}

impl WireObject for QosLimit {
    const KIND: Kind = Kind::QosLimit;

    fn encoded_len(&self) -> usize {
        Self::KIND.fixed_len() + self.fractions.len()
    }

    fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        dst.put_u8(count_u8("qos_limit.count", self.fractions.len())?);
        dst.put_u8(self.start);
        dst.put_slice(&self.fractions);
        Ok(())
    }
}

impl Decode for QosLimit {
    fn decode(r: &mut Reader<'_>) -> Result<Self> {
        let [count, start] = r.array()?;
        Ok(Self { start, fractions: decode_byte_list(r, usize::from(count), "qos_limit.fractions")? })
    }
}
