//! Proptest strategies for payload objects.
//!
//! Every strategy yields values that encode successfully: sub-byte fields stay
//! inside their width and lists stay inside their capacity.

use bytes::Bytes;
use heapless::Vec;
use proptest::{
    prelude::*,
    strategy::{Union, ValueTree},
    test_runner::TestRunner,
};

use super::{mld_component::MAX_LDS, vcs::MAX_VCS_PER_RESPONSE, *};
use crate::flags::{LinkStateFlags, QosTelemetry};

fn blob(max: usize) -> impl Strategy<Value = Bytes> {
    prop::collection::vec(any::<u8>(), 0..=max).prop_map(Bytes::from)
}

fn bounded<T: Clone + std::fmt::Debug, const N: usize>(
    element: impl Strategy<Value = T>,
    max: usize,
) -> impl Strategy<Value = Vec<T, N>> {
    prop::collection::vec(element, 0..=max.min(N)).prop_map(|items| items.into_iter().collect())
}

fn nibble() -> impl Strategy<Value = u8> {
    0u8..=0x0F
}

fn link_flags() -> impl Strategy<Value = LinkStateFlags> {
    (0u8..=LinkStateFlags::all().to_byte()).prop_map(LinkStateFlags::from_bits_truncate)
}

fn telemetry() -> impl Strategy<Value = QosTelemetry> {
    (0u8..=QosTelemetry::all().to_byte()).prop_map(QosTelemetry::from_bits_truncate)
}

pub(crate) fn port_info() -> impl Strategy<Value = PortInfo> {
    (any::<[u8; 13]>(), link_flags()).prop_map(|(b, flags)| PortInfo {
        ppid: b[0],
        state: b[1],
        device_version: b[2],
        device_type: b[3],
        cxl_versions: b[4],
        max_width: b[5],
        negotiated_width: b[6],
        supported_speeds: b[7],
        max_speed: b[8],
        current_speed: b[9],
        ltssm: b[10],
        first_lane: b[11],
        flags,
        num_ld: b[12],
    })
}

fn ld_alloc_block() -> impl Strategy<Value = LdAllocBlock> {
    (any::<u64>(), any::<u64>()).prop_map(|(range1, range2)| LdAllocBlock { range1, range2 })
}

fn ppb_status_block() -> impl Strategy<Value = PpbStatusBlock> {
    any::<[u8; 3]>().prop_map(|[status, ppid, ldid]| PpbStatusBlock { status, ppid, ldid })
}

pub(crate) fn vcs_info_request() -> impl Strategy<Value = VcsInfoRequest> {
    (0u8..8, 0u8..8, bounded(any::<u8>(), 16)).prop_map(|(vppbid_start, vppbid_limit, vcss)| {
        VcsInfoRequest { vppbid_start, vppbid_limit, vcss }
    })
}

fn vcs_info_block(request: &VcsInfoRequest) -> impl Strategy<Value = VcsInfoBlock> + use<> {
    let request = request.clone();
    any::<[u8; 4]>().prop_flat_map(move |[vcsid, state, uspid, total]| {
        let count = request.entries_for(total);
        prop::collection::vec(ppb_status_block(), count).prop_map(move |ppbs| VcsInfoBlock {
            vcsid,
            state,
            uspid,
            total,
            ppbs: ppbs.into_iter().collect(),
        })
    })
}

/// A VCS info response together with the request it answers
pub(crate) fn vcs_info_response() -> impl Strategy<Value = (VcsInfoResponse, VcsInfoRequest)> {
    vcs_info_request().prop_flat_map(|request| {
        let blocks = prop::collection::vec(vcs_info_block(&request), 0..=MAX_VCS_PER_RESPONSE);
        (blocks, Just(request))
            .prop_map(|(blocks, request)| (VcsInfoResponse { blocks: blocks.into_iter().collect() }, request))
    })
}

type Arm = BoxedStrategy<(Payload, Option<Payload>)>;

fn plain<T>(strategy: impl Strategy<Value = T> + 'static) -> Arm
where
    T: Into<Payload> + std::fmt::Debug,
{
    strategy.prop_map(|object| (object.into(), None)).boxed()
}

/// Any payload, paired with the request context needed to decode it
pub(crate) fn any_payload_with_context() -> impl Strategy<Value = (Payload, Option<Payload>)> {
    let arms: std::vec::Vec<Arm> = vec![
        Just((Payload::Empty, None)).boxed(),
        plain(any::<Header>()),
        // Physical switch
        plain(
            (any::<[u8; 3]>(), any::<[u8; 32]>(), any::<[u8; 32]>(), any::<(u16, u16, u8)>()).prop_map(
                |([ingress_port, num_ports, num_vcss], active_ports, active_vcss, (num_vppbs, active_vppbs, num_decoders))| {
                    SwitchIdentity {
                        ingress_port,
                        num_ports,
                        num_vcss,
                        active_ports,
                        active_vcss,
                        num_vppbs,
                        active_vppbs,
                        num_decoders,
                    }
                },
            ),
        ),
        plain(bounded(any::<u8>(), 255).prop_map(|ports| PortStateRequest { ports })),
        plain(port_info()),
        plain(bounded(port_info(), 8).prop_map(|ports| PortStateResponse { ports })),
        plain(any::<(u8, u8)>().prop_map(|(ppid, action)| PortControl { ppid, action })),
        plain((any::<(u8, u8, bool)>(), nibble(), nibble(), any::<[u8; 4]>()).prop_map(
            |((ppid, register, write), ext_register, fdbe, data)| PpbConfigRequest {
                ppid,
                register,
                ext_register,
                fdbe,
                write,
                data,
            },
        )),
        plain(any::<[u8; 4]>().prop_map(|data| PpbConfigResponse { data })),
        // Virtual switch
        plain(vcs_info_request()),
        plain(ppb_status_block()),
        vcs_info_request()
            .prop_flat_map(|request| {
                (vcs_info_block(&request), Just(request))
                    .prop_map(|(block, request)| (Payload::from(block), Some(Payload::from(request))))
            })
            .boxed(),
        vcs_info_response()
            .prop_map(|(response, request)| (Payload::from(response), Some(Payload::from(request))))
            .boxed(),
        plain(any::<(u8, u8, u8, u16)>().prop_map(|(vcsid, vppbid, ppid, ldid)| BindVppb { vcsid, vppbid, ppid, ldid })),
        plain((any::<(u8, u8)>(), nibble()).prop_map(|((vcsid, vppbid), option)| UnbindVppb { vcsid, vppbid, option })),
        plain(any::<(u8, u8, u32, [u8; 32])>().prop_map(|(vcsid, vppbid, error_type, tlp_header)| GenerateAer {
            vcsid,
            vppbid,
            error_type,
            tlp_header,
        })),
        // MLD port
        plain((any::<(u8, u8)>(), blob(64)).prop_map(|((ppid, mctp_type), message)| TunnelRequest {
            ppid,
            mctp_type,
            message,
        })),
        plain((any::<u8>(), blob(64)).prop_map(|(mctp_type, message)| TunnelResponse { mctp_type, message })),
        plain((any::<(u8, u8, bool, u16)>(), nibble(), nibble(), any::<[u8; 4]>()).prop_map(
            |((ppid, register, write, ldid), ext_register, fdbe, data)| LdConfigRequest {
                ppid,
                register,
                ext_register,
                fdbe,
                write,
                ldid,
                data,
            },
        )),
        plain(any::<[u8; 4]>().prop_map(|data| LdConfigResponse { data })),
        plain((any::<(u8, bool, u16, u64)>(), nibble(), nibble(), blob(128)).prop_map(
            |((ppid, write, ldid, offset), fdbe, ldbe, data)| LdMemoryRequest {
                ppid,
                fdbe,
                ldbe,
                write,
                ldid,
                offset,
                data,
            },
        )),
        plain(blob(128).prop_map(|data| LdMemoryResponse { data })),
        // MLD component
        plain((any::<(u64, u16)>(), telemetry()).prop_map(|((memory_size, ld_count), telemetry)| LdInfo {
            memory_size,
            ld_count,
            telemetry,
        })),
        plain(ld_alloc_block()),
        plain(any::<(u8, u8)>().prop_map(|(start, limit)| GetLdAllocRequest { start, limit })),
        plain((any::<[u8; 3]>(), bounded(ld_alloc_block(), MAX_LDS)).prop_map(
            |([total, granularity, start], blocks)| GetLdAllocResponse { total, granularity, start, blocks },
        )),
        plain((any::<u8>(), bounded(ld_alloc_block(), MAX_LDS)).prop_map(|(start, blocks)| SetLdAllocRequest {
            start,
            blocks,
        })),
        plain((any::<u8>(), bounded(ld_alloc_block(), MAX_LDS)).prop_map(|(start, blocks)| SetLdAllocResponse {
            start,
            blocks,
        })),
        plain((telemetry(), any::<(u8, u8, u8, u16, u8)>()).prop_map(
            |(enable, (moderate_pct, severe_pct, sample_interval, req_cmp_basis, completion_interval))| QosControl {
                enable,
                moderate_pct,
                severe_pct,
                sample_interval,
                req_cmp_basis,
                completion_interval,
            },
        )),
        plain(any::<u8>().prop_map(|backpressure_avg_pct| QosStatus { backpressure_avg_pct })),
        plain(any::<(u8, u8)>().prop_map(|(count, start)| GetQosAllocRequest { count, start })),
        plain((any::<u8>(), bounded(any::<u8>(), MAX_LDS)).prop_map(|(start, fractions)| QosAlloc { start, fractions })),
        plain(any::<(u8, u8)>().prop_map(|(count, start)| GetQosLimitRequest { count, start })),
        plain((any::<u8>(), bounded(any::<u8>(), MAX_LDS)).prop_map(|(start, fractions)| QosLimit { start, fractions })),
        // Information and status
        plain(any::<(u16, u16, u16, u16, u64, u8)>().prop_map(
            |(vid, did, svid, ssid, serial, max_msg_size_exp)| Identify { vid, did, svid, ssid, serial, max_msg_size_exp },
        )),
        plain(any::<u8>().prop_map(|limit| MessageLimit { limit })),
        plain((any::<bool>(), 0u8..=BackgroundStatus::MAX_PERCENT, any::<(u16, u16, u16)>()).prop_map(
            |(running, percent, (opcode, return_code, ext_status))| BackgroundStatus {
                running,
                percent,
                opcode,
                return_code,
                ext_status,
            },
        )),
    ];

    Union::new(arms)
}

#[test]
fn strategies_cover_every_kind() {
    let mut runner = TestRunner::deterministic();
    let mut seen = std::collections::HashSet::new();
    let strategy = any_payload_with_context();
    for _ in 0..4096 {
        let (payload, _) = strategy.new_tree(&mut runner).expect("strategy").current();
        seen.insert(payload.kind());
    }

    assert_eq!(seen.len(), Kind::COUNT);
}
