//
// Copyright (c) The Weft Project Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::SocketAddr;

use weft_utils::addr::NodeAddr;

use crate::debug::Debug;
use crate::instance::Instance;
use crate::lsdb::Lsp;
use crate::packet::{Packet, PacketHdr, PacketType};
use crate::tasks::messages::output::UdpTxPacketMsg;

// ===== global functions =====

pub(crate) fn send_packet(
    instance: &mut Instance,
    dst: NodeAddr,
    packet: Packet,
) {
    // Log packet being sent.
    Debug::PacketTx(&dst, &packet).log();

    // Update statistics.
    instance.state.statistics.update(packet.hdr.pkt_type, true);

    // Send packet.
    let msg = UdpTxPacketMsg {
        dst: dst.socket_addr(),
        packet,
    };
    let _ = instance.state.net.udp_tx_packetp.send(msg);
}

// Assert liveness to every current neighbor.
pub(crate) fn send_hello_all(instance: &mut Instance) {
    let local = instance.config.addr;
    let node_id = instance.config.node_id;
    let seq_no = instance.state.seq_no;

    let neighbors =
        instance.state.neighbors.keys().copied().collect::<Vec<_>>();
    for nbr in neighbors {
        let hdr =
            PacketHdr::new(PacketType::Hello, node_id, seq_no, 1, local, nbr);
        send_packet(instance, nbr, Packet::new(hdr));
    }
}

// Originate a new version of the local advertisement and send it to every
// current neighbor. Each origination consumes a sequence number.
pub(crate) fn send_own_lsp(instance: &mut Instance) {
    let local = instance.config.addr;
    let node_id = instance.config.node_id;
    let ttl = instance.config.lsp_ttl;

    let seq_no = instance.state.seq_no;
    instance.state.seq_no += 1;

    let neighbors =
        instance.state.neighbors.keys().copied().collect::<Vec<_>>();
    let payload = Lsp::encode_payload(&neighbors);
    for nbr in neighbors {
        let hdr =
            PacketHdr::new(PacketType::Lsp, node_id, seq_no, ttl, local, nbr);
        let packet = Packet::with_payload(hdr, payload.clone());
        send_packet(instance, nbr, packet);
    }
}

// Forward a freshly accepted LSP to every neighbor except the one it was
// received from. The TTL burns down by one per hop; once it would reach
// zero the advertisement travels no further.
pub(crate) fn flood(
    instance: &mut Instance,
    lsp: &Lsp,
    rcvd_ttl: u32,
    from: SocketAddr,
) {
    if rcvd_ttl <= 1 {
        return;
    }
    let ttl = rcvd_ttl - 1;

    let neighbors =
        instance.state.neighbors.keys().copied().collect::<Vec<_>>();
    for nbr in neighbors {
        if nbr.socket_addr() == from {
            continue;
        }
        send_packet(instance, nbr, lsp.to_packet(ttl, nbr));
    }
}

// Answer a consumed trace probe so the tracer learns this hop's identity.
pub(crate) fn send_trace_reply(instance: &mut Instance, tracer: NodeAddr) {
    Debug::TraceReply(&tracer).log();

    let hdr = PacketHdr::new(
        PacketType::Trace,
        instance.config.node_id,
        0,
        0,
        instance.config.addr,
        tracer,
    );
    send_packet(instance, tracer, Packet::new(hdr));
}

// Pass a live trace probe along the computed path toward its destination.
pub(crate) fn forward_trace(
    instance: &mut Instance,
    mut hdr: PacketHdr,
    nexthop: NodeAddr,
) {
    Debug::TraceForward(&hdr.dst, &nexthop).log();

    hdr.ttl -= 1;
    send_packet(instance, nexthop, Packet::new(hdr));
}
