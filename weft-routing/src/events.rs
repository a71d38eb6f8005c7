//
// Copyright (c) The Weft Project Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::SocketAddr;

use weft_utils::addr::NodeAddr;

use crate::debug::Debug;
use crate::error::Error;
use crate::instance::Instance;
use crate::lsdb::{Lsp, LspInstallOutcome};
use crate::packet::{DecodeError, Packet, PacketType};
use crate::{neighbor, output, route, spf, tasks};

// ===== UDP packet receipt =====

pub(crate) fn process_packet(
    instance: &mut Instance,
    src: SocketAddr,
    packet: Result<Packet, DecodeError>,
) {
    // Log received packet.
    Debug::PacketRx(&src, &packet).log();

    let packet = match packet {
        Ok(packet) => packet,
        Err(error) => {
            instance.state.statistics.bad_packets_rcvd += 1;
            Error::PacketDecodeError(error).log();
            return;
        }
    };

    // Update statistics.
    instance.state.statistics.update(packet.hdr.pkt_type, false);

    match packet.hdr.pkt_type {
        PacketType::Hello => process_hello(instance, &packet),
        PacketType::Lsp => process_lsp(instance, src, packet),
        PacketType::Trace => process_trace(instance, &packet),
        // Acknowledgements are consumed by the tracer client only.
        PacketType::Ack => (),
    }
}

fn process_hello(instance: &mut Instance, packet: &Packet) {
    let addr = packet.hdr.src;

    // Update or create the neighbor entry.
    let is_new = neighbor::update(
        &mut instance.state.neighbors,
        addr,
        instance.config.nbr_timeout,
        &instance.tx.protocol_input.nbr_timeout,
    );

    // A node heard for the first time becomes a direct adjacency, which
    // changes the local advertisement.
    if is_new {
        output::send_own_lsp(instance);
        topology_change(instance);
    }
}

fn process_lsp(instance: &mut Instance, src: SocketAddr, packet: Packet) {
    // Replayed copies of the local advertisement are never reinstalled;
    // their sequence numbers would race the live counter.
    if packet.hdr.src == instance.config.addr {
        return;
    }

    let lsp = match Lsp::from_packet(&packet) {
        Ok(lsp) => lsp,
        Err(error) => {
            instance.state.statistics.bad_packets_rcvd += 1;
            Error::PacketDecodeError(error).log();
            return;
        }
    };

    let stale_age = instance.config.lsp_stale_age;
    match instance.state.lsdb.install(lsp.clone(), stale_age) {
        LspInstallOutcome::Installed | LspInstallOutcome::Replaced => {
            Debug::LspInstall(&lsp).log();
            output::flood(instance, &lsp, packet.hdr.ttl, src);
            topology_change(instance);
        }
        LspInstallOutcome::Stale => {
            Debug::LspDiscard(&lsp).log();
        }
    }
}

fn process_trace(instance: &mut Instance, packet: &Packet) {
    let hdr = &packet.hdr;

    // An exhausted TTL means this node is the hop the probe was meant to
    // reveal.
    if hdr.ttl == 0 {
        output::send_trace_reply(instance, hdr.src);
        return;
    }

    // Probes are never forwarded past their destination.
    if hdr.dst == instance.config.addr {
        return;
    }

    let nexthop = match instance.state.routes.get(&hdr.dst) {
        Some(route) => route.nexthop,
        None => {
            Error::NexthopNotFound(hdr.dst).log();
            return;
        }
    };
    output::forward_trace(instance, hdr.clone(), nexthop);
}

// ===== hello interval =====

pub(crate) fn process_hello_interval(instance: &mut Instance) {
    output::send_hello_all(instance);
    output::send_own_lsp(instance);
}

// ===== neighbor timeout =====

pub(crate) fn process_nbr_timeout(instance: &mut Instance, addr: NodeAddr) {
    if instance.state.neighbors.remove(&addr).is_none() {
        return;
    }
    Debug::NbrTimeout(&addr).log();

    // The evicted node's edges leave the graph with it.
    if instance.state.lsdb.remove_by_origin(addr).is_some() {
        Debug::LspPurge(&addr).log();
    }

    output::send_own_lsp(instance);
    topology_change(instance);
}

// ===== SPF delay timeout =====

pub(crate) fn process_spf_delay(instance: &mut Instance) {
    instance.state.spf_delay_task = None;

    let direct =
        instance.state.neighbors.keys().copied().collect::<Vec<_>>();
    let routes =
        spf::compute(instance.config.addr, &direct, &instance.state.lsdb);
    Debug::SpfRun(routes.len()).log();

    // Install the new table wholesale; lookups only ever see a table that
    // completed a full computation.
    instance.state.routes = routes;
    route::print(instance.config.addr, &instance.state.routes);
}

// ===== helper functions =====

// Restart the quiescence window. The forwarding table is rebuilt only once
// the topology has stopped changing for a full delay period, so bursts of
// hellos and LSPs cost a single rebuild.
fn topology_change(instance: &mut Instance) {
    Debug::TopologyChange.log();

    match instance.state.spf_delay_task.as_mut() {
        Some(task) => task.restart(),
        None => {
            instance.state.spf_delay_task = Some(tasks::spf_delay(
                instance.config.spf_delay,
                &instance.tx.protocol_input.spf_delay,
            ));
        }
    }
}
