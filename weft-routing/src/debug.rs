//
// Copyright (c) The Weft Project Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::SocketAddr;

use tracing::{debug, debug_span};
use weft_utils::addr::NodeAddr;

use crate::lsdb::Lsp;
use crate::packet::{DecodeError, Packet};

// Routing debug messages.
#[derive(Debug)]
pub enum Debug<'a> {
    InstanceCreate,
    InstanceStart,
    PacketRx(&'a SocketAddr, &'a Result<Packet, DecodeError>),
    PacketTx(&'a NodeAddr, &'a Packet),
    NbrCreate(&'a NodeAddr),
    NbrTimeout(&'a NodeAddr),
    LspInstall(&'a Lsp),
    LspDiscard(&'a Lsp),
    LspPurge(&'a NodeAddr),
    TopologyChange,
    SpfRun(usize),
    TraceReply(&'a NodeAddr),
    TraceForward(&'a NodeAddr, &'a NodeAddr),
}

// ===== impl Debug =====

impl Debug<'_> {
    // Log debug message using the tracing API.
    pub(crate) fn log(&self) {
        match self {
            Debug::InstanceCreate | Debug::InstanceStart => {
                debug!("{}", self);
            }
            Debug::PacketRx(src, packet) => {
                debug_span!("network").in_scope(|| {
                    debug_span!("input", source = %src).in_scope(|| {
                        let data = serde_json::to_string(&packet).unwrap();
                        debug!(%data, "{}", self);
                    });
                });
            }
            Debug::PacketTx(dst, packet) => {
                debug_span!("network").in_scope(|| {
                    debug_span!("output", destination = %dst).in_scope(|| {
                        let data = serde_json::to_string(&packet).unwrap();
                        debug!(%data, "{}", self);
                    });
                });
            }
            Debug::NbrCreate(addr) | Debug::NbrTimeout(addr) => {
                debug!(address = %addr, "{}", self);
            }
            Debug::LspInstall(lsp) | Debug::LspDiscard(lsp) => {
                debug!(origin = %lsp.origin, seq_no = %lsp.seq_no, "{}", self);
            }
            Debug::LspPurge(addr) => {
                debug!(origin = %addr, "{}", self);
            }
            Debug::TopologyChange => {
                debug!("{}", self);
            }
            Debug::SpfRun(routes) => {
                debug!(%routes, "{}", self);
            }
            Debug::TraceReply(addr) => {
                debug!(tracer = %addr, "{}", self);
            }
            Debug::TraceForward(dst, nexthop) => {
                debug!(destination = %dst, %nexthop, "{}", self);
            }
        }
    }
}

impl std::fmt::Display for Debug<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Debug::InstanceCreate => {
                write!(f, "instance created")
            }
            Debug::InstanceStart => {
                write!(f, "starting instance")
            }
            Debug::PacketRx(..) | Debug::PacketTx(..) => {
                write!(f, "packet")
            }
            Debug::NbrCreate(..) => {
                write!(f, "neighbor created")
            }
            Debug::NbrTimeout(..) => {
                write!(f, "neighbor timed out")
            }
            Debug::LspInstall(..) => {
                write!(f, "LSP installed")
            }
            Debug::LspDiscard(..) => {
                write!(f, "stale LSP discarded")
            }
            Debug::LspPurge(..) => {
                write!(f, "LSP purged")
            }
            Debug::TopologyChange => {
                write!(f, "topology change")
            }
            Debug::SpfRun(..) => {
                write!(f, "SPF computation completed")
            }
            Debug::TraceReply(..) => {
                write!(f, "trace consumed, replying")
            }
            Debug::TraceForward(..) => {
                write!(f, "forwarding trace")
            }
        }
    }
}
