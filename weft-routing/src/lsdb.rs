//
// Copyright (c) The Weft Project Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::{BTreeMap, btree_map};
use std::fmt::Write;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, TimeDelta, Utc};
use weft_utils::addr::NodeAddr;

use crate::packet::{
    DecodeError, DecodeResult, Packet, PacketHdr, PacketType,
};

// Link-state packet: an originator's advertisement of its current direct
// neighbors.
//
// The payload is UTF-8 text: whitespace-separated "A.B.C.D,P" tokens, one
// per neighbor endpoint of the originator.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Lsp {
    // Originator's id (its line number in the topology file).
    pub origin_id: u32,
    // Originator's endpoint.
    pub origin: NodeAddr,
    // Sequence number; freshness is decided per origin by this value alone.
    pub seq_no: u32,
    // Endpoints the originator currently considers direct neighbors.
    pub neighbors: Vec<NodeAddr>,
    // Time this advertisement was installed locally.
    pub rcvd_time: DateTime<Utc>,
}

// Outcome of offering a received LSP to the database.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LspInstallOutcome {
    // First advertisement seen from this origin.
    Installed,
    // Fresher than the stored advertisement, which it replaced.
    Replaced,
    // Not fresher than the stored advertisement; dropped.
    Stale,
}

// Link-state database: the most recent LSP accepted from each origin.
#[derive(Debug, Default)]
pub struct Lsdb {
    entries: BTreeMap<u32, Lsp>,
}

// ===== impl Lsp =====

impl Lsp {
    // Parse an LSP out of a received type-'L' packet.
    pub fn from_packet(packet: &Packet) -> DecodeResult<Lsp> {
        let text = std::str::from_utf8(&packet.payload).map_err(|_| {
            DecodeError::InvalidLspPayload("not UTF-8".to_owned())
        })?;

        let mut neighbors = Vec::new();
        for token in text.split_whitespace() {
            let addr = token.parse().map_err(|_| {
                DecodeError::InvalidLspPayload(token.to_owned())
            })?;
            neighbors.push(addr);
        }

        Ok(Lsp {
            origin_id: packet.hdr.origin_id,
            origin: packet.hdr.src,
            seq_no: packet.hdr.seq_no,
            neighbors,
            rcvd_time: Utc::now(),
        })
    }

    // Encode a neighbor list in the textual payload format.
    pub fn encode_payload(neighbors: &[NodeAddr]) -> Bytes {
        let mut payload = String::new();
        for nbr in neighbors {
            let _ = write!(payload, "{nbr} ");
        }
        Bytes::from(payload)
    }

    // Rebuild the wire form of this advertisement, preserving the
    // originator's identity and sequence number.
    pub fn to_packet(&self, ttl: u32, dst: NodeAddr) -> Packet {
        let hdr = PacketHdr::new(
            PacketType::Lsp,
            self.origin_id,
            self.seq_no,
            ttl,
            self.origin,
            dst,
        );
        Packet::with_payload(hdr, Lsp::encode_payload(&self.neighbors))
    }
}

// ===== impl Lsdb =====

impl Lsdb {
    pub fn get(&self, origin_id: u32) -> Option<&Lsp> {
        self.entries.get(&origin_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Lsp> {
        self.entries.values()
    }

    // Apply the freshness rule to a received LSP.
    //
    // A strictly greater sequence number always wins. A lower or equal one
    // wins only when the stored copy stopped being refreshed more than
    // `stale_age` ago, which is how a restarted origin (whose sequence
    // counter started over) reclaims its own identity.
    pub fn install(
        &mut self,
        lsp: Lsp,
        stale_age: Duration,
    ) -> LspInstallOutcome {
        match self.entries.entry(lsp.origin_id) {
            btree_map::Entry::Vacant(v) => {
                v.insert(lsp);
                LspInstallOutcome::Installed
            }
            btree_map::Entry::Occupied(mut o) => {
                let cur = o.get();
                let age = Utc::now().signed_duration_since(cur.rcvd_time);
                let stale_age =
                    TimeDelta::from_std(stale_age).unwrap_or(TimeDelta::MAX);

                if lsp.seq_no > cur.seq_no || age > stale_age {
                    o.insert(lsp);
                    LspInstallOutcome::Replaced
                } else {
                    LspInstallOutcome::Stale
                }
            }
        }
    }

    // Drop the advertisement originated by the given endpoint, if any.
    pub fn remove_by_origin(&mut self, addr: NodeAddr) -> Option<Lsp> {
        let origin_id = self
            .entries
            .values()
            .find(|lsp| lsp.origin == addr)
            .map(|lsp| lsp.origin_id)?;
        self.entries.remove(&origin_id)
    }

    // Edges advertised by the given endpoint, if its LSP is known.
    pub fn neighbors_of(&self, addr: NodeAddr) -> Option<&[NodeAddr]> {
        self.entries
            .values()
            .find(|lsp| lsp.origin == addr)
            .map(|lsp| lsp.neighbors.as_slice())
    }
}
