//
// Copyright (c) The Weft Project Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use weft_routing::lsdb::{Lsdb, Lsp, LspInstallOutcome};
use weft_routing::packet::{
    DecodeError, Packet, PacketHdr, PacketType,
};
use weft_utils::addr::NodeAddr;

const STALE_AGE: Duration = Duration::from_secs(6);

//
// Helper functions.
//

fn addr(n: u8) -> NodeAddr {
    NodeAddr::new(Ipv4Addr::new(n, 0, 0, 0), n as u16)
}

fn lsp(origin: u8, seq_no: u32, neighbors: &[u8]) -> Lsp {
    Lsp {
        origin_id: origin as u32,
        origin: addr(origin),
        seq_no,
        neighbors: neighbors.iter().map(|&n| addr(n)).collect(),
        rcvd_time: Utc::now(),
    }
}

fn lsp_packet(origin: u8, seq_no: u32, ttl: u32, payload: &'static [u8]) -> Packet {
    let hdr = PacketHdr::new(
        PacketType::Lsp,
        origin as u32,
        seq_no,
        ttl,
        addr(origin),
        addr(1),
    );
    Packet::with_payload(hdr, Bytes::from_static(payload))
}

//
// Tests.
//

#[test]
fn test_install_new_origin() {
    let mut lsdb = Lsdb::default();

    let outcome = lsdb.install(lsp(2, 0, &[1, 3]), STALE_AGE);
    assert_eq!(outcome, LspInstallOutcome::Installed);
    assert_eq!(lsdb.get(2).unwrap().seq_no, 0);
    assert_eq!(
        lsdb.neighbors_of(addr(2)),
        Some([addr(1), addr(3)].as_slice())
    );
}

#[test]
fn test_replace_greater_seq_no() {
    let mut lsdb = Lsdb::default();

    lsdb.install(lsp(2, 3, &[1, 3]), STALE_AGE);
    let outcome = lsdb.install(lsp(2, 4, &[1]), STALE_AGE);
    assert_eq!(outcome, LspInstallOutcome::Replaced);
    assert_eq!(lsdb.get(2).unwrap().seq_no, 4);
    assert_eq!(lsdb.neighbors_of(addr(2)), Some([addr(1)].as_slice()));
}

#[test]
fn test_drop_equal_seq_no() {
    let mut lsdb = Lsdb::default();

    lsdb.install(lsp(2, 3, &[1, 3]), STALE_AGE);
    let outcome = lsdb.install(lsp(2, 3, &[1]), STALE_AGE);
    assert_eq!(outcome, LspInstallOutcome::Stale);
    assert_eq!(
        lsdb.neighbors_of(addr(2)),
        Some([addr(1), addr(3)].as_slice())
    );
}

#[test]
fn test_drop_lower_seq_no() {
    let mut lsdb = Lsdb::default();

    lsdb.install(lsp(2, 3, &[1, 3]), STALE_AGE);
    let outcome = lsdb.install(lsp(2, 2, &[1]), STALE_AGE);
    assert_eq!(outcome, LspInstallOutcome::Stale);
    assert_eq!(lsdb.get(2).unwrap().seq_no, 3);
}

// The stored sequence number never decreases while the origin keeps
// refreshing its advertisement.
#[test]
fn test_seq_no_monotonic() {
    let mut lsdb = Lsdb::default();

    for seq_no in [0, 5, 2, 5, 7, 6] {
        lsdb.install(lsp(2, seq_no, &[1]), STALE_AGE);
        let stored = lsdb.get(2).unwrap().seq_no;
        assert!(stored >= seq_no);
    }
    assert_eq!(lsdb.get(2).unwrap().seq_no, 7);
}

// A lower sequence number reclaims the origin's slot once the stored entry
// has gone unrefreshed past the staleness age, which is how a restarted
// node rejoins.
#[test]
fn test_replace_after_restart() {
    let mut lsdb = Lsdb::default();
    let stale_age = Duration::from_millis(50);

    lsdb.install(lsp(2, 100, &[1, 3]), stale_age);
    std::thread::sleep(Duration::from_millis(80));

    let outcome = lsdb.install(lsp(2, 0, &[1]), stale_age);
    assert_eq!(outcome, LspInstallOutcome::Replaced);
    assert_eq!(lsdb.get(2).unwrap().seq_no, 0);
}

#[test]
fn test_remove_by_origin() {
    let mut lsdb = Lsdb::default();

    lsdb.install(lsp(2, 1, &[1, 3]), STALE_AGE);
    lsdb.install(lsp(3, 1, &[1, 2]), STALE_AGE);

    assert!(lsdb.remove_by_origin(addr(2)).is_some());
    assert!(lsdb.get(2).is_none());
    assert_eq!(lsdb.neighbors_of(addr(2)), None);
    assert!(lsdb.get(3).is_some());

    assert!(lsdb.remove_by_origin(addr(2)).is_none());
}

#[test]
fn test_parse_lsp_payload() {
    let packet = lsp_packet(2, 7, 10, b"1.0.0.0,1 3.0.0.0,3 ");
    let lsp = Lsp::from_packet(&packet).unwrap();

    assert_eq!(lsp.origin_id, 2);
    assert_eq!(lsp.origin, addr(2));
    assert_eq!(lsp.seq_no, 7);
    assert_eq!(lsp.neighbors, vec![addr(1), addr(3)]);
}

#[test]
fn test_parse_empty_lsp_payload() {
    let packet = lsp_packet(2, 7, 10, b"");
    let lsp = Lsp::from_packet(&packet).unwrap();
    assert!(lsp.neighbors.is_empty());
}

#[test]
fn test_parse_invalid_lsp_payload() {
    let packet = lsp_packet(2, 7, 10, b"1.0.0.0,1 bogus ");
    assert_eq!(
        Lsp::from_packet(&packet),
        Err(DecodeError::InvalidLspPayload("bogus".to_owned()))
    );
}

#[test]
fn test_payload_round_trip() {
    let neighbors = [addr(2), addr(3)];
    let payload = Lsp::encode_payload(&neighbors);
    assert_eq!(&payload[..], b"2.0.0.0,2 3.0.0.0,3 ");

    let packet = Packet::with_payload(
        PacketHdr::new(PacketType::Lsp, 1, 0, 10, addr(1), addr(2)),
        payload,
    );
    let lsp = Lsp::from_packet(&packet).unwrap();
    assert_eq!(lsp.neighbors, neighbors.to_vec());
}
