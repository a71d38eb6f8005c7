//
// Copyright (c) The Weft Project Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;
use std::time::Duration;

use chrono::Utc;
use weft_routing::lsdb::{Lsdb, Lsp};
use weft_routing::spf;
use weft_utils::addr::NodeAddr;

const STALE_AGE: Duration = Duration::from_secs(6);

//
// Helper functions.
//
// The tests run over this topology (unit edge weights):
//
//       2 - 4
//      / \   \
//     1 - 3 - 5
//

fn addr(n: u8) -> NodeAddr {
    NodeAddr::new(Ipv4Addr::new(n, 0, 0, 0), n as u16)
}

fn install(lsdb: &mut Lsdb, origin: u8, neighbors: &[u8]) {
    let lsp = Lsp {
        origin_id: origin as u32,
        origin: addr(origin),
        seq_no: 0,
        neighbors: neighbors.iter().map(|&n| addr(n)).collect(),
        rcvd_time: Utc::now(),
    };
    lsdb.install(lsp, STALE_AGE);
}

fn full_lsdb() -> Lsdb {
    let mut lsdb = Lsdb::default();
    install(&mut lsdb, 2, &[1, 3, 4]);
    install(&mut lsdb, 3, &[1, 2, 5]);
    install(&mut lsdb, 4, &[2, 5]);
    install(&mut lsdb, 5, &[3, 4]);
    lsdb
}

//
// Tests.
//

#[test]
fn test_steady_state() {
    let lsdb = full_lsdb();
    let direct = [addr(2), addr(3)];

    let routes = spf::compute(addr(1), &direct, &lsdb);
    assert_eq!(routes.len(), 5);

    // The local entry reaches itself at no cost.
    let local = &routes[&addr(1)];
    assert_eq!((local.nexthop, local.cost), (addr(1), 0));

    // Direct neighbors are their own next hop.
    assert_eq!((routes[&addr(2)].nexthop, routes[&addr(2)].cost), (addr(2), 1));
    assert_eq!((routes[&addr(3)].nexthop, routes[&addr(3)].cost), (addr(3), 1));

    // Two-hop destinations each have a single shortest path here.
    assert_eq!((routes[&addr(4)].nexthop, routes[&addr(4)].cost), (addr(2), 2));
    assert_eq!((routes[&addr(5)].nexthop, routes[&addr(5)].cost), (addr(3), 2));

    for route in routes.values() {
        assert!(route.in_spf);
        if route.dest != addr(1) {
            assert!(direct.contains(&route.nexthop));
        }
    }
}

// Node 3 went down: its neighbors evicted it and re-originated, so the
// remaining advertisements no longer mention it.
#[test]
fn test_node_failure() {
    let mut lsdb = Lsdb::default();
    install(&mut lsdb, 2, &[1, 4]);
    install(&mut lsdb, 4, &[2, 5]);
    install(&mut lsdb, 5, &[4]);
    let direct = [addr(2)];

    let routes = spf::compute(addr(1), &direct, &lsdb);
    assert_eq!(routes.len(), 4);
    assert!(!routes.contains_key(&addr(3)));

    assert_eq!((routes[&addr(2)].nexthop, routes[&addr(2)].cost), (addr(2), 1));
    assert_eq!((routes[&addr(4)].nexthop, routes[&addr(4)].cost), (addr(2), 2));
    assert_eq!((routes[&addr(5)].nexthop, routes[&addr(5)].cost), (addr(2), 3));
}

// Rebuilding without any intervening state change produces the same table.
#[test]
fn test_idempotence() {
    let lsdb = full_lsdb();
    let direct = [addr(2), addr(3)];

    let first = spf::compute(addr(1), &direct, &lsdb);
    let second = spf::compute(addr(1), &direct, &lsdb);
    assert_eq!(first, second);
}

// A reachable node whose LSP hasn't arrived yet contributes no edges; its
// subtree is simply left out of this rebuild.
#[test]
fn test_missing_lsp() {
    let mut lsdb = Lsdb::default();
    install(&mut lsdb, 2, &[1, 3, 4]);
    let direct = [addr(2), addr(3)];

    let routes = spf::compute(addr(1), &direct, &lsdb);

    // Node 3 is still a direct neighbor, but without its LSP node 5 is
    // unreachable.
    assert_eq!((routes[&addr(3)].nexthop, routes[&addr(3)].cost), (addr(3), 1));
    assert_eq!((routes[&addr(4)].nexthop, routes[&addr(4)].cost), (addr(2), 2));
    assert!(!routes.contains_key(&addr(5)));
}

// With no neighbors at all the table still carries the local entry.
#[test]
fn test_isolated_node() {
    let lsdb = Lsdb::default();

    let routes = spf::compute(addr(1), &[], &lsdb);
    assert_eq!(routes.len(), 1);
    let local = &routes[&addr(1)];
    assert_eq!((local.nexthop, local.cost, local.in_spf), (addr(1), 0, true));
}

// Stale entries in the LSDB may keep advertising an evicted node; SPF
// still reaches it through them, but only through real current edges.
#[test]
fn test_next_hop_is_direct_neighbor() {
    let lsdb = full_lsdb();
    let direct = [addr(2), addr(3)];

    let routes = spf::compute(addr(1), &direct, &lsdb);
    for route in routes.values().filter(|route| route.dest != addr(1)) {
        assert!(direct.contains(&route.nexthop));
    }
}
