//
// Copyright (c) The Weft Project Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;

use const_addrs::ip4;
use weft_routing::topology::{self, TopologyError};
use weft_utils::addr::NodeAddr;

const TOPOLOGY: &str = "\
1.0.0.0,1 2.0.0.0,2 3.0.0.0,3
2.0.0.0,2 1.0.0.0,1 3.0.0.0,3 4.0.0.0,4
3.0.0.0,3 1.0.0.0,1 2.0.0.0,2 5.0.0.0,5
4.0.0.0,4 2.0.0.0,2 5.0.0.0,5
5.0.0.0,5 3.0.0.0,3 4.0.0.0,4
";

//
// Tests.
//

#[test]
fn test_parse() {
    let nodes = topology::parse(TOPOLOGY).unwrap();
    assert_eq!(nodes.len(), 5);

    let node = &nodes[0];
    assert_eq!(node.id, 1);
    assert_eq!(node.addr, NodeAddr::new(ip4!("1.0.0.0"), 1));
    assert_eq!(
        node.neighbors,
        vec![
            NodeAddr::new(ip4!("2.0.0.0"), 2),
            NodeAddr::new(ip4!("3.0.0.0"), 3),
        ]
    );

    let node = &nodes[4];
    assert_eq!(node.id, 5);
    assert_eq!(node.addr, NodeAddr::new(ip4!("5.0.0.0"), 5));
}

// Node ids come from line numbers, blank lines included.
#[test]
fn test_parse_blank_lines() {
    let data = "1.0.0.0,1 2.0.0.0,2\n\n2.0.0.0,2 1.0.0.0,1\n";
    let nodes = topology::parse(data).unwrap();
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[0].id, 1);
    assert_eq!(nodes[1].id, 3);
}

#[test]
fn test_parse_invalid_token() {
    let data = "1.0.0.0,1 2.0.0.0,2\n2.0.0.0,2 bogus\n";
    match topology::parse(data) {
        Err(TopologyError::InvalidToken(line, token)) => {
            assert_eq!(line, 2);
            assert_eq!(token, "bogus");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_local_entry() {
    let nodes = topology::parse(TOPOLOGY).unwrap();

    let local_addrs = [ip4!("3.0.0.0"), Ipv4Addr::LOCALHOST];
    let node = topology::local_entry(&nodes, &local_addrs, 3).unwrap();
    assert_eq!(node.id, 3);

    // Right address, wrong port.
    assert!(topology::local_entry(&nodes, &local_addrs, 9).is_none());

    // Unknown address.
    let local_addrs = [ip4!("9.0.0.0")];
    assert!(topology::local_entry(&nodes, &local_addrs, 3).is_none());
}

#[test]
fn test_load_missing_file() {
    match topology::load("/nonexistent/topology.txt") {
        Err(TopologyError::Read(..)) => (),
        other => panic!("unexpected result: {other:?}"),
    }
}
