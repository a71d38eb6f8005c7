//
// Copyright (c) The Weft Project Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;

use derive_new::new;
use weft_utils::addr::NodeAddr;

// Forwarding table entry.
//
// `in_spf` is meaningful during the SPF computation only: it marks vertices
// whose shortest path is final. Every entry of an installed table has it
// set.
#[derive(Clone, Copy, Debug, Eq, PartialEq, new)]
pub struct Route {
    pub dest: NodeAddr,
    pub nexthop: NodeAddr,
    pub cost: u32,
    pub in_spf: bool,
}

// ===== global functions =====

// Dump the forwarding table to stdout, one "destination nexthop" line per
// remote destination. This output is part of the node's observable
// contract, so it bypasses the tracing layer.
pub(crate) fn print(local: NodeAddr, routes: &BTreeMap<NodeAddr, Route>) {
    println!("Forwarding Table:");
    for route in routes.values().filter(|route| route.dest != local) {
        println!("{} {}", route.dest, route.nexthop);
    }
    println!();
}
