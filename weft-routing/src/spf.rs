//
// Copyright (c) The Weft Project Contributors
//
// SPDX-License-Identifier: MIT
//

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BinaryHeap, btree_map};

use derive_new::new;
use weft_utils::addr::NodeAddr;

use crate::lsdb::Lsdb;
use crate::route::Route;

// Shortest-path candidate. Candidates order by cost first, then by
// endpoint, so equal-cost vertices pop in a stable order and rebuilds are
// reproducible.
#[derive(Clone, Copy, Debug, Eq, PartialEq, new)]
struct Candidate {
    cost: u32,
    dest: NodeAddr,
}

// ===== impl Candidate =====

impl Ord for Candidate {
    fn cmp(&self, other: &Candidate) -> Ordering {
        self.cost
            .cmp(&other.cost)
            .then_with(|| self.dest.cmp(&other.dest))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Candidate) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// ===== global functions =====

// Compute a forwarding table over the graph induced by the local adjacency
// set and the link-state database, using unit edge weights.
//
// The candidate heap carries no decrease-key operation: a cost update
// simply pushes a fresh candidate, and entries made obsolete that way are
// filtered out by the `in_spf` flag when popped.
pub fn compute(
    local: NodeAddr,
    direct: &[NodeAddr],
    lsdb: &Lsdb,
) -> BTreeMap<NodeAddr, Route> {
    let mut routes = BTreeMap::new();
    let mut queue = BinaryHeap::new();

    // The root reaches itself at no cost.
    routes.insert(local, Route::new(local, local, 0, false));
    queue.push(Reverse(Candidate::new(0, local)));

    while let Some(Reverse(candidate)) = queue.pop() {
        let Some(route) = routes.get_mut(&candidate.dest) else {
            continue;
        };
        if route.in_spf {
            continue;
        }
        route.in_spf = true;
        let (parent_cost, parent_nexthop) = (route.cost, route.nexthop);

        // The local adjacency set provides the root's edges; every other
        // vertex contributes whatever its latest advertisement lists. A
        // vertex whose LSP hasn't been learned yet leaves its subtree out
        // of this rebuild.
        let links = if candidate.dest == local {
            direct
        } else {
            lsdb.neighbors_of(candidate.dest).unwrap_or_default()
        };

        for &link in links {
            let cost = parent_cost + 1;
            // First hop toward a direct neighbor is the neighbor itself;
            // deeper vertices inherit the next hop of their parent.
            let nexthop = if candidate.dest == local {
                link
            } else {
                parent_nexthop
            };

            match routes.entry(link) {
                btree_map::Entry::Vacant(v) => {
                    v.insert(Route::new(link, nexthop, cost, false));
                }
                btree_map::Entry::Occupied(mut o) => {
                    let route = o.get_mut();
                    if route.in_spf || route.cost <= cost {
                        continue;
                    }
                    route.cost = cost;
                    route.nexthop = nexthop;
                }
            }
            queue.push(Reverse(Candidate::new(cost, link)));
        }
    }

    routes
}
