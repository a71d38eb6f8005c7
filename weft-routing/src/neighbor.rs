//
// Copyright (c) The Weft Project Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::{BTreeMap, btree_map};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc::Sender;
use weft_utils::addr::NodeAddr;
use weft_utils::task::TimeoutTask;

use crate::debug::Debug;
use crate::tasks;
use crate::tasks::messages::input::NbrTimeoutMsg;

// Direct adjacency of the local node.
//
// Entries come from the topology file at startup or from the first hello
// heard from an unknown endpoint. `last_hello` stays unset until a hello is
// actually received; the expiry task armed at creation time gives such
// first-contact entries one full timeout interval of grace.
#[derive(Debug)]
pub struct Neighbor {
    // Neighbor's endpoint.
    pub addr: NodeAddr,
    // Time when the most recent hello was received from this neighbor.
    pub last_hello: Option<DateTime<Utc>>,
    // Neighbor's expiry timer (refreshed whenever a hello is received).
    pub timeout_task: TimeoutTask,
}

// ===== impl Neighbor =====

impl Neighbor {
    pub(crate) fn new(
        addr: NodeAddr,
        timeout: Duration,
        nbr_timeoutp: &Sender<NbrTimeoutMsg>,
    ) -> Neighbor {
        Debug::NbrCreate(&addr).log();

        let timeout_task = tasks::nbr_timeout(addr, timeout, nbr_timeoutp);

        Neighbor {
            addr,
            last_hello: None,
            timeout_task,
        }
    }
}

// ===== global functions =====

// Refresh the entry for a neighbor a hello was heard from, creating it when
// the endpoint is unknown. Returns whether a new adjacency was formed.
pub(crate) fn update(
    neighbors: &mut BTreeMap<NodeAddr, Neighbor>,
    addr: NodeAddr,
    timeout: Duration,
    nbr_timeoutp: &Sender<NbrTimeoutMsg>,
) -> bool {
    match neighbors.entry(addr) {
        btree_map::Entry::Occupied(o) => {
            let nbr = o.into_mut();

            // Update last heard time.
            nbr.last_hello = Some(Utc::now());
            // Push the expiry deadline back.
            nbr.timeout_task.restart();

            false
        }
        btree_map::Entry::Vacant(v) => {
            let mut nbr = Neighbor::new(addr, timeout, nbr_timeoutp);
            nbr.last_hello = Some(Utc::now());
            v.insert(nbr);

            true
        }
    }
}
