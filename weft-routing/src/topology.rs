//
// Copyright (c) The Weft Project Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;
use std::path::Path;

use weft_utils::addr::NodeAddr;

// One line of the topology file: a node's own endpoint followed by its
// initial direct neighbors.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TopologyNode {
    // Node id (1-based line number).
    pub id: u32,
    // Node endpoint.
    pub addr: NodeAddr,
    // Initial neighbor endpoints.
    pub neighbors: Vec<NodeAddr>,
}

// Topology file errors, all fatal at startup.
#[derive(Debug)]
pub enum TopologyError {
    Read(std::io::Error),
    InvalidToken(usize, String),
}

// ===== impl TopologyError =====

impl std::fmt::Display for TopologyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TopologyError::Read(..) => {
                write!(f, "failed to read topology file")
            }
            TopologyError::InvalidToken(line, token) => {
                write!(f, "invalid topology entry at line {line}: {token}")
            }
        }
    }
}

impl std::error::Error for TopologyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TopologyError::Read(error) => Some(error),
            _ => None,
        }
    }
}

// ===== global functions =====

// Read and parse a topology file.
pub fn load(
    path: impl AsRef<Path>,
) -> Result<Vec<TopologyNode>, TopologyError> {
    let data = std::fs::read_to_string(path).map_err(TopologyError::Read)?;
    parse(&data)
}

// Parse the whitespace-tokenized topology format: one node per line, each
// token an "A.B.C.D,P" endpoint, the first being the node's own.
pub fn parse(data: &str) -> Result<Vec<TopologyNode>, TopologyError> {
    let mut nodes = Vec::new();

    for (index, line) in data.lines().enumerate() {
        let lineno = index + 1;
        let mut tokens = line.split_whitespace();

        let Some(first) = tokens.next() else {
            continue;
        };
        let addr = parse_token(lineno, first)?;
        let neighbors = tokens
            .map(|token| parse_token(lineno, token))
            .collect::<Result<Vec<_>, _>>()?;

        nodes.push(TopologyNode {
            id: lineno as u32,
            addr,
            neighbors,
        });
    }

    Ok(nodes)
}

// Find the entry describing the local node: the line whose first endpoint
// matches the listening port on one of the local addresses.
pub fn local_entry<'a>(
    nodes: &'a [TopologyNode],
    local_addrs: &[Ipv4Addr],
    port: u16,
) -> Option<&'a TopologyNode> {
    nodes.iter().find(|node| {
        node.addr.port == port && local_addrs.contains(&node.addr.ip)
    })
}

// ===== helper functions =====

fn parse_token(lineno: usize, token: &str) -> Result<NodeAddr, TopologyError> {
    token
        .parse()
        .map_err(|_| TopologyError::InvalidToken(lineno, token.to_owned()))
}
