//
// Copyright (c) The Weft Project Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Overlay node endpoint.
///
/// An (IPv4 address, UDP port) pair is the stable identity of a node
/// throughout the protocol: it appears in every packet header, in LSP
/// payloads, and in the topology file. Its textual form is `A.B.C.D,P`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub struct NodeAddr {
    pub ip: Ipv4Addr,
    pub port: u16,
}

// Error type used when parsing the textual form of a node endpoint.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NodeAddrParseError(String);

// ===== impl NodeAddr =====

impl NodeAddr {
    pub const fn new(ip: Ipv4Addr, port: u16) -> NodeAddr {
        NodeAddr { ip, port }
    }

    // Socket address used when sending datagrams to this node.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(self.ip, self.port))
    }
}

impl std::fmt::Display for NodeAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.ip, self.port)
    }
}

impl FromStr for NodeAddr {
    type Err = NodeAddrParseError;

    fn from_str(s: &str) -> Result<NodeAddr, NodeAddrParseError> {
        let (ip, port) = s
            .split_once(',')
            .ok_or_else(|| NodeAddrParseError(s.to_owned()))?;
        let ip = ip.parse().map_err(|_| NodeAddrParseError(s.to_owned()))?;
        let port =
            port.parse().map_err(|_| NodeAddrParseError(s.to_owned()))?;
        Ok(NodeAddr { ip, port })
    }
}

// ===== impl NodeAddrParseError =====

impl std::fmt::Display for NodeAddrParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid node endpoint: {}", self.0)
    }
}

impl std::error::Error for NodeAddrParseError {}
