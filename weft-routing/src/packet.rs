//
// Copyright (c) The Weft Project Contributors
//
// SPDX-License-Identifier: MIT
//

use bytes::{Buf, BufMut, Bytes, BytesMut};
use derive_new::new;
use serde::{Deserialize, Serialize};
use weft_utils::addr::NodeAddr;
use weft_utils::bytes::{BytesExt, BytesMutExt, TLS_BUF};

// Fixed header length in octets.
pub const HDR_LEN: usize = 29;

pub type DecodeResult<T> = Result<T, DecodeError>;

// Control datagram kinds, identified by a single character on the wire.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum PacketType {
    Lsp,
    Hello,
    Ack,
    Trace,
}

//
// Control datagram header.
//
// Wire layout (29 octets, all fields big-endian):
//
//   1 octet   type character ('L', 'H', 'A' or 'T')
//   4 octets  origin id
//   4 octets  sequence number
//   4 octets  TTL
//   4 octets  source IPv4 address
//   4 octets  source port
//   4 octets  destination IPv4 address
//   4 octets  destination port
//
// Ports occupy 32 bits on the wire despite fitting in 16; that width is part
// of the compatibility contract with existing peers.
//
#[derive(Clone, Debug, Eq, PartialEq, new)]
#[derive(Deserialize, Serialize)]
pub struct PacketHdr {
    pub pkt_type: PacketType,
    pub origin_id: u32,
    pub seq_no: u32,
    pub ttl: u32,
    pub src: NodeAddr,
    pub dst: NodeAddr,
}

// Control datagram: fixed header plus an opaque payload.
//
// The codec never interprets the payload; LSP-specific parsing belongs to
// the link-state database.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct Packet {
    pub hdr: PacketHdr,
    pub payload: Bytes,
}

// Packet decode errors.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum DecodeError {
    IncompleteHeader(usize),
    UnknownPacketType(u8),
    InvalidPort(u32),
    InvalidLspPayload(String),
}

// ===== impl PacketType =====

impl PacketType {
    pub(crate) const fn as_u8(self) -> u8 {
        match self {
            PacketType::Lsp => b'L',
            PacketType::Hello => b'H',
            PacketType::Ack => b'A',
            PacketType::Trace => b'T',
        }
    }

    pub(crate) fn from_u8(value: u8) -> Option<PacketType> {
        match value {
            b'L' => Some(PacketType::Lsp),
            b'H' => Some(PacketType::Hello),
            b'A' => Some(PacketType::Ack),
            b'T' => Some(PacketType::Trace),
            _ => None,
        }
    }
}

impl std::fmt::Display for PacketType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_u8() as char)
    }
}

// ===== impl PacketHdr =====

impl PacketHdr {
    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(self.pkt_type.as_u8());
        buf.put_u32(self.origin_id);
        buf.put_u32(self.seq_no);
        buf.put_u32(self.ttl);
        buf.put_ipv4(&self.src.ip);
        buf.put_u32(self.src.port.into());
        buf.put_ipv4(&self.dst.ip);
        buf.put_u32(self.dst.port.into());
    }

    fn decode(buf: &mut Bytes) -> DecodeResult<PacketHdr> {
        if buf.remaining() < HDR_LEN {
            return Err(DecodeError::IncompleteHeader(buf.remaining()));
        }

        let pkt_type = buf.get_u8();
        let pkt_type = PacketType::from_u8(pkt_type)
            .ok_or(DecodeError::UnknownPacketType(pkt_type))?;
        let origin_id = buf.get_u32();
        let seq_no = buf.get_u32();
        let ttl = buf.get_u32();
        let src = Self::decode_addr(buf)?;
        let dst = Self::decode_addr(buf)?;

        Ok(PacketHdr {
            pkt_type,
            origin_id,
            seq_no,
            ttl,
            src,
            dst,
        })
    }

    fn decode_addr(buf: &mut Bytes) -> DecodeResult<NodeAddr> {
        let ip = buf.get_ipv4();
        let port = buf.get_u32();
        let port =
            u16::try_from(port).map_err(|_| DecodeError::InvalidPort(port))?;
        Ok(NodeAddr::new(ip, port))
    }
}

// ===== impl Packet =====

impl Packet {
    pub fn new(hdr: PacketHdr) -> Packet {
        Packet {
            hdr,
            payload: Bytes::new(),
        }
    }

    pub fn with_payload(hdr: PacketHdr, payload: Bytes) -> Packet {
        Packet { hdr, payload }
    }

    // Encode packet into a bytes buffer.
    pub fn encode(&self) -> BytesMut {
        TLS_BUF.with(|buf| {
            let mut buf = buf.borrow_mut();
            buf.clear();

            // Encode packet header.
            self.hdr.encode(&mut buf);

            // Append the opaque payload.
            buf.put_slice(&self.payload);

            buf.clone()
        })
    }

    // Decode packet from a bytes buffer.
    pub fn decode(data: &[u8]) -> DecodeResult<Packet> {
        let mut buf = Bytes::copy_from_slice(data);

        // Parse and validate the fixed header; whatever follows it is an
        // opaque payload.
        let hdr = PacketHdr::decode(&mut buf)?;

        Ok(Packet { hdr, payload: buf })
    }
}

// ===== impl DecodeError =====

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::IncompleteHeader(len) => {
                write!(f, "incomplete packet header ({len} octets)")
            }
            DecodeError::UnknownPacketType(pkt_type) => {
                write!(f, "unknown packet type ({pkt_type:#04x})")
            }
            DecodeError::InvalidPort(port) => {
                write!(f, "invalid port number ({port})")
            }
            DecodeError::InvalidLspPayload(token) => {
                write!(f, "invalid LSP payload ({token})")
            }
        }
    }
}

impl std::error::Error for DecodeError {}
