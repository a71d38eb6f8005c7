//
// Copyright (c) The Weft Project Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::UdpSocket;
use tokio::sync::mpsc::error::SendError;
use tokio::sync::mpsc::{Sender, UnboundedReceiver};
use weft_utils::addr::NodeAddr;

use crate::error::IoError;
use crate::packet::Packet;
use crate::tasks::messages::input::UdpRxPacketMsg;
use crate::tasks::messages::output::UdpTxPacketMsg;

// ===== global functions =====

// Create the node's UDP socket, bound to its configured endpoint.
#[cfg(not(feature = "testing"))]
pub(crate) fn socket(addr: NodeAddr) -> Result<UdpSocket, std::io::Error> {
    use socket2::{Domain, Socket, Type};

    let socket = Socket::new(Domain::IPV4, Type::DGRAM, None)?;
    socket.set_nonblocking(true)?;
    socket.set_reuse_address(true)?;
    socket.bind(&addr.socket_addr().into())?;
    UdpSocket::from_std(socket.into())
}

#[cfg(not(feature = "testing"))]
pub(crate) async fn send_packet(
    socket: &UdpSocket,
    packet: Packet,
    dst: SocketAddr,
) -> Result<(), std::io::Error> {
    // Encode packet.
    let buf = packet.encode();

    // Send packet.
    socket.send_to(&buf, dst).await?;

    Ok(())
}

#[cfg(not(feature = "testing"))]
pub(crate) async fn write_loop(
    socket: Arc<UdpSocket>,
    mut udp_packet_txc: UnboundedReceiver<UdpTxPacketMsg>,
) {
    while let Some(UdpTxPacketMsg { dst, packet }) = udp_packet_txc.recv().await
    {
        if let Err(error) = send_packet(&socket, packet, dst).await {
            IoError::UdpSendError(error).log();
        }
    }
}

#[cfg(not(feature = "testing"))]
pub(crate) async fn read_loop(
    socket: Arc<UdpSocket>,
    udp_packet_rxp: Sender<UdpRxPacketMsg>,
) -> Result<(), SendError<UdpRxPacketMsg>> {
    let mut buf = [0; 16384];

    loop {
        // Receive data from the network.
        let (num_bytes, src) = match socket.recv_from(&mut buf).await {
            Ok((num_bytes, src)) => (num_bytes, src),
            Err(error) => {
                IoError::UdpRecvError(error).log();
                continue;
            }
        };

        // Decode packet.
        let packet = Packet::decode(&buf[0..num_bytes]);
        let msg = UdpRxPacketMsg { src, packet };
        udp_packet_rxp.send(msg).await?;
    }
}
