//
// Copyright (c) The Weft Project Contributors
//
// SPDX-License-Identifier: MIT
//

#![warn(rust_2018_idioms)]

use std::net::{IpAddr, Ipv4Addr, ToSocketAddrs};

use clap::{App, Arg};
use tokio::net::UdpSocket;
use tracing::warn;
use weft_routing::packet::{Packet, PacketHdr, PacketType};
use weft_utils::addr::NodeAddr;

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive("weft=info".parse().unwrap())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}

// Resolve a "host + port" command-line pair to a node endpoint.
fn resolve(host: &str, port: &str) -> Option<NodeAddr> {
    let port: u16 = port.parse().ok()?;

    if let Ok(ip) = host.parse::<Ipv4Addr>() {
        return Some(NodeAddr::new(ip, port));
    }
    (host, port)
        .to_socket_addrs()
        .ok()?
        .find_map(|addr| match addr.ip() {
            IpAddr::V4(ip) => Some(NodeAddr::new(ip, port)),
            IpAddr::V6(_) => None,
        })
}

// The endpoint on-path nodes will answer to: the machine hostname resolved
// to IPv4, falling back to loopback for single-host setups.
fn local_endpoint(port: u16) -> NodeAddr {
    if let Ok(hostname) = nix::unistd::gethostname()
        && let Some(hostname) = hostname.to_str()
        && let Some(addr) = resolve(hostname, &port.to_string())
    {
        return addr;
    }
    NodeAddr::new(Ipv4Addr::LOCALHOST, port)
}

async fn send_probe(
    socket: &UdpSocket,
    local: NodeAddr,
    src: NodeAddr,
    dest: NodeAddr,
    ttl: u32,
) {
    let hdr = PacketHdr::new(PacketType::Trace, 0, 0, ttl, local, dest);
    let packet = Packet::new(hdr);
    if let Err(error) = socket.send_to(&packet.encode(), src.socket_addr()).await
    {
        warn!(%error, "failed to send trace probe");
    }
}

// ===== main =====

#[tokio::main]
async fn main() {
    // Parse command-line parameters.
    let matches = App::new("Weft route tracer")
        .version(clap::crate_version!())
        .arg(
            Arg::with_name("port")
                .short("p")
                .long("port")
                .value_name("port")
                .required(true)
                .takes_value(true)
                .help("Port the tracer listens on for incoming packets."),
        )
        .arg(
            Arg::with_name("src-host")
                .long("src-host")
                .value_name("host")
                .required(true)
                .takes_value(true)
                .help("Host of the node the trace starts from."),
        )
        .arg(
            Arg::with_name("src-port")
                .long("src-port")
                .value_name("port")
                .required(true)
                .takes_value(true)
                .help("Port of the node the trace starts from."),
        )
        .arg(
            Arg::with_name("dest-host")
                .long("dest-host")
                .value_name("host")
                .required(true)
                .takes_value(true)
                .help("Host of the trace destination."),
        )
        .arg(
            Arg::with_name("dest-port")
                .long("dest-port")
                .value_name("port")
                .required(true)
                .takes_value(true)
                .help("Port of the trace destination."),
        )
        .arg(
            Arg::with_name("debug")
                .short("d")
                .long("debug")
                .help("Print each hop as it is discovered."),
        )
        .get_matches();

    // Initialize tracing.
    init_tracing();

    let port = matches.value_of("port").unwrap();
    let port: u16 = match port.parse() {
        Ok(port) => port,
        Err(_) => {
            eprintln!("invalid port: {port}");
            std::process::exit(1);
        }
    };
    let debug = matches.is_present("debug");

    let src_host = matches.value_of("src-host").unwrap();
    let src_port = matches.value_of("src-port").unwrap();
    let Some(src) = resolve(src_host, src_port) else {
        eprintln!("invalid trace source: {src_host},{src_port}");
        std::process::exit(1);
    };
    let dest_host = matches.value_of("dest-host").unwrap();
    let dest_port = matches.value_of("dest-port").unwrap();
    let Some(dest) = resolve(dest_host, dest_port) else {
        eprintln!("invalid trace destination: {dest_host},{dest_port}");
        std::process::exit(1);
    };

    let local = local_endpoint(port);
    let socket = match UdpSocket::bind(local.socket_addr()).await {
        Ok(socket) => socket,
        Err(error) => {
            eprintln!("failed to bind {local}: {error}");
            std::process::exit(1);
        }
    };

    println!("Hop # IP Port");

    // Probe with growing TTL; each probe is consumed one hop further along
    // the path, and the answering node identifies itself.
    let mut ttl = 0;
    let mut hop = 1;
    let mut buf = [0; 16384];

    send_probe(&socket, local, src, dest, ttl).await;
    loop {
        let (num_bytes, _) = match socket.recv_from(&mut buf).await {
            Ok((num_bytes, src)) => (num_bytes, src),
            Err(error) => {
                warn!(%error, "failed to receive packet");
                continue;
            }
        };
        let packet = match Packet::decode(&buf[0..num_bytes]) {
            Ok(packet) => packet,
            Err(error) => {
                warn!(%error, "failed to decode packet");
                continue;
            }
        };
        if packet.hdr.pkt_type != PacketType::Trace {
            continue;
        }

        if debug {
            println!("{} {}", hop, packet.hdr.src);
        }

        // The trace is complete once the destination itself answers.
        if packet.hdr.src == dest {
            break;
        }

        ttl += 1;
        hop += 1;
        send_probe(&socket, local, src, dest, ttl).await;
    }
}
