//
// Copyright (c) The Weft Project Contributors
//
// SPDX-License-Identifier: MIT
//

#![warn(rust_2018_idioms)]

use std::net::{IpAddr, Ipv4Addr, ToSocketAddrs};

use clap::{App, Arg};
use tracing::{error, info};
use weft_routing::instance::{self, InstanceCfg};
use weft_routing::topology;

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive("weft=debug".parse().unwrap())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}

// Addresses the local node may appear under in the topology file: whatever
// the machine hostname resolves to, plus loopback for single-host setups.
fn local_addresses() -> Vec<Ipv4Addr> {
    let mut addrs = vec![Ipv4Addr::LOCALHOST];

    if let Ok(hostname) = nix::unistd::gethostname()
        && let Some(hostname) = hostname.to_str()
        && let Ok(resolved) = (hostname, 0u16).to_socket_addrs()
    {
        for addr in resolved {
            if let IpAddr::V4(ip) = addr.ip() {
                addrs.push(ip);
            }
        }
    }

    addrs
}

// ===== main =====

fn main() {
    // Parse command-line parameters.
    let matches = App::new("Weft routing emulator")
        .version(clap::crate_version!())
        .arg(
            Arg::with_name("port")
                .short("p")
                .long("port")
                .value_name("port")
                .required(true)
                .takes_value(true)
                .help("Port the emulator listens on for incoming packets."),
        )
        .arg(
            Arg::with_name("topology")
                .short("f")
                .long("topology")
                .value_name("file")
                .required(true)
                .takes_value(true)
                .help("Path of the topology file."),
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

    // Read the topology and identify the local node's line in it.
    let topology_file = matches.value_of("topology").unwrap();
    let nodes = match topology::load(topology_file) {
        Ok(nodes) => nodes,
        Err(error) => {
            error!(%error, file = %topology_file, "failed to load topology");
            std::process::exit(1);
        }
    };
    let local_addrs = local_addresses();
    let Some(node) = topology::local_entry(&nodes, &local_addrs, port) else {
        error!(%port, "no topology entry matches the local endpoint");
        std::process::exit(1);
    };

    let config = InstanceCfg::new(node.addr, node.id, node.neighbors.clone());

    // Set panic handler to abort the process if any child task panics.
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        default_panic(info);
        std::process::exit(1);
    }));

    // We're ready to go!
    info!(address = %node.addr, "starting up");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to create async runtime")
        .block_on(async {
            tokio::select! {
                result = instance::run(config) => {
                    if let Err(error) = result {
                        error!(%error, "fatal error");
                        std::process::exit(1);
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("shutting down");
                }
            }
        });
}
