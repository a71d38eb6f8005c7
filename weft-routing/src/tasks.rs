//
// Copyright (c) The Weft Project Contributors
//
// SPDX-License-Identifier: MIT
//

use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::mpsc::{Sender, UnboundedReceiver};
use tracing::{Instrument, debug_span, error};
use weft_utils::addr::NodeAddr;
use weft_utils::task::{IntervalTask, Task, TimeoutTask};

use crate::network;

//
// Weft tasks diagram:
//
//                                 +--------------+
//                  udp_rx (1x) -> |              |
//          hello_interval (1x) -> |              |
//             nbr_timeout (Nx) -> |   instance   | -> (1x) udp_tx
//             spf_delay (0/1x) -> |              |
//                                 +--------------+
//

// Weft inter-task message types.
pub mod messages {
    use std::net::SocketAddr;

    use serde::{Deserialize, Serialize};
    use weft_utils::addr::NodeAddr;

    use crate::packet::{DecodeError, Packet};

    // Type aliases.
    pub type ProtocolInputMsg = input::ProtocolMsg;
    pub type ProtocolOutputMsg = output::ProtocolMsg;

    // Input messages (child task -> main task).
    pub mod input {
        use super::*;

        #[derive(Debug, Deserialize, Serialize)]
        pub enum ProtocolMsg {
            UdpRxPacket(UdpRxPacketMsg),
            HelloInterval(HelloIntervalMsg),
            NbrTimeout(NbrTimeoutMsg),
            SpfDelay(SpfDelayMsg),
        }

        #[derive(Debug, Deserialize, Serialize)]
        pub struct UdpRxPacketMsg {
            pub src: SocketAddr,
            pub packet: Result<Packet, DecodeError>,
        }

        #[derive(Debug, Deserialize, Serialize)]
        pub struct HelloIntervalMsg {}

        #[derive(Debug, Deserialize, Serialize)]
        pub struct NbrTimeoutMsg {
            pub addr: NodeAddr,
        }

        #[derive(Debug, Deserialize, Serialize)]
        pub struct SpfDelayMsg {}
    }

    // Output messages (main task -> child task).
    pub mod output {
        use super::*;

        #[derive(Debug, Serialize)]
        pub enum ProtocolMsg {
            UdpTxPacket(UdpTxPacketMsg),
        }

        #[derive(Debug, Serialize)]
        pub struct UdpTxPacketMsg {
            pub dst: SocketAddr,
            pub packet: Packet,
        }
    }
}

// ===== Weft tasks =====

// UDP Rx task.
pub(crate) fn udp_rx(
    #[cfg(not(feature = "testing"))] socket: &Arc<UdpSocket>,
    udp_packet_rxp: &Sender<messages::input::UdpRxPacketMsg>,
) -> Task<()> {
    #[cfg(not(feature = "testing"))]
    {
        let span1 = debug_span!("network");
        let _span1_guard = span1.enter();
        let span2 = debug_span!("input");
        let _span2_guard = span2.enter();

        let socket = socket.clone();
        let udp_packet_rxp = udp_packet_rxp.clone();

        // The receive loop is supervised: a panic is logged and the loop
        // respawned instead of leaving the instance deaf.
        Task::spawn(
            async move {
                loop {
                    let worker = Task::spawn(
                        network::read_loop(
                            socket.clone(),
                            udp_packet_rxp.clone(),
                        )
                        .in_current_span(),
                    );
                    match worker.await {
                        Err(error) if error.is_panic() => {
                            error!("receive loop panicked, restarting");
                        }
                        _ => break,
                    }
                }
            }
            .in_current_span(),
        )
    }
    #[cfg(feature = "testing")]
    {
        Task::spawn(async move { std::future::pending().await })
    }
}

// UDP Tx task.
#[allow(unused_mut)]
pub(crate) fn udp_tx(
    #[cfg(not(feature = "testing"))] socket: &Arc<UdpSocket>,
    mut udp_packet_txc: UnboundedReceiver<messages::output::UdpTxPacketMsg>,
    #[cfg(feature = "testing")] proto_output_tx: &Sender<
        messages::ProtocolOutputMsg,
    >,
) -> Task<()> {
    #[cfg(not(feature = "testing"))]
    {
        let span1 = debug_span!("network");
        let _span1_guard = span1.enter();
        let span2 = debug_span!("output");
        let _span2_guard = span2.enter();

        let socket = socket.clone();
        Task::spawn(
            async move {
                network::write_loop(socket, udp_packet_txc).await;
            }
            .in_current_span(),
        )
    }
    #[cfg(feature = "testing")]
    {
        let proto_output_tx = proto_output_tx.clone();
        Task::spawn(async move {
            // Relay message to the test framework.
            while let Some(msg) = udp_packet_txc.recv().await {
                let msg = messages::ProtocolOutputMsg::UdpTxPacket(msg);
                let _ = proto_output_tx.send(msg).await;
            }
        })
    }
}

// Hello emission ticker, which doubles as the LSP re-origination pace.
// Its first tick fires immediately so a starting node announces itself at
// once.
pub(crate) fn hello_interval(
    interval: Duration,
    hello_intervalp: &Sender<messages::input::HelloIntervalMsg>,
) -> IntervalTask {
    #[cfg(not(feature = "testing"))]
    {
        let hello_intervalp = hello_intervalp.clone();
        IntervalTask::new(interval, move || {
            let hello_intervalp = hello_intervalp.clone();
            async move {
                let msg = messages::input::HelloIntervalMsg {};
                let _ = hello_intervalp.send(msg).await;
            }
        })
    }
    #[cfg(feature = "testing")]
    {
        IntervalTask {}
    }
}

// Neighbor expiry task.
pub(crate) fn nbr_timeout(
    addr: NodeAddr,
    timeout: Duration,
    nbr_timeoutp: &Sender<messages::input::NbrTimeoutMsg>,
) -> TimeoutTask {
    #[cfg(not(feature = "testing"))]
    {
        let nbr_timeoutp = nbr_timeoutp.clone();
        TimeoutTask::new(timeout, move || async move {
            let msg = messages::input::NbrTimeoutMsg { addr };
            let _ = nbr_timeoutp.send(msg).await;
        })
    }
    #[cfg(feature = "testing")]
    {
        TimeoutTask {}
    }
}

// SPF debounce task: fires once the topology has stopped changing for the
// configured quiescence window.
pub(crate) fn spf_delay(
    delay: Duration,
    spf_delayp: &Sender<messages::input::SpfDelayMsg>,
) -> TimeoutTask {
    #[cfg(not(feature = "testing"))]
    {
        let spf_delayp = spf_delayp.clone();
        TimeoutTask::new(delay, move || async move {
            let msg = messages::input::SpfDelayMsg {};
            let _ = spf_delayp.send(msg).await;
        })
    }
    #[cfg(feature = "testing")]
    {
        TimeoutTask {}
    }
}
