//
// Copyright (c) The Weft Project Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::sync::mpsc::{Receiver, Sender, UnboundedSender};
use weft_utils::addr::NodeAddr;
use weft_utils::task::{IntervalTask, Task, TimeoutTask};

use crate::debug::Debug;
use crate::error::{Error, IoError};
use crate::lsdb::Lsdb;
use crate::neighbor::Neighbor;
use crate::packet::PacketType;
use crate::route::Route;
use crate::tasks::messages::input::{
    HelloIntervalMsg, NbrTimeoutMsg, SpfDelayMsg, UdpRxPacketMsg,
};
use crate::tasks::messages::ProtocolInputMsg;
#[cfg(feature = "testing")]
use crate::tasks::messages::ProtocolOutputMsg;
use crate::tasks::messages::output::UdpTxPacketMsg;
use crate::{events, network, tasks};

// Instance configuration.
//
// Only the endpoint, id and initial neighbor set come from the outside
// world; the timing knobs keep their protocol defaults unless a caller
// (typically a test) overrides them.
#[derive(Clone, Debug)]
pub struct InstanceCfg {
    // Local node endpoint.
    pub addr: NodeAddr,
    // Local node id (line number in the topology file).
    pub node_id: u32,
    // Direct neighbors listed in the topology file.
    pub initial_neighbors: Vec<NodeAddr>,
    // Pace of hello emission and LSP re-origination.
    pub hello_interval: Duration,
    // Silence interval after which a neighbor is declared down.
    pub nbr_timeout: Duration,
    // Quiescence window between the last topology change and the rebuild.
    pub spf_delay: Duration,
    // TTL carried by self-originated LSPs.
    pub lsp_ttl: u32,
    // Age past which a stored LSP yields to a lower sequence number.
    pub lsp_stale_age: Duration,
}

#[derive(Debug)]
pub struct Instance {
    // Instance configuration data.
    pub config: InstanceCfg,
    // Instance state data.
    pub state: InstanceState,
    // Instance Tx channels.
    pub tx: InstanceChannelsTx,
}

#[derive(Debug)]
pub struct InstanceState {
    // Sequence number stamped on the next self-originated LSP.
    pub seq_no: u32,
    // Direct adjacencies.
    pub neighbors: BTreeMap<NodeAddr, Neighbor>,
    // Link-state database.
    pub lsdb: Lsdb,
    // Forwarding table produced by the last complete SPF run.
    pub routes: BTreeMap<NodeAddr, Route>,
    // UDP socket and Tx/Rx tasks.
    pub net: InstanceNet,
    // Hello emission task.
    pub hello_interval_task: IntervalTask,
    // SPF debounce task, armed while a topology change is pending.
    pub spf_delay_task: Option<TimeoutTask>,
    // Message statistics.
    pub statistics: MessageStatistics,
}

#[derive(Debug)]
pub struct InstanceNet {
    // UDP socket.
    #[cfg(not(feature = "testing"))]
    pub socket: Arc<UdpSocket>,
    // UDP Tx/Rx tasks.
    _udp_rx_task: Task<()>,
    _udp_tx_task: Task<()>,
    // UDP Tx output channel.
    pub udp_tx_packetp: UnboundedSender<UdpTxPacketMsg>,
}

// Inbound and outbound statistic counters.
#[derive(Debug, Default)]
pub struct MessageStatistics {
    pub discontinuity_time: Option<DateTime<Utc>>,
    pub bad_packets_rcvd: u32,
    pub hellos_rcvd: u32,
    pub hellos_sent: u32,
    pub lsps_rcvd: u32,
    pub lsps_sent: u32,
    pub acks_rcvd: u32,
    pub acks_sent: u32,
    pub traces_rcvd: u32,
    pub traces_sent: u32,
}

#[derive(Debug)]
pub struct InstanceChannelsTx {
    pub protocol_input: ProtocolInputChannelsTx,
    #[cfg(feature = "testing")]
    pub protocol_output: Sender<ProtocolOutputMsg>,
}

#[derive(Clone, Debug)]
pub struct ProtocolInputChannelsTx {
    // UDP Rx event.
    pub udp_packet_rx: Sender<UdpRxPacketMsg>,
    // Hello interval.
    pub hello_interval: Sender<HelloIntervalMsg>,
    // Neighbor timeout event.
    pub nbr_timeout: Sender<NbrTimeoutMsg>,
    // SPF delay event.
    pub spf_delay: Sender<SpfDelayMsg>,
}

#[derive(Debug)]
pub struct ProtocolInputChannelsRx {
    // UDP Rx event.
    pub udp_packet_rx: Receiver<UdpRxPacketMsg>,
    // Hello interval.
    pub hello_interval: Receiver<HelloIntervalMsg>,
    // Neighbor timeout event.
    pub nbr_timeout: Receiver<NbrTimeoutMsg>,
    // SPF delay event.
    pub spf_delay: Receiver<SpfDelayMsg>,
}

// ===== impl InstanceCfg =====

impl InstanceCfg {
    pub const DFLT_HELLO_INTERVAL: Duration = Duration::from_millis(500);
    pub const DFLT_NBR_TIMEOUT: Duration = Duration::from_secs(2);
    pub const DFLT_SPF_DELAY: Duration = Duration::from_secs(3);
    pub const DFLT_LSP_TTL: u32 = 10;
    pub const DFLT_LSP_STALE_AGE: Duration = Duration::from_secs(6);

    pub fn new(
        addr: NodeAddr,
        node_id: u32,
        initial_neighbors: Vec<NodeAddr>,
    ) -> InstanceCfg {
        InstanceCfg {
            addr,
            node_id,
            initial_neighbors,
            hello_interval: Self::DFLT_HELLO_INTERVAL,
            nbr_timeout: Self::DFLT_NBR_TIMEOUT,
            spf_delay: Self::DFLT_SPF_DELAY,
            lsp_ttl: Self::DFLT_LSP_TTL,
            lsp_stale_age: Self::DFLT_LSP_STALE_AGE,
        }
    }
}

// ===== impl Instance =====

impl Instance {
    pub fn new(
        config: InstanceCfg,
        tx: InstanceChannelsTx,
    ) -> Result<Instance, Error> {
        Debug::InstanceCreate.log();

        // Create the UDP socket and its Tx/Rx tasks.
        let net = InstanceNet::new(config.addr, &tx)?;

        // Start hello emission; the first tick fires immediately.
        let hello_interval_task = tasks::hello_interval(
            config.hello_interval,
            &tx.protocol_input.hello_interval,
        );

        // Seed the neighbor table from the topology file. The expiry tasks
        // armed here grant each entry one full timeout of grace to be heard
        // from.
        let mut neighbors = BTreeMap::new();
        for addr in &config.initial_neighbors {
            let nbr = Neighbor::new(
                *addr,
                config.nbr_timeout,
                &tx.protocol_input.nbr_timeout,
            );
            neighbors.insert(*addr, nbr);
        }

        Ok(Instance {
            config,
            state: InstanceState {
                seq_no: 0,
                neighbors,
                lsdb: Default::default(),
                routes: Default::default(),
                net,
                hello_interval_task,
                spf_delay_task: None,
                statistics: Default::default(),
            },
            tx,
        })
    }

    pub fn process_protocol_msg(&mut self, msg: ProtocolInputMsg) {
        match msg {
            // Received UDP packet.
            ProtocolInputMsg::UdpRxPacket(msg) => {
                events::process_packet(self, msg.src, msg.packet);
            }
            // Hello interval has ticked.
            ProtocolInputMsg::HelloInterval(_msg) => {
                events::process_hello_interval(self);
            }
            // Neighbor's expiry timer has fired.
            ProtocolInputMsg::NbrTimeout(msg) => {
                events::process_nbr_timeout(self, msg.addr);
            }
            // Topology has been quiet long enough to rebuild.
            ProtocolInputMsg::SpfDelay(_msg) => {
                events::process_spf_delay(self);
            }
        }
    }
}

// ===== impl InstanceNet =====

impl InstanceNet {
    pub(crate) fn new(
        addr: NodeAddr,
        instance_channels_tx: &InstanceChannelsTx,
    ) -> Result<InstanceNet, IoError> {
        // Create UDP socket.
        #[cfg(not(feature = "testing"))]
        let socket = network::socket(addr)
            .map_err(IoError::UdpSocketError)
            .map(Arc::new)?;

        // Start UDP Tx/Rx tasks.
        let (udp_tx_packetp, udp_tx_packetc) = mpsc::unbounded_channel();
        let udp_tx_task = tasks::udp_tx(
            #[cfg(not(feature = "testing"))]
            &socket,
            udp_tx_packetc,
            #[cfg(feature = "testing")]
            &instance_channels_tx.protocol_output,
        );
        let udp_rx_task = tasks::udp_rx(
            #[cfg(not(feature = "testing"))]
            &socket,
            &instance_channels_tx.protocol_input.udp_packet_rx,
        );

        Ok(InstanceNet {
            #[cfg(not(feature = "testing"))]
            socket,
            _udp_rx_task: udp_rx_task,
            _udp_tx_task: udp_tx_task,
            udp_tx_packetp,
        })
    }
}

// ===== impl MessageStatistics =====

impl MessageStatistics {
    pub(crate) fn update(&mut self, pkt_type: PacketType, sent: bool) {
        self.discontinuity_time = Some(Utc::now());
        match (pkt_type, sent) {
            (PacketType::Hello, false) => self.hellos_rcvd += 1,
            (PacketType::Hello, true) => self.hellos_sent += 1,
            (PacketType::Lsp, false) => self.lsps_rcvd += 1,
            (PacketType::Lsp, true) => self.lsps_sent += 1,
            (PacketType::Ack, false) => self.acks_rcvd += 1,
            (PacketType::Ack, true) => self.acks_sent += 1,
            (PacketType::Trace, false) => self.traces_rcvd += 1,
            (PacketType::Trace, true) => self.traces_sent += 1,
        }
    }
}

// ===== impl ProtocolInputChannelsRx =====

impl ProtocolInputChannelsRx {
    pub async fn recv(&mut self) -> Option<ProtocolInputMsg> {
        tokio::select! {
            msg = self.udp_packet_rx.recv() => {
                msg.map(ProtocolInputMsg::UdpRxPacket)
            }
            msg = self.hello_interval.recv() => {
                msg.map(ProtocolInputMsg::HelloInterval)
            }
            msg = self.nbr_timeout.recv() => {
                msg.map(ProtocolInputMsg::NbrTimeout)
            }
            msg = self.spf_delay.recv() => {
                msg.map(ProtocolInputMsg::SpfDelay)
            }
        }
    }
}

// ===== global functions =====

// Create channels for all protocol input events.
pub fn protocol_input_channels()
-> (ProtocolInputChannelsTx, ProtocolInputChannelsRx) {
    let (udp_packet_rxp, udp_packet_rxc) = mpsc::channel(4);
    let (hello_intervalp, hello_intervalc) = mpsc::channel(4);
    let (nbr_timeoutp, nbr_timeoutc) = mpsc::channel(4);
    let (spf_delayp, spf_delayc) = mpsc::channel(4);

    let tx = ProtocolInputChannelsTx {
        udp_packet_rx: udp_packet_rxp,
        hello_interval: hello_intervalp,
        nbr_timeout: nbr_timeoutp,
        spf_delay: spf_delayp,
    };
    let rx = ProtocolInputChannelsRx {
        udp_packet_rx: udp_packet_rxc,
        hello_interval: hello_intervalc,
        nbr_timeout: nbr_timeoutc,
        spf_delay: spf_delayc,
    };

    (tx, rx)
}

// Run a routing instance until its input channels close.
//
// All protocol state is owned by this task; child tasks only ever talk to
// it through the input channels, so every mutation happens between two
// message dispatches and the tables are always internally consistent.
#[cfg(not(feature = "testing"))]
pub async fn run(config: InstanceCfg) -> Result<(), Error> {
    let (protocol_input_tx, mut protocol_input_rx) = protocol_input_channels();
    let tx = InstanceChannelsTx {
        protocol_input: protocol_input_tx,
    };

    let mut instance = Instance::new(config, tx)?;
    Debug::InstanceStart.log();

    while let Some(msg) = protocol_input_rx.recv().await {
        instance.process_protocol_msg(msg);
    }

    Ok(())
}
