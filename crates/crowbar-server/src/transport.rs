//! The boundary to the reliable-UDP layer. The core never touches a
//! socket: it consumes inbound events from a bounded channel drained at
//! the top of each tick, and enqueues outbound messages through the
//! `Transport` trait. Socket pacing and retransmission live behind it.

use bytes::Bytes;
use crowbar_netcode::{Channel, MessageCategory};
use std::collections::VecDeque;
use std::net::{IpAddr, Ipv4Addr};

/// Capacity of the inbound event channel. One tick of a full server at
/// sync rates fits comfortably; overflow means the tick thread stalled.
pub const INBOUND_QUEUE_DEPTH: usize = 4096;

/// An event raised by the transport towards the core.
#[derive(Debug)]
pub enum TransportEvent {
    IncomingConnection {
        peer: usize,
        addr: IpAddr,
        port: u16,
    },
    /// Connection handshake finished; payload is the connect message body.
    PeerConnect {
        peer: usize,
        payload: Bytes,
    },
    PeerDisconnect {
        peer: usize,
        reason: u8,
    },
    /// A routable datagram: the framing ID byte is already consumed.
    Message {
        peer: usize,
        category: MessageCategory,
        id: u8,
        payload: Bytes,
    },
}

/// Point-in-time transport statistics for one peer. Counters are
/// monotonic; snapshots may lag the wire by up to one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkStats {
    pub ping: u32,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub messages_sent: u64,
    pub messages_received: u64,
}

/// A ban entry; name and reason may be empty depending on how the ban
/// was issued. Only IPv4 travels on the wire, so IPv6 peers ban as the
/// zero address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BanEntry {
    pub address: Ipv4Addr,
    pub name: String,
    pub reason: String,
}

impl Default for BanEntry {
    fn default() -> Self {
        Self {
            address: Ipv4Addr::UNSPECIFIED,
            name: String::new(),
            reason: String::new(),
        }
    }
}

/// Outbound surface of the network layer.
pub trait Transport {
    /// Concrete-type access for tooling and tests.
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;
    /// Queue a reliable RPC for one peer. Returns false if the peer is
    /// gone; the core absorbs that silently.
    fn send_rpc(&mut self, peer: usize, id: u8, payload: &[u8], channel: Channel) -> bool;

    /// Queue a sync packet for one peer.
    fn send_packet(&mut self, peer: usize, id: u8, payload: &[u8], channel: Channel) -> bool;

    /// Queue an RPC for every connected peer.
    fn broadcast_rpc(&mut self, id: u8, payload: &[u8], channel: Channel);

    fn stats(&self, peer: usize) -> NetworkStats;

    fn ban(&mut self, entry: BanEntry, duration_seconds: u64);

    fn unban(&mut self, entry: BanEntry);

    /// Drop any queued output for a disconnecting peer.
    fn cancel_pending(&mut self, peer: usize) {
        let _ = peer;
    }

    /// End-of-tick hook; implementations push buffered data to sockets.
    fn flush(&mut self) {}
}

/// One queued outbound message recorded by the loopback transport.
#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub peer: usize,
    pub category: MessageCategory,
    pub id: u8,
    pub payload: Vec<u8>,
    pub channel: Channel,
}

/// In-process transport used by the test suite and the demo binary: it
/// records sends in order and exposes them for inspection.
#[derive(Debug, Default)]
pub struct LoopbackTransport {
    pub sent: VecDeque<SentMessage>,
    pub connected: Vec<usize>,
    pub bans: Vec<BanEntry>,
    pub flushes: u64,
}

impl LoopbackTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect_peer(&mut self, peer: usize) {
        if !self.connected.contains(&peer) {
            self.connected.push(peer);
            self.connected.sort_unstable();
        }
    }

    pub fn disconnect_peer(&mut self, peer: usize) {
        self.connected.retain(|&p| p != peer);
    }

    /// Sent messages for a peer with the given ID, in send order.
    pub fn sent_to(&self, peer: usize, id: u8) -> Vec<&SentMessage> {
        self.sent
            .iter()
            .filter(|m| m.peer == peer && m.id == id)
            .collect()
    }

    pub fn drain(&mut self) -> Vec<SentMessage> {
        self.sent.drain(..).collect()
    }
}

impl Transport for LoopbackTransport {
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }

    fn send_rpc(&mut self, peer: usize, id: u8, payload: &[u8], channel: Channel) -> bool {
        if !self.connected.contains(&peer) {
            return false;
        }
        self.sent.push_back(SentMessage {
            peer,
            category: MessageCategory::Rpc,
            id,
            payload: payload.to_vec(),
            channel,
        });
        true
    }

    fn send_packet(&mut self, peer: usize, id: u8, payload: &[u8], channel: Channel) -> bool {
        if !self.connected.contains(&peer) {
            return false;
        }
        self.sent.push_back(SentMessage {
            peer,
            category: MessageCategory::Packet,
            id,
            payload: payload.to_vec(),
            channel,
        });
        true
    }

    fn broadcast_rpc(&mut self, id: u8, payload: &[u8], channel: Channel) {
        // Slot order keeps broadcast delivery deterministic.
        for peer in self.connected.clone() {
            self.send_rpc(peer, id, payload, channel);
        }
    }

    fn stats(&self, peer: usize) -> NetworkStats {
        let sent = self.sent.iter().filter(|m| m.peer == peer).count() as u64;
        NetworkStats {
            messages_sent: sent,
            ..Default::default()
        }
    }

    fn ban(&mut self, entry: BanEntry, _duration_seconds: u64) {
        self.bans.push(entry);
    }

    fn unban(&mut self, entry: BanEntry) {
        self.bans.retain(|b| b.address != entry.address);
    }

    fn cancel_pending(&mut self, peer: usize) {
        self.sent.retain(|m| m.peer != peer);
    }

    fn flush(&mut self) {
        self.flushes += 1;
    }
}
