//! Server network layer handling UDP communications and relay dispatch

use crate::pairing::{CounterPairing, Pairing};
use crate::registry::ChannelRegistry;
use crate::relay::RelayRouter;
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::{ChannelId, Packet, RoomId};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};
use tokio::time::interval;

/// Messages sent from network tasks to the main dispatch loop
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived {
        packet: Packet,
        addr: SocketAddr,
    },
    ChannelTimeout {
        channel_id: ChannelId,
    },
    #[allow(dead_code)]
    Shutdown,
}

/// Outbound sends queued by the dispatch loop.
///
/// All sends for all channels drain through one task in queue order, which
/// is what guarantees a sender's events reach its opponent in the order
/// they were relayed.
#[derive(Debug)]
pub enum RelayMessage {
    SendPacket { packet: Packet, addr: SocketAddr },
}

/// Relay server pairing channels into rooms and forwarding game events.
///
/// The registry is shared with the timeout task behind a lock; the pairing
/// engine and relay router are mutated only from the main loop, preserving
/// the single-threaded dispatch discipline the protocol relies on.
pub struct Server {
    socket: Arc<UdpSocket>,
    registry: Arc<RwLock<ChannelRegistry>>,
    pairing: CounterPairing,
    router: RelayRouter,
    /// Referee identity per active room, kept here so the router can stay
    /// payload-agnostic while non-referee ball traffic is still visible in
    /// the logs.
    referees: HashMap<RoomId, ChannelId>,
    channel_timeout: Duration,

    // Communication channels
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    relay_tx: mpsc::UnboundedSender<RelayMessage>,
    relay_rx: mpsc::UnboundedReceiver<RelayMessage>,
}

impl Server {
    pub async fn new(
        addr: &str,
        channel_timeout: Duration,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("Relay server listening on {}", addr);

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (relay_tx, relay_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            registry: Arc::new(RwLock::new(ChannelRegistry::new())),
            pairing: CounterPairing::new(),
            router: RelayRouter::new(),
            referees: HashMap::new(),
            channel_timeout,
            server_tx,
            server_rx,
            relay_tx,
            relay_rx,
        })
    }

    /// Spawns task that continuously listens for incoming datagrams
    fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; 2048];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        if let Ok(packet) = deserialize::<Packet>(&buffer[0..len]) {
                            if let Err(e) =
                                server_tx.send(ServerMessage::PacketReceived { packet, addr })
                            {
                                error!("Failed to send packet to dispatch loop: {}", e);
                                break;
                            }
                        } else {
                            // One malformed datagram must never take the
                            // process down
                            warn!("Failed to deserialize packet from {}", addr);
                        }
                    }
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns the single ordered sender task draining the outbound queue
    fn spawn_network_sender(&mut self) {
        let socket = Arc::clone(&self.socket);
        let mut relay_rx = std::mem::replace(&mut self.relay_rx, mpsc::unbounded_channel().1);

        tokio::spawn(async move {
            while let Some(message) = relay_rx.recv().await {
                match message {
                    RelayMessage::SendPacket { packet, addr } => {
                        if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                            error!("Failed to send packet to {}: {}", addr, e);
                        }
                    }
                }
            }
        });
    }

    /// Spawns task that sweeps for silent channels
    fn spawn_timeout_checker(&self) {
        let registry = Arc::clone(&self.registry);
        let server_tx = self.server_tx.clone();
        let timeout = self.channel_timeout;

        tokio::spawn(async move {
            let mut sweep = interval(Duration::from_secs(1));

            loop {
                sweep.tick().await;

                let timed_out = {
                    let registry_guard = registry.read().await;
                    registry_guard.check_timeouts(timeout)
                };

                // The sweep may observe a channel more than once before the
                // dispatch loop removes it; disconnect is idempotent, so
                // duplicate timeout messages are harmless.
                for channel_id in timed_out {
                    if let Err(e) = server_tx.send(ServerMessage::ChannelTimeout { channel_id }) {
                        error!("Failed to send timeout message: {}", e);
                        break;
                    }
                }
            }
        });
    }

    async fn send_packet_impl(
        socket: &UdpSocket,
        packet: &Packet,
        addr: SocketAddr,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let data = serialize(packet)?;
        socket.send_to(&data, addr).await?;
        Ok(())
    }

    fn queue_packet(&self, packet: Packet, addr: SocketAddr) {
        if let Err(e) = self.relay_tx.send(RelayMessage::SendPacket { packet, addr }) {
            error!("Failed to queue packet for sending: {}", e);
        }
    }

    /// Dispatches one inbound packet through registry, pairing and relay
    async fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) {
        match packet {
            Packet::Connect { client_version } => {
                info!(
                    "Channel connecting from {} (version: {})",
                    addr, client_version
                );

                // A reconnect from the same address replaces the stale
                // channel entirely; there is no session resume.
                let existing = {
                    let registry = self.registry.read().await;
                    registry.find_by_addr(addr)
                };
                if let Some(existing_id) = existing {
                    info!("Replacing stale channel {} from {}", existing_id, addr);
                    self.handle_disconnect(existing_id).await;
                }

                let channel_id = {
                    let mut registry = self.registry.write().await;
                    registry.register(addr)
                };

                self.queue_packet(Packet::Connected { channel_id }, addr);
            }

            Packet::Ready => {
                let Some(channel_id) = self.channel_for(addr).await else {
                    warn!("Ready from unregistered address {}", addr);
                    return;
                };

                match self.pairing.on_ready(channel_id) {
                    Ok(Some(paired)) => {
                        if let Err(e) = self.router.open_room(&paired) {
                            error!("Room {} could not open: {}", paired.room_id, e);
                            self.fail_channel(channel_id, "pairing inconsistency").await;
                            return;
                        }

                        self.referees.insert(paired.room_id, paired.referee);

                        let mut registry = self.registry.write().await;
                        for member in paired.members {
                            registry.set_room(member, paired.room_id);
                            if let Some(member_addr) = registry.addr_of(member) {
                                self.queue_packet(
                                    Packet::StartGame {
                                        room_id: paired.room_id,
                                        referee_id: paired.referee,
                                    },
                                    member_addr,
                                );
                            }
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        // Invariant violation: fail this channel's session,
                        // keep the process alive
                        error!("Pairing failed for channel {}: {}", channel_id, e);
                        self.fail_channel(channel_id, "pairing inconsistency").await;
                    }
                }
            }

            Packet::PaddleMove { .. } | Packet::BallMove { .. } => {
                let Some(channel_id) = self.channel_for(addr).await else {
                    return;
                };

                if let Packet::BallMove { .. } = packet {
                    self.note_non_referee_ball(channel_id);
                }

                // No active room means unpaired or already disconnected;
                // the event is dropped silently
                if let Some(opponent) = self.router.opponent_of(channel_id) {
                    let registry = self.registry.read().await;
                    if let Some(opponent_addr) = registry.addr_of(opponent) {
                        self.queue_packet(packet, opponent_addr);
                    }
                }
            }

            Packet::Disconnect => {
                let existing = {
                    let registry = self.registry.read().await;
                    registry.find_by_addr(addr)
                };
                if let Some(channel_id) = existing {
                    self.handle_disconnect(channel_id).await;
                }
            }

            _ => {
                warn!("Unexpected packet type from {}", addr);
            }
        }
    }

    /// Resolves and refreshes the channel behind an inbound address.
    async fn channel_for(&self, addr: SocketAddr) -> Option<ChannelId> {
        let mut registry = self.registry.write().await;
        let channel_id = registry.find_by_addr(addr)?;
        registry.touch(channel_id);
        Some(channel_id)
    }

    /// The protocol does not reject ball updates from the non-referee
    /// (the relay trusts the room to sort out authority), but it is worth
    /// seeing in the logs.
    fn note_non_referee_ball(&self, channel_id: ChannelId) {
        if let Some(room_id) = self.router.room_of(channel_id) {
            if let Some(&referee) = self.referees.get(&room_id) {
                if referee != channel_id {
                    debug!(
                        "Non-referee channel {} sent ballMove in room {}",
                        channel_id, room_id
                    );
                }
            }
        }
    }

    /// Common cleanup for explicit disconnects, timeouts and replaced
    /// channels. Removes the channel everywhere and notifies a remaining
    /// room member, if any.
    async fn handle_disconnect(&mut self, channel_id: ChannelId) {
        {
            let mut registry = self.registry.write().await;
            registry.disconnect(channel_id);
        }

        self.pairing.abandon(channel_id);

        if let Some(departure) = self.router.remove(channel_id) {
            match departure.remaining {
                Some(remaining) => {
                    let registry = self.registry.read().await;
                    if let Some(remaining_addr) = registry.addr_of(remaining) {
                        self.queue_packet(Packet::PeerLeft, remaining_addr);
                    }
                }
                None => {
                    self.referees.remove(&departure.room_id);
                }
            }
        }
    }

    /// Sends a reason to the channel and tears its session down.
    async fn fail_channel(&mut self, channel_id: ChannelId, reason: &str) {
        let addr = {
            let registry = self.registry.read().await;
            registry.addr_of(channel_id)
        };
        if let Some(addr) = addr {
            self.queue_packet(
                Packet::Disconnected {
                    reason: reason.to_string(),
                },
                addr,
            );
        }
        self.handle_disconnect(channel_id).await;
    }

    /// Main dispatch loop coordinating all operations
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.spawn_network_receiver();
        self.spawn_network_sender();
        self.spawn_timeout_checker();

        let mut stats_interval = interval(Duration::from_secs(30));

        info!("Relay server started successfully");

        loop {
            tokio::select! {
                message = self.server_rx.recv() => {
                    match message {
                        Some(ServerMessage::PacketReceived { packet, addr }) => {
                            self.handle_packet(packet, addr).await;
                        },
                        Some(ServerMessage::ChannelTimeout { channel_id }) => {
                            info!("Channel {} timed out", channel_id);
                            self.handle_disconnect(channel_id).await;
                        },
                        Some(ServerMessage::Shutdown) | None => {
                            info!("Relay server shutting down");
                            break;
                        }
                    }
                },

                _ = stats_interval.tick() => {
                    let channel_count = {
                        let registry = self.registry.read().await;
                        registry.len()
                    };

                    if channel_count > 0 {
                        debug!(
                            "{} channels, {} active rooms, {} waiting, {} ready signals",
                            channel_count,
                            self.router.active_rooms(),
                            self.pairing.waiting_rooms(),
                            self.pairing.ready_count()
                        );
                    }
                },
            }
        }

        Ok(())
    }
}
