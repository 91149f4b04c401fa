//! Connection registry tracking live channels and their identities
//!
//! This module owns the server-side view of every connected endpoint:
//! - Identity allocation (unique, stable for the connection's lifetime)
//! - Address association for routing inbound datagrams to channels
//! - Liveness tracking and timeout detection
//! - Idempotent disconnect that reports the channel's last-known room
//!
//! The registry is a leaf dependency: the pairing engine and relay router
//! both key their state off the identities it hands out, but only the
//! registry creates and destroys channels.

use log::info;
use shared::{ChannelId, RoomId};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// One connected endpoint.
///
/// The room assignment stored here is routing metadata only; the relay
/// router owns the authoritative membership table.
#[derive(Debug)]
pub struct Channel {
    /// Unique identity assigned by the registry
    pub id: ChannelId,
    /// Network address for sending responses
    pub addr: SocketAddr,
    /// Last time we received any packet from this channel
    pub last_seen: Instant,
    /// Back-reference to the channel's room, once paired
    pub room: Option<RoomId>,
}

impl Channel {
    pub fn new(id: ChannelId, addr: SocketAddr) -> Self {
        Self {
            id,
            addr,
            last_seen: Instant::now(),
            room: None,
        }
    }

    /// True when no packet has arrived from this channel within `timeout`.
    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }
}

/// Registry of all live channels.
///
/// Identities start at 1 and increase monotonically; an identity is never
/// reused within a process, so a stale datagram referencing a disconnected
/// channel can never be misattributed to a newer one.
pub struct ChannelRegistry {
    channels: HashMap<ChannelId, Channel>,
    next_channel_id: ChannelId,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self {
            channels: HashMap::new(),
            next_channel_id: 1,
        }
    }

    /// Registers a new channel and returns its fresh identity.
    pub fn register(&mut self, addr: SocketAddr) -> ChannelId {
        let channel_id = self.next_channel_id;
        self.next_channel_id += 1;

        info!("Channel {} connected from {}", channel_id, addr);
        self.channels.insert(channel_id, Channel::new(channel_id, addr));

        channel_id
    }

    /// Removes a channel and returns its last-known room assignment so the
    /// caller can clean up membership.
    ///
    /// Idempotent: disconnecting an unknown or already-removed channel
    /// returns `None` without error.
    pub fn disconnect(&mut self, channel_id: ChannelId) -> Option<RoomId> {
        let channel = self.channels.remove(&channel_id)?;
        info!("Channel {} disconnected", channel.id);
        channel.room
    }

    /// Finds a channel identity by its network address.
    pub fn find_by_addr(&self, addr: SocketAddr) -> Option<ChannelId> {
        self.channels
            .iter()
            .find(|(_, channel)| channel.addr == addr)
            .map(|(id, _)| *id)
    }

    /// Network address of a channel, for outbound sends.
    pub fn addr_of(&self, channel_id: ChannelId) -> Option<SocketAddr> {
        self.channels.get(&channel_id).map(|channel| channel.addr)
    }

    /// Marks a channel as recently active.
    pub fn touch(&mut self, channel_id: ChannelId) {
        if let Some(channel) = self.channels.get_mut(&channel_id) {
            channel.last_seen = Instant::now();
        }
    }

    /// Records the channel's room back-reference once it is paired.
    pub fn set_room(&mut self, channel_id: ChannelId, room_id: RoomId) {
        if let Some(channel) = self.channels.get_mut(&channel_id) {
            channel.room = Some(room_id);
        }
    }

    /// The channel's room back-reference, if it has been paired.
    pub fn room_of(&self, channel_id: ChannelId) -> Option<RoomId> {
        self.channels.get(&channel_id).and_then(|channel| channel.room)
    }

    /// Returns channels that have gone silent for longer than `timeout`.
    ///
    /// The expired channels are not removed here; the caller funnels them
    /// through the same disconnect path as an explicit disconnect so room
    /// cleanup happens in exactly one place.
    pub fn check_timeouts(&self, timeout: Duration) -> Vec<ChannelId> {
        self.channels
            .iter()
            .filter(|(_, channel)| channel.is_timed_out(timeout))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Returns the number of live channels.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Returns true if no channels are connected.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_addr() -> SocketAddr {
        "127.0.0.1:8080".parse().unwrap()
    }

    fn test_addr2() -> SocketAddr {
        "127.0.0.1:8081".parse().unwrap()
    }

    #[test]
    fn test_register_assigns_unique_ids() {
        let mut registry = ChannelRegistry::new();

        let a = registry.register(test_addr());
        let b = registry.register(test_addr2());

        assert_eq!(a, 1);
        assert_eq!(b, 2);
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_ids_are_never_reused() {
        let mut registry = ChannelRegistry::new();

        let a = registry.register(test_addr());
        registry.disconnect(a);
        let b = registry.register(test_addr());

        assert!(b > a);
    }

    #[test]
    fn test_find_by_addr() {
        let mut registry = ChannelRegistry::new();
        let a = registry.register(test_addr());
        registry.register(test_addr2());

        assert_eq!(registry.find_by_addr(test_addr()), Some(a));

        let unknown: SocketAddr = "192.168.1.1:9999".parse().unwrap();
        assert_eq!(registry.find_by_addr(unknown), None);
    }

    #[test]
    fn test_disconnect_returns_last_known_room() {
        let mut registry = ChannelRegistry::new();
        let a = registry.register(test_addr());
        registry.set_room(a, 3);

        assert_eq!(registry.disconnect(a), Some(3));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_disconnect_is_idempotent() {
        let mut registry = ChannelRegistry::new();
        let a = registry.register(test_addr());

        assert_eq!(registry.disconnect(a), None);
        assert_eq!(registry.disconnect(a), None);
        assert_eq!(registry.disconnect(999), None);
    }

    #[test]
    fn test_room_back_reference() {
        let mut registry = ChannelRegistry::new();
        let a = registry.register(test_addr());

        assert_eq!(registry.room_of(a), None);
        registry.set_room(a, 0);
        assert_eq!(registry.room_of(a), Some(0));
    }

    #[test]
    fn test_timeout_detection() {
        let mut registry = ChannelRegistry::new();
        let a = registry.register(test_addr());
        let b = registry.register(test_addr2());

        assert!(registry.check_timeouts(Duration::from_secs(1)).is_empty());

        if let Some(channel) = registry.channels.get_mut(&a) {
            channel.last_seen = Instant::now() - Duration::from_secs(2);
        }

        let expired = registry.check_timeouts(Duration::from_secs(1));
        assert_eq!(expired, vec![a]);
        // Sweep does not remove; the disconnect path does
        assert_eq!(registry.len(), 2);
        assert!(registry.addr_of(b).is_some());
    }

    #[test]
    fn test_touch_refreshes_liveness() {
        let mut registry = ChannelRegistry::new();
        let a = registry.register(test_addr());

        if let Some(channel) = registry.channels.get_mut(&a) {
            channel.last_seen = Instant::now() - Duration::from_secs(2);
        }
        registry.touch(a);

        assert!(registry.check_timeouts(Duration::from_secs(1)).is_empty());
    }
}
