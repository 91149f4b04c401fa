//! Room pairing engine grouping ready channels two at a time
//!
//! Pairing is driven by a process-wide readiness counter: the n-th `ready`
//! signal lands in room `n / 2`, so two consecutive ready signals always
//! compute the same room identity. The counter is initialized to zero,
//! never decremented and never reset; a channel that disconnects while
//! waiting leaves its slot's room identity permanently retired, which is
//! what prevents a later channel from being paired into the ghost slot.
//!
//! The first channel to arrive in a room is its referee, the peer that
//! runs the authoritative ball simulation.

use log::{debug, info};
use shared::{ChannelId, RoomId};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Internal consistency violations. These indicate a counter or dispatch
/// bug, not bad client traffic; the caller fails the offending channel's
/// session instead of crashing the process.
#[derive(Debug, Error)]
pub enum PairingError {
    #[error("room {room_id} already has two members; cannot admit channel {channel_id}")]
    RoomOverflow {
        room_id: RoomId,
        channel_id: ChannelId,
    },
}

/// A completed pairing, announced the instant the second member readies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairedRoom {
    pub room_id: RoomId,
    /// The first-arriving member, designated physics authority.
    pub referee: ChannelId,
    /// Members in arrival order.
    pub members: [ChannelId; 2],
}

/// Seam between the pairing strategy and the rest of the protocol.
///
/// The counter-arithmetic strategy below can be swapped for an explicit
/// waiting queue without changing the router or the network layer.
pub trait Pairing {
    /// Buckets a ready channel into a room. Returns the completed pairing
    /// once the room reaches two members, `None` while it is still waiting.
    fn on_ready(&mut self, channel_id: ChannelId) -> Result<Option<PairedRoom>, PairingError>;

    /// Drops a channel that disconnected. If it was alone in a waiting
    /// room, the room is discarded; the readiness counter never rewinds.
    /// Returns true if the channel was known to the engine.
    fn abandon(&mut self, channel_id: ChannelId) -> bool;
}

/// Counter-based pairing: room identity is the readiness counter divided
/// by two.
pub struct CounterPairing {
    ready_count: u64,
    waiting: HashMap<RoomId, Vec<ChannelId>>,
    /// Channels that have readied (waiting or paired); duplicate ready
    /// signals from these must not advance the counter.
    engaged: HashSet<ChannelId>,
}

impl CounterPairing {
    pub fn new() -> Self {
        Self {
            ready_count: 0,
            waiting: HashMap::new(),
            engaged: HashSet::new(),
        }
    }

    /// Number of ready signals accepted so far.
    pub fn ready_count(&self) -> u64 {
        self.ready_count
    }

    /// Number of single-member rooms still waiting for an opponent.
    pub fn waiting_rooms(&self) -> usize {
        self.waiting.len()
    }
}

impl Pairing for CounterPairing {
    fn on_ready(&mut self, channel_id: ChannelId) -> Result<Option<PairedRoom>, PairingError> {
        if self.engaged.contains(&channel_id) {
            debug!("Ignoring duplicate ready from channel {}", channel_id);
            return Ok(None);
        }

        let room_id = (self.ready_count / 2) as RoomId;
        let members = self.waiting.entry(room_id).or_default();

        if members.len() >= 2 {
            return Err(PairingError::RoomOverflow {
                room_id,
                channel_id,
            });
        }

        members.push(channel_id);
        self.engaged.insert(channel_id);
        self.ready_count += 1;

        if members.len() == 2 {
            let members = self.waiting.remove(&room_id).unwrap_or_default();
            let paired = PairedRoom {
                room_id,
                referee: members[0],
                members: [members[0], members[1]],
            };
            info!(
                "Room {} active: channels {:?}, referee {}",
                room_id, paired.members, paired.referee
            );
            Ok(Some(paired))
        } else {
            info!("Channel {} waiting in room {}", channel_id, room_id);
            Ok(None)
        }
    }

    fn abandon(&mut self, channel_id: ChannelId) -> bool {
        if !self.engaged.remove(&channel_id) {
            return false;
        }

        // Drop the channel's waiting room, if it was still unpaired. The
        // room identity is retired with it.
        self.waiting.retain(|room_id, members| {
            if members.contains(&channel_id) {
                info!(
                    "Channel {} left waiting room {} before pairing",
                    channel_id, room_id
                );
                false
            } else {
                true
            }
        });

        true
    }
}

impl Default for CounterPairing {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_ready_waits() {
        let mut pairing = CounterPairing::new();

        let result = pairing.on_ready(1).unwrap();

        assert_eq!(result, None);
        assert_eq!(pairing.ready_count(), 1);
        assert_eq!(pairing.waiting_rooms(), 1);
    }

    #[test]
    fn test_second_ready_completes_room() {
        let mut pairing = CounterPairing::new();

        assert_eq!(pairing.on_ready(1).unwrap(), None);
        let paired = pairing.on_ready(2).unwrap().unwrap();

        assert_eq!(paired.room_id, 0);
        assert_eq!(paired.referee, 1);
        assert_eq!(paired.members, [1, 2]);
        assert_eq!(pairing.waiting_rooms(), 0);
    }

    #[test]
    fn test_four_channels_form_two_rooms() {
        let mut pairing = CounterPairing::new();
        let (x, y, z, w) = (10, 20, 30, 40);

        assert_eq!(pairing.on_ready(x).unwrap(), None);
        let first = pairing.on_ready(y).unwrap().unwrap();
        assert_eq!(pairing.on_ready(z).unwrap(), None);
        let second = pairing.on_ready(w).unwrap().unwrap();

        assert_eq!(first.room_id, 0);
        assert_eq!(first.members, [x, y]);
        assert_eq!(first.referee, x);

        assert_eq!(second.room_id, 1);
        assert_eq!(second.members, [z, w]);
        assert_eq!(second.referee, z);
    }

    #[test]
    fn test_referee_is_deterministic() {
        // Same arrival order must always produce the same referee
        for _ in 0..10 {
            let mut pairing = CounterPairing::new();
            pairing.on_ready(7).unwrap();
            let paired = pairing.on_ready(3).unwrap().unwrap();
            assert_eq!(paired.referee, 7);
        }
    }

    #[test]
    fn test_duplicate_ready_does_not_advance_counter() {
        let mut pairing = CounterPairing::new();

        assert_eq!(pairing.on_ready(1).unwrap(), None);
        assert_eq!(pairing.on_ready(1).unwrap(), None);
        assert_eq!(pairing.ready_count(), 1);

        // The next distinct channel still pairs with the first
        let paired = pairing.on_ready(2).unwrap().unwrap();
        assert_eq!(paired.members, [1, 2]);
    }

    #[test]
    fn test_abandon_retires_ghost_slot() {
        let mut pairing = CounterPairing::new();

        // X readies then disconnects before an opponent arrives
        assert_eq!(pairing.on_ready(1).unwrap(), None);
        assert!(pairing.abandon(1));
        assert_eq!(pairing.waiting_rooms(), 0);

        // Counter did not rewind: no later channel pairs with X's ghost
        assert_eq!(pairing.ready_count(), 1);
        assert_eq!(pairing.on_ready(2).unwrap(), None);
        assert_eq!(pairing.on_ready(3).unwrap(), None);
        let paired = pairing.on_ready(4).unwrap().unwrap();

        assert_eq!(paired.members, [3, 4]);
        assert!(!paired.members.contains(&1));
        assert!(!paired.members.contains(&2));
    }

    #[test]
    fn test_abandon_unknown_channel() {
        let mut pairing = CounterPairing::new();
        assert!(!pairing.abandon(42));
    }

    #[test]
    fn test_paired_channel_cannot_reready() {
        let mut pairing = CounterPairing::new();

        pairing.on_ready(1).unwrap();
        pairing.on_ready(2).unwrap();

        // Both are engaged; their ready signals are ignored now
        assert_eq!(pairing.on_ready(1).unwrap(), None);
        assert_eq!(pairing.on_ready(2).unwrap(), None);
        assert_eq!(pairing.ready_count(), 2);
    }

    #[test]
    fn test_room_overflow_is_fatal() {
        let mut pairing = CounterPairing::new();

        // Force an inconsistent waiting room to verify fail-fast behavior
        pairing.waiting.insert(0, vec![1, 2]);

        let result = pairing.on_ready(3);
        assert!(matches!(
            result,
            Err(PairingError::RoomOverflow {
                room_id: 0,
                channel_id: 3
            })
        ));
    }

    #[test]
    fn test_many_channels_all_pair_in_arrival_order() {
        let mut pairing = CounterPairing::new();
        let mut rooms = Vec::new();

        for ch in 1..=100 {
            if let Some(paired) = pairing.on_ready(ch).unwrap() {
                rooms.push(paired);
            }
        }

        assert_eq!(rooms.len(), 50);
        for (i, room) in rooms.iter().enumerate() {
            let first = (i as u32) * 2 + 1;
            assert_eq!(room.room_id, i as u32);
            assert_eq!(room.members, [first, first + 1]);
            assert_eq!(room.referee, first);
        }
    }
}
