//! Relay router forwarding events between the two members of a room
//!
//! The router owns the active-room membership table. It never inspects
//! paddle or ball payloads; its only job is answering "who is the other
//! member of the sender's room" and tearing membership down on disconnect.
//! A sender with no active room is not an error: disconnects race with
//! in-flight events under concurrent delivery, so those lookups simply
//! return nothing and the caller drops the event.

use crate::pairing::PairedRoom;
use log::{info, warn};
use shared::{ChannelId, RoomId};
use std::collections::HashMap;
use thiserror::Error;

/// Consistency violations in the membership table.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("channel {channel_id} is already a member of room {room_id}")]
    AlreadyInRoom {
        channel_id: ChannelId,
        room_id: RoomId,
    },
}

/// Result of removing a channel from its room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub room_id: RoomId,
    /// The member still present, so the caller can notify it.
    pub remaining: Option<ChannelId>,
}

/// Membership table for active rooms.
pub struct RelayRouter {
    rooms: HashMap<RoomId, Vec<ChannelId>>,
    by_channel: HashMap<ChannelId, RoomId>,
}

impl RelayRouter {
    pub fn new() -> Self {
        Self {
            rooms: HashMap::new(),
            by_channel: HashMap::new(),
        }
    }

    /// Installs a freshly paired room.
    ///
    /// A member already belonging to another room indicates a pairing bug;
    /// the room is rejected and nothing is installed.
    pub fn open_room(&mut self, paired: &PairedRoom) -> Result<(), RelayError> {
        for member in paired.members {
            if let Some(&room_id) = self.by_channel.get(&member) {
                return Err(RelayError::AlreadyInRoom {
                    channel_id: member,
                    room_id,
                });
            }
        }

        self.rooms.insert(paired.room_id, paired.members.to_vec());
        for member in paired.members {
            self.by_channel.insert(member, paired.room_id);
        }

        Ok(())
    }

    /// The other member of the sender's room, or `None` when the sender is
    /// unpaired or already removed. Never returns the sender itself.
    pub fn opponent_of(&self, sender: ChannelId) -> Option<ChannelId> {
        let room_id = self.by_channel.get(&sender)?;
        self.rooms
            .get(room_id)?
            .iter()
            .find(|&&member| member != sender)
            .copied()
    }

    /// The sender's room, if it has one.
    pub fn room_of(&self, channel_id: ChannelId) -> Option<RoomId> {
        self.by_channel.get(&channel_id).copied()
    }

    /// Removes a channel from its room. The room itself is dropped once
    /// both members are gone; there is no room reuse. Idempotent.
    pub fn remove(&mut self, channel_id: ChannelId) -> Option<Departure> {
        let room_id = self.by_channel.remove(&channel_id)?;

        let remaining = match self.rooms.get_mut(&room_id) {
            Some(members) => {
                members.retain(|&member| member != channel_id);
                members.first().copied()
            }
            None => {
                warn!(
                    "Channel {} referenced missing room {}",
                    channel_id, room_id
                );
                None
            }
        };

        if remaining.is_none() {
            self.rooms.remove(&room_id);
            info!("Room {} closed", room_id);
        }

        Some(Departure { room_id, remaining })
    }

    /// Number of rooms with at least one member still connected.
    pub fn active_rooms(&self) -> usize {
        self.rooms.len()
    }
}

impl Default for RelayRouter {
    fn default() -> Self {
        Self::new()
    }
}
