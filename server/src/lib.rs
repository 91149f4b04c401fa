//! # Pong Relay Server Library
//!
//! This library implements the relay server for the two-player Pong game:
//! it turns an unordered stream of socket connections into stable two-party
//! rooms and forwards paddle and ball events between exactly the two members
//! of each room.
//!
//! ## Core Responsibilities
//!
//! ### Connection Registry
//! Every connecting endpoint is assigned a unique, stable channel identity.
//! The registry associates identities with network addresses, tracks
//! liveness, and guarantees disconnect handling is idempotent.
//!
//! ### Room Pairing
//! Channels that signal readiness are grouped two at a time into rooms by a
//! monotonic readiness counter (`room = n / 2`). The first arrival in each
//! room is designated referee: the peer that runs the authoritative ball
//! simulation for that room. The counter never rewinds, so a channel that
//! disconnects while waiting retires its slot instead of letting a later
//! channel be paired into it.
//!
//! ### Event Relay
//! Paddle and ball events are forwarded verbatim to the sender's opponent
//! only, never back to the sender and never across rooms. The relay does
//! not interpret payloads; the clients own the game rules. Events from
//! unpaired or departed channels are dropped silently, since disconnects
//! race with in-flight traffic.
//!
//! ## Architecture Design
//!
//! ### Single-Threaded Dispatch
//! All registry, pairing and relay mutations happen sequentially in one
//! dispatch loop reacting to channel events, so the shared tables need no
//! fine-grained locking and behavior is deterministic for a given event
//! order.
//!
//! ### Ordered Delivery
//! Outbound packets for all channels drain through a single sender task in
//! queue order. For a fixed pair of channels this preserves the relative
//! order of a sender's events as observed by its opponent.
//!
//! ### UDP Transport
//! Communication uses UDP with bincode-serialized packets, matching the
//! low-latency requirements of real-time paddle and ball updates. Malformed
//! datagrams are logged and dropped; a single bad packet never takes the
//! process down.
//!
//! ## Module Organization
//!
//! - [`registry`]: channel identities, address lookup, liveness, and
//!   idempotent disconnect.
//! - [`pairing`]: the readiness counter, waiting rooms, and referee
//!   designation, behind a swappable [`pairing::Pairing`] trait.
//! - [`relay`]: active-room membership and opponent lookup for verbatim
//!   forwarding.
//! - [`network`]: the UDP socket tasks and the dispatch loop wiring the
//!   three components together.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::Server;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut server = Server::new("127.0.0.1:3000", Duration::from_secs(5)).await?;
//!
//!     // Runs the dispatch loop: registers connections, pairs ready
//!     // channels into rooms, relays paddle/ball events, and cleans up
//!     // disconnects and timeouts.
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod network;
pub mod pairing;
pub mod registry;
pub mod relay;
