//! # Pong Client Library
//!
//! This library implements the playable client for the two-player relayed
//! Pong game: input capture, the local game session, network communication
//! with the relay server, and rendering.
//!
//! ## Architecture Overview
//!
//! The client follows the referee model of the relay protocol. When a room
//! starts, the server names one of the two channels referee; that peer runs
//! the entire ball simulation locally and broadcasts the result every frame.
//! The other peer is a passive mirror: it performs no physics of its own and
//! simply overwrites its ball position and score with whatever the referee
//! sends. Both peers own their local paddle and relay its movement.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! The per-player session state machine:
//! - Waiting, playing, game-over and peer-left phases
//! - Referee designation from the server's start announcement
//! - Referee-only ball stepping producing broadcast payloads
//! - Opponent paddle and ball mirroring for relayed events
//!
//! ### Input Module (`input`)
//! Keyboard sampling for paddle movement:
//! - Left/right displacement scaled by frame time
//! - Edge-detected quit handling
//!
//! ### Network Module (`network`)
//! Manages all client-server communication:
//! - UDP socket management and the connect/ready handshake
//! - Packet serialization and deserialization
//! - Optional simulated latency for testing under lag
//!
//! ### Rendering Module (`rendering`)
//! Draws the board with macroquad:
//! - Paddles, ball, dashed center line and scores
//! - Waiting, game-over and opponent-left overlays
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::game::GameSession;
//!
//! let mut session = GameSession::new();
//!
//! // The server announced the pairing; we are channel 3, referee is 3
//! session.start(3, 3, 0);
//! assert!(session.is_referee());
//!
//! // Referee frames produce ball state to broadcast
//! if let Some((ball_x, ball_y, score)) = session.step_ball() {
//!     let _ = (ball_x, ball_y, score);
//! }
//! ```

pub mod game;
pub mod input;
pub mod network;
pub mod rendering;
