use log::info;
use shared::{clamp_paddle, BallState, ChannelId, RoomId, BOARD_WIDTH, PADDLE_WIDTH};

/// Where the session currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    WaitingForOpponent,
    Playing,
    GameOver { winner: usize },
    PeerLeft,
}

/// Local game session for one connected player.
///
/// Exactly one of the two peers is referee: it runs the ball simulation
/// and broadcasts the result every frame. The other peer runs no physics
/// at all; its ball and score are overwritten by whatever the referee
/// sends. Paddle index 0 belongs to the referee (bottom of the board),
/// index 1 to the mirror peer (top).
pub struct GameSession {
    phase: SessionPhase,
    is_referee: bool,
    paddle_index: usize,
    paddle_x: [f32; 2],
    ball: BallState,
    /// Set once the local player has moved; until then the referee serves
    /// the ball straight.
    player_moved: bool,
    room_id: Option<RoomId>,
}

impl GameSession {
    pub fn new() -> Self {
        let center = BOARD_WIDTH / 2.0 - PADDLE_WIDTH / 2.0;
        Self {
            phase: SessionPhase::WaitingForOpponent,
            is_referee: false,
            paddle_index: 0,
            paddle_x: [center, center],
            ball: BallState::new(),
            player_moved: false,
            room_id: None,
        }
    }

    /// Begins play once the server announces the pairing. The referee flag
    /// comes from comparing our own identity against the announced one.
    pub fn start(&mut self, own_id: ChannelId, referee_id: ChannelId, room_id: RoomId) {
        self.is_referee = own_id == referee_id;
        self.paddle_index = if self.is_referee { 0 } else { 1 };
        self.room_id = Some(room_id);
        self.phase = SessionPhase::Playing;

        info!(
            "Room {} started; referee is {} (we are {})",
            room_id,
            referee_id,
            if self.is_referee { "referee" } else { "mirror" }
        );
    }

    /// Moves the local paddle by `dx`, clamped to the board. Returns the
    /// new position when the paddle actually moved, so the caller knows a
    /// paddleMove event is worth sending.
    pub fn move_local_paddle(&mut self, dx: f32) -> Option<f32> {
        if self.phase != SessionPhase::Playing || dx == 0.0 {
            return None;
        }

        let current = self.paddle_x[self.paddle_index];
        let moved = clamp_paddle(current + dx);
        if moved == current {
            return None;
        }

        self.paddle_x[self.paddle_index] = moved;
        self.player_moved = true;
        Some(moved)
    }

    /// Applies a relayed paddle position to the opponent's paddle. The
    /// local paddle is never touched by network input.
    pub fn apply_opponent_paddle(&mut self, x_position: f32) {
        self.paddle_x[1 - self.paddle_index] = clamp_paddle(x_position);
    }

    /// Overwrites ball and score with the referee's values. The mirror
    /// peer has no physics of its own, so this is its only source of
    /// ball truth.
    pub fn apply_ball_snapshot(&mut self, ball_x: f32, ball_y: f32, score: [u32; 2]) {
        self.ball.x = ball_x;
        self.ball.y = ball_y;
        self.ball.score = score;
        self.check_winner();
    }

    /// Advances the ball one frame and returns the state to broadcast.
    /// Only the referee produces anything; the mirror peer ignores its
    /// simulation clock entirely.
    pub fn step_ball(&mut self) -> Option<(f32, f32, [u32; 2])> {
        if !self.is_referee || self.phase != SessionPhase::Playing {
            return None;
        }

        self.ball.step(self.paddle_x, self.player_moved);
        let snapshot = (self.ball.x, self.ball.y, self.ball.score);
        self.check_winner();
        Some(snapshot)
    }

    /// Marks the opponent as gone; play cannot continue.
    pub fn peer_left(&mut self) {
        if self.phase == SessionPhase::Playing {
            info!("Opponent left the room");
            self.phase = SessionPhase::PeerLeft;
        }
    }

    fn check_winner(&mut self) {
        if self.phase != SessionPhase::Playing {
            return;
        }
        if let Some(winner) = self.ball.winner() {
            info!("Game over: player {} wins {:?}", winner + 1, self.ball.score);
            self.phase = SessionPhase::GameOver { winner };
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_referee(&self) -> bool {
        self.is_referee
    }

    pub fn paddle_positions(&self) -> [f32; 2] {
        self.paddle_x
    }

    pub fn local_paddle_index(&self) -> usize {
        self.paddle_index
    }

    pub fn ball(&self) -> &BallState {
        &self.ball
    }

    pub fn score(&self) -> [u32; 2] {
        self.ball.score
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}
