use serde::{Deserialize, Serialize};

pub const BOARD_WIDTH: f32 = 500.0;
pub const BOARD_HEIGHT: f32 = 610.0;
pub const PADDLE_WIDTH: f32 = 50.0;
pub const PADDLE_HEIGHT: f32 = 10.0;
pub const PADDLE_DIFF: f32 = 25.0;
pub const PADDLE_SPEED: f32 = 360.0;
pub const BALL_RADIUS: f32 = 5.0;
pub const BALL_START_SPEED: f32 = 2.0;
pub const BALL_RESET_SPEED: f32 = 3.0;
pub const MAX_BALL_SPEED: f32 = 5.0;
pub const WINNING_SCORE: u32 = 8;

/// Server-assigned identity of one connected endpoint.
pub type ChannelId = u32;

/// Identity of a two-channel room, derived from the readiness counter.
pub type RoomId = u32;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum Packet {
    Connect {
        client_version: u32,
    },
    Ready,
    PaddleMove {
        x_position: f32,
    },
    BallMove {
        ball_x: f32,
        ball_y: f32,
        score: [u32; 2],
    },
    Disconnect,

    Connected {
        channel_id: ChannelId,
    },
    StartGame {
        room_id: RoomId,
        referee_id: ChannelId,
    },
    PeerLeft,
    Disconnected {
        reason: String,
    },
}

/// Clamps a paddle's left edge to the playable range of the board.
pub fn clamp_paddle(x: f32) -> f32 {
    x.clamp(0.0, BOARD_WIDTH - PADDLE_WIDTH)
}

/// Outcome of one ball simulation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Flying,
    PaddleBounce,
    /// Index of the player who scored; the ball has been recentered.
    Point(usize),
}

/// Deterministic Pong ball simulation, run only by the referee channel.
///
/// Paddle index 0 guards the bottom edge, index 1 the top edge. `direction`
/// is +1 toward the bottom paddle and -1 toward the top. Horizontal motion
/// only starts once a player has moved their paddle, so the opening serve
/// travels straight.
#[derive(Debug, Clone, PartialEq)]
pub struct BallState {
    pub x: f32,
    pub y: f32,
    pub speed_x: f32,
    pub speed_y: f32,
    pub direction: f32,
    pub score: [u32; 2],
}

impl BallState {
    pub fn new() -> Self {
        Self {
            x: BOARD_WIDTH / 2.0,
            y: BOARD_HEIGHT / 2.0,
            speed_x: 0.0,
            speed_y: BALL_START_SPEED,
            direction: 1.0,
            score: [0, 0],
        }
    }

    /// Recenters the ball after a point or at game start.
    pub fn reset(&mut self) {
        self.x = BOARD_WIDTH / 2.0;
        self.y = BOARD_HEIGHT / 2.0;
        self.speed_y = BALL_RESET_SPEED;
    }

    /// Advances the ball by one frame and resolves wall, paddle and scoring
    /// boundaries. `paddle_x` holds the left edges of the bottom and top
    /// paddles in that order.
    pub fn step(&mut self, paddle_x: [f32; 2], player_moved: bool) -> StepOutcome {
        self.y += self.speed_y * self.direction;
        if player_moved {
            self.x += self.speed_x;
        }

        // Side walls
        if self.x < 0.0 && self.speed_x < 0.0 {
            self.speed_x = -self.speed_x;
        }
        if self.x > BOARD_WIDTH && self.speed_x > 0.0 {
            self.speed_x = -self.speed_x;
        }

        // Bottom edge: paddle 0 bounce or point for player 1
        if self.y > BOARD_HEIGHT - PADDLE_DIFF {
            return self.resolve_paddle_edge(0, paddle_x[0], player_moved);
        }

        // Top edge: paddle 1 bounce or point for player 0
        if self.y < PADDLE_DIFF {
            return self.resolve_paddle_edge(1, paddle_x[1], player_moved);
        }

        StepOutcome::Flying
    }

    fn resolve_paddle_edge(
        &mut self,
        paddle_index: usize,
        paddle_x: f32,
        player_moved: bool,
    ) -> StepOutcome {
        if self.x >= paddle_x && self.x <= paddle_x + PADDLE_WIDTH {
            // Each return hit speeds the rally up, to a cap
            if player_moved {
                self.speed_y = (self.speed_y + 1.0).min(MAX_BALL_SPEED);
            }
            self.direction = -self.direction;
            let trajectory = self.x - (paddle_x + PADDLE_DIFF);
            self.speed_x = trajectory * 0.3;
            StepOutcome::PaddleBounce
        } else {
            let scorer = 1 - paddle_index;
            self.score[scorer] += 1;
            self.reset();
            StepOutcome::Point(scorer)
        }
    }

    /// First player to reach the winning score, if any.
    pub fn winner(&self) -> Option<usize> {
        self.score.iter().position(|&s| s >= WINNING_SCORE)
    }
}

impl Default for BallState {
    fn default() -> Self {
        Self::new()
    }
}
