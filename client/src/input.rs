//! Client input sampling for paddle movement

use macroquad::prelude::*;
use shared::PADDLE_SPEED;

/// One frame of sampled input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInput {
    /// Horizontal paddle displacement for this frame, already speed-scaled
    pub dx: f32,
    /// Player asked to leave the game
    pub quit: bool,
}

/// Samples movement keys and turns them into paddle displacement.
///
/// The session decides whether the displacement actually moves the paddle
/// (walls clamp it), so no paddleMove event is emitted for a frame where
/// nothing changed.
pub struct InputManager {
    prev_escape: bool,
}

impl InputManager {
    pub fn new() -> Self {
        Self { prev_escape: false }
    }

    /// Samples the keyboard for one frame. `dt` is the frame duration in
    /// seconds.
    pub fn sample(&mut self, dt: f32) -> FrameInput {
        let left = is_key_down(KeyCode::A) || is_key_down(KeyCode::Left);
        let right = is_key_down(KeyCode::D) || is_key_down(KeyCode::Right);
        let dx = displacement(left, right, dt);

        // Edge-detect quit so holding the key does not fire repeatedly
        let escape = is_key_down(KeyCode::Escape);
        let quit = escape && !self.prev_escape;
        self.prev_escape = escape;

        FrameInput { dx, quit }
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

fn displacement(left: bool, right: bool, dt: f32) -> f32 {
    let mut dx = 0.0;
    if left {
        dx -= PADDLE_SPEED * dt;
    }
    if right {
        dx += PADDLE_SPEED * dt;
    }
    dx
}
