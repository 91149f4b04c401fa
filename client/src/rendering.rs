use crate::game::{GameSession, SessionPhase};
use macroquad::prelude::*;
use shared::{BALL_RADIUS, BOARD_HEIGHT, BOARD_WIDTH, PADDLE_HEIGHT, PADDLE_WIDTH};

pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Renderer
    }

    pub fn render(&mut self, session: &GameSession) {
        clear_background(BLACK);

        match session.phase() {
            SessionPhase::WaitingForOpponent => {
                self.draw_center_text("Waiting for opponent...");
            }
            SessionPhase::Playing => {
                self.draw_board(session);
            }
            SessionPhase::GameOver { winner } => {
                self.draw_board(session);
                let banner = format!("Player {} wins!", winner + 1);
                self.draw_center_text(&banner);
            }
            SessionPhase::PeerLeft => {
                self.draw_board(session);
                self.draw_center_text("Opponent left");
            }
        }
    }

    fn draw_board(&mut self, session: &GameSession) {
        let paddles = session.paddle_positions();
        let ball = session.ball();
        let score = session.score();

        // Bottom paddle (referee side)
        draw_rectangle(
            paddles[0],
            BOARD_HEIGHT - 20.0,
            PADDLE_WIDTH,
            PADDLE_HEIGHT,
            WHITE,
        );

        // Top paddle
        draw_rectangle(paddles[1], 10.0, PADDLE_WIDTH, PADDLE_HEIGHT, WHITE);

        self.draw_center_line();

        draw_circle(ball.x, ball.y, BALL_RADIUS, WHITE);

        // Scores sit either side of the center line
        let score_color = Color::from_rgba(255, 255, 255, 255);
        draw_text(
            &score[0].to_string(),
            20.0,
            BOARD_HEIGHT / 2.0 + 50.0,
            32.0,
            score_color,
        );
        draw_text(
            &score[1].to_string(),
            20.0,
            BOARD_HEIGHT / 2.0 - 30.0,
            32.0,
            score_color,
        );
    }

    fn draw_center_line(&mut self) {
        let dash = 6.0;
        let y = BOARD_HEIGHT / 2.0;
        let mut x = 0.0;

        while x < BOARD_WIDTH {
            draw_line(
                x,
                y,
                (x + dash).min(BOARD_WIDTH),
                y,
                1.0,
                Color::from_rgba(136, 136, 136, 255),
            );
            x += dash * 2.0;
        }
    }

    fn draw_center_text(&mut self, text: &str) {
        draw_text(text, 20.0, BOARD_HEIGHT / 2.0 - 30.0, 32.0, WHITE);
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}
