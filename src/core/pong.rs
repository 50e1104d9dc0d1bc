use crate::core::controls::{PongCommand, PongControls};
use crate::core::geometry::Rect;
use crate::domain::model::{GameKind, GameOutcome, GameStatus, ModelInfo};
use crate::domain::ports::{Game, Hud};
use crate::render::{Canvas, BLACK, WHITE};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

const SCORE_PX: f32 = 28.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PongConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub paddle_width: u32,
    pub paddle_height: u32,
    /// paddle 與左右邊界的距離
    pub paddle_margin: u32,
    pub paddle_speed: i32,
    pub ball_size: u32,
    pub ball_speed_x: i32,
    pub ball_speed_y: i32,
    /// 發球後的垂直速度（隨機正負）
    pub serve_speed_y: i32,
    pub left_gesture: String,
    pub right_gesture: String,
    pub confidence_threshold: f32,
    pub stale_after_ms: u64,
    /// 任一方先到此分數即結束；None 表示無限局
    pub max_score: Option<u32>,
}

impl Default for PongConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 400,
            fps: 30,
            paddle_width: 15,
            paddle_height: 100,
            paddle_margin: 20,
            paddle_speed: 10,
            ball_size: 20,
            ball_speed_x: 10,
            ball_speed_y: 10,
            serve_speed_y: 4,
            left_gesture: "five".to_string(),
            right_gesture: "peace".to_string(),
            confidence_threshold: 0.0,
            stale_after_ms: 250,
            max_score: None,
        }
    }
}

pub struct PongGame {
    config: PongConfig,
    left: Rect,
    right: Rect,
    ball: Rect,
    vx: i32,
    vy: i32,
    score_left: u32,
    score_right: u32,
    status: GameStatus,
    rng: ChaCha8Rng,
}

impl PongGame {
    pub fn new(config: PongConfig, seed: u64) -> Self {
        let w = config.width as i32;
        let h = config.height as i32;
        let pw = config.paddle_width as i32;
        let ph = config.paddle_height as i32;
        let margin = config.paddle_margin as i32;
        let ball = config.ball_size as i32;

        Self {
            left: Rect::new(margin, h / 2 - ph / 2, pw, ph),
            right: Rect::new(w - margin - pw, h / 2 - ph / 2, pw, ph),
            ball: Rect::new(w / 2 - ball / 2, h / 2 - ball / 2, ball, ball),
            vx: config.ball_speed_x,
            vy: config.ball_speed_y,
            score_left: 0,
            score_right: 0,
            status: GameStatus::Running,
            rng: ChaCha8Rng::seed_from_u64(seed),
            config,
        }
    }

    pub fn scores(&self) -> (u32, u32) {
        (self.score_left, self.score_right)
    }

    fn clamp_paddle(&self, paddle: &mut Rect) {
        let max_y = self.config.height as i32 - paddle.h;
        paddle.y = paddle.y.clamp(0, max_y.max(0));
    }

    fn reset_ball(&mut self) {
        let w = self.config.width as i32;
        let h = self.config.height as i32;
        self.ball.x = w / 2 - self.ball.w / 2;
        self.ball.y = h / 2 - self.ball.h / 2;
        self.vx = -self.vx;
        let serve = self.config.serve_speed_y;
        self.vy = if self.rng.random_bool(0.5) { serve } else { -serve };
    }

    fn reached_max_score(&self) -> bool {
        self.config
            .max_score
            .is_some_and(|max| self.score_left >= max || self.score_right >= max)
    }
}

impl Game for PongGame {
    type Controls = PongControls;

    fn title(&self) -> &str {
        "Pong Gesture Game"
    }

    fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    fn fps(&self) -> u32 {
        self.config.fps
    }

    fn controls(&self, model: &ModelInfo) -> PongControls {
        PongControls::new(
            &self.config.left_gesture,
            &self.config.right_gesture,
            self.config.confidence_threshold,
            self.config.paddle_speed,
            model,
            Duration::from_millis(self.config.stale_after_ms),
        )
    }

    fn step(&mut self, command: PongCommand, _now: Instant) -> GameStatus {
        if self.status == GameStatus::GameOver {
            return self.status;
        }

        let mut left = self.left;
        let mut right = self.right;
        left.y += command.left_move;
        right.y += command.right_move;
        self.clamp_paddle(&mut left);
        self.clamp_paddle(&mut right);
        self.left = left;
        self.right = right;

        self.ball.x += self.vx;
        self.ball.y += self.vy;

        if self.ball.top() <= 0 || self.ball.bottom() >= self.config.height as i32 {
            self.vy = -self.vy;
        }

        if self.ball.collides(&self.left) || self.ball.collides(&self.right) {
            self.vx = -self.vx;
        }

        if self.ball.left() <= 0 {
            self.score_right += 1;
            tracing::debug!("🏓 Right scores: {}-{}", self.score_left, self.score_right);
            self.reset_ball();
        } else if self.ball.right() >= self.config.width as i32 {
            self.score_left += 1;
            tracing::debug!("🏓 Left scores: {}-{}", self.score_left, self.score_right);
            self.reset_ball();
        }

        if self.reached_max_score() {
            self.status = GameStatus::GameOver;
        }
        self.status
    }

    fn draw(&self, canvas: &mut Canvas, hud: &Hud<'_>) {
        canvas.fill(BLACK);
        canvas.fill_rect(self.left, WHITE);
        canvas.fill_rect(self.right, WHITE);
        canvas.fill_ellipse(self.ball, WHITE);
        canvas.vline(self.config.width as i32 / 2, WHITE);

        if let Some(font) = hud.font {
            let text = format!("{}   |   {}", self.score_left, self.score_right);
            canvas.draw_text_centered(font, &text, 20, SCORE_PX, WHITE);
        }
    }

    fn outcome(&self) -> GameOutcome {
        GameOutcome {
            game: GameKind::Pong,
            score: self.score_left.max(self.score_right),
            detail: format!("{}-{}", self.score_left, self.score_right),
            game_over: self.status == GameStatus::GameOver,
        }
    }
}
