//! Side-scrolling runner: jump over cacti, duck under birds.
//!
//! All movement is per tick (the game runs at a fixed rate), only the duck
//! duration is measured in wall-clock time.

use crate::core::controls::{DinoCommand, DinoControls};
use crate::core::geometry::Rect;
use crate::domain::model::{GameKind, GameOutcome, GameStatus, ModelInfo};
use crate::domain::ports::{Game, Hud};
use crate::render::{Canvas, Color};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

const BACKGROUND: Color = [235, 235, 235];
const GROUND: Color = [83, 83, 83];
const DINO: Color = [20, 20, 20];
const BIRD: Color = [0, 0, 255];
const CACTUS: Color = [34, 139, 34];
const HUD_TEXT: Color = [0, 0, 0];
const HUD_PX: f32 = 20.0;

const DINO_X: f32 = 50.0;
const DINO_SIZE: i32 = 40;
const DINO_DUCK_HEIGHT: i32 = 20;
const CACTUS_SIZE: (i32, i32) = (20, 30);
const BIRD_SIZE: (i32, i32) = (30, 20);
const BIRD_ALTITUDE: f32 = 50.0;
const SPAWN_MARGIN: f32 = 50.0;
const POINTS_PER_OBSTACLE: u32 = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DinoConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub gravity: f32,
    pub jump_velocity: f32,
    /// 地面距離視窗底部的高度
    pub ground_offset: u32,
    pub max_lives: u32,
    pub duck_duration_ms: u64,
    pub jump_cooldown_ms: u64,
    pub confidence_threshold: f32,
    pub jump_gesture: String,
    pub duck_gesture: String,
    pub bird_chance: f64,
    pub onboarding_secs: u32,
}

impl Default for DinoConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 300,
            fps: 60,
            gravity: 0.9,
            jump_velocity: -12.0,
            ground_offset: 40,
            max_lives: 3,
            duck_duration_ms: 1000,
            jump_cooldown_ms: 500,
            confidence_threshold: 0.60,
            jump_gesture: "peace".to_string(),
            duck_gesture: "good".to_string(),
            bird_chance: 0.3,
            onboarding_secs: 3,
        }
    }
}

impl DinoConfig {
    pub fn ground_y(&self) -> f32 {
        self.height.saturating_sub(self.ground_offset) as f32
    }
}

#[derive(Debug, Clone)]
struct Dino {
    x: f32,
    y: f32,
    w: i32,
    h: i32,
    dy: f32,
    on_ground: bool,
    duck_until: Option<Instant>,
}

impl Dino {
    fn new(ground_y: f32) -> Self {
        Self {
            x: DINO_X,
            y: ground_y - DINO_SIZE as f32,
            w: DINO_SIZE,
            h: DINO_SIZE,
            dy: 0.0,
            on_ground: true,
            duck_until: None,
        }
    }

    fn is_ducking(&self) -> bool {
        self.duck_until.is_some()
    }

    fn jump(&mut self, velocity: f32) {
        if self.on_ground && !self.is_ducking() {
            self.dy = velocity;
            self.on_ground = false;
        }
    }

    fn duck(&mut self, ground_y: f32, now: Instant, duration: Duration) {
        if self.on_ground && !self.is_ducking() {
            self.h = DINO_DUCK_HEIGHT;
            self.y = ground_y - self.h as f32;
            self.duck_until = Some(now + duration);
        }
    }

    fn update(&mut self, gravity: f32, ground_y: f32, now: Instant) {
        self.dy += gravity * 0.6;
        self.y += self.dy;

        let floor = ground_y - self.h as f32;
        if self.y >= floor {
            self.y = floor;
            self.dy = 0.0;
            self.on_ground = true;
        } else {
            self.on_ground = false;
        }

        if matches!(self.duck_until, Some(until) if now > until) {
            self.duck_until = None;
            self.h = DINO_SIZE;
            self.y = ground_y - self.h as f32;
        }
    }

    fn land(&mut self, ground_y: f32) {
        self.y = ground_y - self.h as f32;
        self.dy = 0.0;
        self.on_ground = true;
    }

    fn rect(&self) -> Rect {
        Rect::new(self.x as i32, self.y as i32, self.w, self.h)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ObstacleKind {
    Cactus,
    Bird,
}

#[derive(Debug, Clone)]
struct Obstacle {
    kind: ObstacleKind,
    x: f32,
    y: f32,
    w: i32,
    h: i32,
    speed: f32,
}

impl Obstacle {
    fn cactus(x: f32, ground_y: f32, speed: u32) -> Self {
        let (w, h) = CACTUS_SIZE;
        Self {
            kind: ObstacleKind::Cactus,
            x,
            y: ground_y - h as f32,
            w,
            h,
            speed: speed as f32,
        }
    }

    /// 飛得夠低，只能蹲下閃
    fn bird(x: f32, ground_y: f32, speed: u32) -> Self {
        let (w, h) = BIRD_SIZE;
        Self {
            kind: ObstacleKind::Bird,
            x,
            y: ground_y - BIRD_ALTITUDE,
            w,
            h,
            speed: speed as f32,
        }
    }

    fn rect(&self) -> Rect {
        Rect::new(self.x as i32, self.y as i32, self.w, self.h)
    }
}

pub struct DinoGame {
    config: DinoConfig,
    ground_y: f32,
    dino: Dino,
    obstacles: Vec<Obstacle>,
    spawn_timer: i32,
    score: u32,
    lives: u32,
    ticks: u64,
    status: GameStatus,
    rng: ChaCha8Rng,
}

impl DinoGame {
    pub fn new(config: DinoConfig, seed: u64) -> Self {
        let ground_y = config.ground_y();
        let lives = config.max_lives;
        Self {
            dino: Dino::new(ground_y),
            ground_y,
            obstacles: Vec::new(),
            spawn_timer: 0,
            score: 0,
            lives,
            ticks: 0,
            status: GameStatus::Running,
            rng: ChaCha8Rng::seed_from_u64(seed),
            config,
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    fn spawn_obstacles(&mut self) {
        self.spawn_timer -= 1;
        if self.spawn_timer > 0 {
            return;
        }

        let speed = 6 + self.score / 100;
        let x = self.config.width as f32 + SPAWN_MARGIN;
        let obstacle = if self.rng.random_bool(self.config.bird_chance.clamp(0.0, 1.0)) {
            Obstacle::bird(x, self.ground_y, speed + 1)
        } else {
            Obstacle::cactus(x, self.ground_y, speed)
        };
        tracing::trace!("Spawned {:?} at speed {}", obstacle.kind, obstacle.speed);
        self.obstacles.push(obstacle);
        self.spawn_timer = (90 - (self.score / 10).min(50) as i32).max(30);
    }

    fn advance_obstacles(&mut self) {
        let before = self.obstacles.len();
        for obstacle in &mut self.obstacles {
            obstacle.x -= obstacle.speed;
        }
        self.obstacles
            .retain(|o| o.x + o.w as f32 >= 0.0);
        let passed = (before - self.obstacles.len()) as u32;
        self.score += passed * POINTS_PER_OBSTACLE;
    }

    /// 只處理第一個撞到的障礙物
    fn resolve_collision(&mut self) {
        let dino = self.dino.rect();
        let Some(index) = self.obstacles.iter().position(|o| dino.collides(&o.rect())) else {
            return;
        };
        let hit = self.obstacles.remove(index);
        self.lives = self.lives.saturating_sub(1);
        tracing::debug!("💥 Hit {:?}, {} lives left", hit.kind, self.lives);

        if self.lives == 0 {
            self.status = GameStatus::GameOver;
        } else {
            self.dino.land(self.ground_y);
        }
    }

    fn onboarding_ticks(&self) -> u64 {
        self.config.fps as u64 * self.config.onboarding_secs as u64
    }
}

impl Game for DinoGame {
    type Controls = DinoControls;

    fn title(&self) -> &str {
        "Dino - Jump & Duck Gestures"
    }

    fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    fn fps(&self) -> u32 {
        self.config.fps
    }

    fn controls(&self, _model: &ModelInfo) -> DinoControls {
        DinoControls::new(
            &self.config.jump_gesture,
            &self.config.duck_gesture,
            self.config.confidence_threshold,
            Duration::from_millis(self.config.jump_cooldown_ms),
        )
    }

    fn step(&mut self, command: DinoCommand, now: Instant) -> GameStatus {
        if self.status == GameStatus::GameOver {
            return self.status;
        }
        self.ticks += 1;

        if command.jump {
            self.dino.jump(self.config.jump_velocity);
        }
        if command.duck {
            self.dino.duck(
                self.ground_y,
                now,
                Duration::from_millis(self.config.duck_duration_ms),
            );
        }
        self.dino.update(self.config.gravity, self.ground_y, now);

        self.spawn_obstacles();
        self.advance_obstacles();
        self.resolve_collision();

        self.status
    }

    fn draw(&self, canvas: &mut Canvas, hud: &Hud<'_>) {
        canvas.fill(BACKGROUND);
        let ground = self.ground_y as i32;
        canvas.fill_rect(
            Rect::new(0, ground, self.config.width as i32, self.config.height as i32 - ground),
            GROUND,
        );
        canvas.fill_rect(self.dino.rect(), DINO);

        for obstacle in &self.obstacles {
            let color = match obstacle.kind {
                ObstacleKind::Bird => BIRD,
                ObstacleKind::Cactus => CACTUS,
            };
            canvas.fill_rect(obstacle.rect(), color);
        }

        let Some(font) = hud.font else {
            return;
        };
        canvas.draw_text(font, &format!("Score: {}", self.score), 10, 10, HUD_PX, HUD_TEXT);
        canvas.draw_text(font, &format!("Lives: {}", self.lives), 10, 34, HUD_PX, HUD_TEXT);
        if let Some(gesture) = &hud.last_gesture {
            canvas.draw_text(font, &format!("Gesture: {}", gesture), 10, 58, HUD_PX, HUD_TEXT);
        }
        if let Some(best) = hud.best_score {
            let text = format!("Best: {}", best.max(self.score));
            let x = self.config.width as i32 - font.text_width(&text, HUD_PX) as i32 - 10;
            canvas.draw_text(font, &text, x, 10, HUD_PX, HUD_TEXT);
        }
        if self.ticks <= self.onboarding_ticks() {
            let hint = format!(
                "{} = jump | {} = duck",
                self.config.jump_gesture, self.config.duck_gesture
            );
            canvas.draw_text(font, &hint, 200, 10, HUD_PX, HUD_TEXT);
        }
    }

    fn outcome(&self) -> GameOutcome {
        GameOutcome {
            game: GameKind::Dino,
            score: self.score,
            detail: format!("lives={}", self.lives),
            game_over: self.status == GameStatus::GameOver,
        }
    }
}
