use crate::domain::model::{Detection, GestureFrame, ModelInfo};
use crate::domain::ports::Controls;
use std::time::{Duration, Instant};

/// 信心值 ≥ threshold 中最高的那個偵測結果
pub fn best_detection(frame: &GestureFrame, threshold: f32) -> Option<&Detection> {
    frame
        .detections
        .iter()
        .filter(|d| !d.label.is_empty() && d.confidence >= threshold)
        .fold(None, |best: Option<&Detection>, d| match best {
            Some(b) if b.confidence >= d.confidence => Some(b),
            _ => Some(d),
        })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DinoCommand {
    pub jump: bool,
    pub duck: bool,
}

#[derive(Debug, Clone)]
pub struct DinoControls {
    jump_gesture: String,
    duck_gesture: String,
    threshold: f32,
    cooldown: Duration,
    pending_jump: bool,
    pending_duck: bool,
    last_jump_at: Option<Instant>,
    last_gesture: Option<String>,
}

impl DinoControls {
    pub fn new(jump_gesture: &str, duck_gesture: &str, threshold: f32, cooldown: Duration) -> Self {
        Self {
            jump_gesture: jump_gesture.to_lowercase(),
            duck_gesture: duck_gesture.to_lowercase(),
            threshold,
            cooldown,
            pending_jump: false,
            pending_duck: false,
            last_jump_at: None,
            last_gesture: None,
        }
    }
}

impl Controls for DinoControls {
    type Command = DinoCommand;

    fn observe(&mut self, frame: &GestureFrame, now: Instant) {
        let best = best_detection(frame, self.threshold);
        let label = best.map(|d| d.label.to_lowercase());
        match label.as_deref() {
            Some(l) if l == self.jump_gesture => {
                let cooled = self
                    .last_jump_at
                    .map_or(true, |t| now.saturating_duration_since(t) >= self.cooldown);
                if cooled {
                    self.pending_jump = true;
                    self.last_jump_at = Some(now);
                    self.last_gesture = Some(self.jump_gesture.clone());
                }
            }
            Some(l) if l == self.duck_gesture => {
                self.pending_duck = true;
                self.last_gesture = Some(self.duck_gesture.clone());
            }
            _ => self.pending_duck = false,
        }
    }

    fn take(&mut self, _now: Instant) -> DinoCommand {
        let command = DinoCommand {
            jump: self.pending_jump,
            duck: self.pending_duck,
        };
        self.pending_jump = false;
        self.pending_duck = false;
        command
    }

    fn last_gesture(&self) -> Option<&str> {
        self.last_gesture.as_deref()
    }
}

/// 每個 paddle 本幀的位移（負值向上）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PongCommand {
    pub left_move: i32,
    pub right_move: i32,
}

#[derive(Debug, Clone)]
pub struct PongControls {
    left_gesture: String,
    right_gesture: String,
    threshold: f32,
    paddle_speed: i32,
    input_height: f32,
    stale_after: Duration,
    latest: Option<(Instant, PongCommand)>,
    last_gesture: Option<String>,
}

impl PongControls {
    pub fn new(
        left_gesture: &str,
        right_gesture: &str,
        threshold: f32,
        paddle_speed: i32,
        model: &ModelInfo,
        stale_after: Duration,
    ) -> Self {
        let (_, input_height) = model.input_size();
        Self {
            left_gesture: left_gesture.to_string(),
            right_gesture: right_gesture.to_string(),
            threshold,
            paddle_speed,
            input_height: input_height as f32,
            stale_after,
            latest: None,
            last_gesture: None,
        }
    }

    fn direction(&self, center_y: f32) -> i32 {
        if center_y < self.input_height / 2.0 {
            -self.paddle_speed
        } else {
            self.paddle_speed
        }
    }
}

impl Controls for PongControls {
    type Command = PongCommand;

    fn observe(&mut self, frame: &GestureFrame, _now: Instant) {
        let mut command = PongCommand::default();
        // 同一幀有多個框時，後面的覆蓋前面的
        for detection in &frame.detections {
            if detection.confidence < self.threshold {
                continue;
            }
            let Some(bbox) = detection.bbox else {
                continue;
            };
            if detection.label == self.left_gesture {
                command.left_move = self.direction(bbox.center_y());
                self.last_gesture = Some(detection.label.clone());
            } else if detection.label == self.right_gesture {
                command.right_move = self.direction(bbox.center_y());
                self.last_gesture = Some(detection.label.clone());
            }
        }
        self.latest = Some((frame.captured_at, command));
    }

    fn take(&mut self, now: Instant) -> PongCommand {
        match self.latest {
            Some((at, command)) if now.saturating_duration_since(at) <= self.stale_after => command,
            _ => PongCommand::default(),
        }
    }

    fn last_gesture(&self) -> Option<&str> {
        self.last_gesture.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::BoundingBox;

    fn det(label: &str, confidence: f32) -> Detection {
        Detection {
            label: label.to_string(),
            confidence,
            bbox: None,
        }
    }

    fn boxed(label: &str, confidence: f32, y: f32) -> Detection {
        Detection {
            label: label.to_string(),
            confidence,
            bbox: Some(BoundingBox {
                x: 0.0,
                y,
                width: 20.0,
                height: 20.0,
            }),
        }
    }

    fn frame(detections: Vec<Detection>, at: Instant) -> GestureFrame {
        GestureFrame {
            detections,
            timing_ms: None,
            captured_at: at,
        }
    }

    fn dino() -> DinoControls {
        DinoControls::new("peace", "good", 0.6, Duration::from_millis(500))
    }

    #[test]
    fn test_best_detection_picks_highest_above_threshold() {
        let now = Instant::now();
        let f = frame(
            vec![det("fist", 0.95), det("peace", 0.7), det("good", 0.65)],
            now,
        );
        assert_eq!(best_detection(&f, 0.6).unwrap().label, "fist");
        assert!(best_detection(&f, 0.99).is_none());
    }

    #[test]
    fn test_best_detection_threshold_is_inclusive() {
        let f = frame(vec![det("peace", 0.6)], Instant::now());
        assert_eq!(best_detection(&f, 0.6).unwrap().label, "peace");
    }

    #[test]
    fn test_jump_respects_cooldown() {
        let start = Instant::now();
        let mut controls = dino();

        controls.observe(&frame(vec![det("peace", 0.9)], start), start);
        assert!(controls.take(start).jump);

        let soon = start + Duration::from_millis(200);
        controls.observe(&frame(vec![det("peace", 0.9)], soon), soon);
        assert!(!controls.take(soon).jump);

        let later = start + Duration::from_millis(500);
        controls.observe(&frame(vec![det("Peace", 0.9)], later), later);
        assert!(controls.take(later).jump);
        assert_eq!(controls.last_gesture(), Some("peace"));
    }

    #[test]
    fn test_duck_is_cleared_by_other_gestures() {
        let now = Instant::now();
        let mut controls = dino();

        controls.observe(&frame(vec![det("good", 0.8)], now), now);
        controls.observe(&frame(vec![det("fist", 0.8)], now), now);
        assert!(!controls.take(now).duck);

        controls.observe(&frame(vec![det("good", 0.8)], now), now);
        assert_eq!(controls.last_gesture(), Some("good"));
        assert!(controls.take(now).duck);
        // take() 之後旗標歸零
        assert_eq!(controls.take(now), DinoCommand::default());
    }

    #[test]
    fn test_low_confidence_gesture_is_ignored() {
        let now = Instant::now();
        let mut controls = dino();
        controls.observe(&frame(vec![det("peace", 0.3)], now), now);
        assert_eq!(controls.take(now), DinoCommand::default());
        assert!(controls.last_gesture().is_none());
    }

    #[test]
    fn test_pong_moves_paddles_by_box_center() {
        let now = Instant::now();
        let model = ModelInfo::with_input_size(320, 320);
        let mut controls =
            PongControls::new("five", "peace", 0.0, 10, &model, Duration::from_millis(250));

        controls.observe(
            &frame(vec![boxed("five", 0.9, 10.0), boxed("peace", 0.9, 250.0)], now),
            now,
        );
        assert_eq!(
            controls.take(now),
            PongCommand {
                left_move: -10,
                right_move: 10
            }
        );
    }

    #[test]
    fn test_pong_center_on_midline_moves_down() {
        let now = Instant::now();
        let model = ModelInfo::with_input_size(320, 320);
        let mut controls =
            PongControls::new("five", "peace", 0.0, 10, &model, Duration::from_millis(250));
        // center_y = 150 + 10 = 160 = 320 / 2
        controls.observe(&frame(vec![boxed("five", 0.5, 150.0)], now), now);
        assert_eq!(controls.take(now).left_move, 10);
    }

    #[test]
    fn test_pong_ignores_stale_frames() {
        let now = Instant::now();
        let model = ModelInfo::with_input_size(320, 320);
        let mut controls =
            PongControls::new("five", "peace", 0.0, 10, &model, Duration::from_millis(250));
        controls.observe(&frame(vec![boxed("peace", 0.9, 0.0)], now), now);

        let later = now + Duration::from_millis(300);
        assert_eq!(controls.take(later), PongCommand::default());
    }

    #[test]
    fn test_pong_skips_boxless_and_unknown_labels() {
        let now = Instant::now();
        let model = ModelInfo::default();
        let mut controls =
            PongControls::new("five", "peace", 0.0, 10, &model, Duration::from_millis(250));
        controls.observe(
            &frame(vec![det("five", 0.9), boxed("fist", 0.9, 0.0)], now),
            now,
        );
        assert_eq!(controls.take(now), PongCommand::default());
        assert!(controls.last_gesture().is_none());
    }
}
