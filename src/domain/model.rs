use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

/// 模型輸入尺寸缺失時的預設值
pub const DEFAULT_INPUT_SIZE: u32 = 320;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
    pub bbox: Option<BoundingBox>,
}

#[derive(Debug, Clone)]
pub struct GestureFrame {
    pub detections: Vec<Detection>,
    pub timing_ms: Option<f32>,
    pub captured_at: Instant,
}

impl GestureFrame {
    pub fn from_result(result: InferenceResult, timing_ms: Option<f32>, captured_at: Instant) -> Self {
        Self {
            detections: result.into_detections(),
            timing_ms,
            captured_at,
        }
    }
}

/// Runner 回傳的 `result` 物件，物件偵測與分類模型共用
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InferenceResult {
    #[serde(default)]
    pub bounding_boxes: Option<Vec<RawBox>>,
    #[serde(default)]
    pub classification: Option<HashMap<String, f32>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawBox {
    pub label: Option<String>,
    pub class: Option<String>,
    pub value: Option<f32>,
    pub score: Option<f32>,
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub width: Option<f32>,
    pub height: Option<f32>,
}

impl RawBox {
    /// 舊版 runner 用 `class`/`score`，新版用 `label`/`value`
    pub fn into_detection(self) -> Option<Detection> {
        let label = self
            .label
            .filter(|l| !l.is_empty())
            .or(self.class)
            .filter(|l| !l.is_empty())?;
        let confidence = self
            .value
            .filter(|v| *v != 0.0)
            .or(self.score)
            .unwrap_or(0.0);
        let bbox = match (self.x, self.y, self.width, self.height) {
            (Some(x), Some(y), Some(width), Some(height)) => Some(BoundingBox {
                x,
                y,
                width,
                height,
            }),
            _ => None,
        };
        Some(Detection {
            label,
            confidence,
            bbox,
        })
    }
}

impl InferenceResult {
    pub fn into_detections(self) -> Vec<Detection> {
        let mut detections: Vec<Detection> = self
            .bounding_boxes
            .unwrap_or_default()
            .into_iter()
            .filter_map(RawBox::into_detection)
            .collect();

        if let Some(classification) = self.classification {
            let mut classes: Vec<Detection> = classification
                .into_iter()
                .map(|(label, confidence)| Detection {
                    label,
                    confidence,
                    bbox: None,
                })
                .collect();
            // HashMap 無序，排一下讓結果穩定
            classes.sort_by(|a, b| a.label.cmp(&b.label));
            detections.extend(classes);
        }

        detections
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelInfo {
    #[serde(default)]
    pub project: ProjectInfo,
    #[serde(default)]
    pub model_parameters: ModelParameters,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub owner: String,
    pub id: Option<u64>,
    pub deploy_version: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelParameters {
    pub input_width: Option<u32>,
    pub input_height: Option<u32>,
    pub image_channel_count: Option<u32>,
    #[serde(default)]
    pub labels: Vec<String>,
    pub model_type: Option<String>,
}

impl ModelInfo {
    pub fn input_size(&self) -> (u32, u32) {
        match (
            self.model_parameters.input_width,
            self.model_parameters.input_height,
        ) {
            (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
            _ => (DEFAULT_INPUT_SIZE, DEFAULT_INPUT_SIZE),
        }
    }

    pub fn channels(&self) -> u32 {
        match self.model_parameters.image_channel_count {
            Some(1) => 1,
            _ => 3,
        }
    }

    /// 只知道輸入尺寸時使用（例如 replay）
    pub fn with_input_size(width: u32, height: u32) -> Self {
        Self {
            model_parameters: ModelParameters {
                input_width: Some(width),
                input_height: Some(height),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum GameKind {
    Dino,
    Pong,
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameKind::Dino => write!(f, "dino"),
            GameKind::Pong => write!(f, "pong"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Running,
    GameOver,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameOutcome {
    pub game: GameKind,
    pub score: u32,
    pub detail: String,
    pub game_over: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_box_prefers_label_and_value() {
        let raw: RawBox = serde_json::from_value(serde_json::json!({
            "label": "peace", "class": "five", "value": 0.8, "score": 0.1,
            "x": 10, "y": 20, "width": 30, "height": 40
        }))
        .unwrap();
        let d = raw.into_detection().unwrap();
        assert_eq!(d.label, "peace");
        assert!((d.confidence - 0.8).abs() < f32::EPSILON);
        assert_eq!(d.bbox.unwrap().center_y(), 40.0);
    }

    #[test]
    fn test_raw_box_falls_back_to_class_and_score() {
        let raw: RawBox = serde_json::from_value(serde_json::json!({
            "label": "", "class": "good", "score": 0.7
        }))
        .unwrap();
        let d = raw.into_detection().unwrap();
        assert_eq!(d.label, "good");
        assert!((d.confidence - 0.7).abs() < f32::EPSILON);
        assert!(d.bbox.is_none());
    }

    #[test]
    fn test_raw_box_without_label_is_dropped() {
        let raw: RawBox = serde_json::from_value(serde_json::json!({ "value": 0.9 })).unwrap();
        assert!(raw.into_detection().is_none());
    }

    #[test]
    fn test_classification_result_becomes_boxless_detections() {
        let result: InferenceResult = serde_json::from_value(serde_json::json!({
            "classification": { "peace": 0.9, "fist": 0.1 }
        }))
        .unwrap();
        let detections = result.into_detections();
        assert_eq!(detections.len(), 2);
        assert_eq!(detections[0].label, "fist");
        assert!(detections.iter().all(|d| d.bbox.is_none()));
    }

    #[test]
    fn test_model_info_input_size_fallback() {
        assert_eq!(ModelInfo::default().input_size(), (320, 320));
        assert_eq!(ModelInfo::with_input_size(96, 96).input_size(), (96, 96));
        assert_eq!(ModelInfo::default().channels(), 3);
    }
}
