use crate::adapters::camera::CameraConfig;
use crate::core::dino::DinoConfig;
use crate::core::pong::PongConfig;
use crate::domain::model::GameKind;
use crate::utils::error::{ArcadeError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_MODEL_PATH: &str = "./gestures.eim";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArcadeConfig {
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    pub replay: Option<ReplayConfig>,
    #[serde(default)]
    pub dino: DinoConfig,
    #[serde(default)]
    pub pong: PongConfig,
    pub monitoring: Option<MonitoringConfig>,
    pub scores: Option<ScoresConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub kind: GameKind,
    /// 固定亂數種子，障礙物/發球順序可重現
    pub seed: Option<u64>,
    pub max_frames: Option<u64>,
    pub game_over_hold_ms: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            kind: GameKind::Dino,
            seed: None,
            max_frames: None,
            game_over_hold_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub path: String,
    pub startup_timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_MODEL_PATH.to_string(),
            startup_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayBackend {
    Framebuffer,
    Headless,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub backend: DisplayBackend,
    pub device: String,
    pub font_path: Option<String>,
    pub snapshot_path: Option<String>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            backend: DisplayBackend::Framebuffer,
            device: "/dev/fb0".to_string(),
            font_path: None,
            snapshot_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayConfig {
    pub path: String,
    pub input_width: Option<u32>,
    pub input_height: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub interval_secs: Option<u64>,
    pub json_logs: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoresConfig {
    pub path: String,
}

impl ArcadeConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ArcadeError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ArcadeError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${HOME})，未定義的保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ArcadeError::ConfigError {
            message: format!("env substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        // replay 模式不需要模型與相機
        if self.replay.is_none() {
            validation::validate_model_file("model.path", &self.model.path)?;
            validation::validate_non_empty_string("camera.ffmpeg", &self.camera.ffmpeg)?;
            validation::validate_positive_number(
                "model.startup_timeout_secs",
                self.model.startup_timeout_secs as usize,
                1,
            )?;
        } else if let Some(replay) = &self.replay {
            validation::validate_path("replay.path", &replay.path)?;
        }

        if self.display.backend == DisplayBackend::Framebuffer {
            validation::validate_path("display.device", &self.display.device)?;
        }

        self.validate_dino()?;
        self.validate_pong()?;
        Ok(())
    }

    fn validate_dino(&self) -> Result<()> {
        let dino = &self.dino;
        validation::validate_positive_number("dino.fps", dino.fps as usize, 1)?;
        validation::validate_positive_number("dino.max_lives", dino.max_lives as usize, 1)?;
        validation::validate_range("dino.confidence_threshold", dino.confidence_threshold, 0.0, 1.0)?;
        validation::validate_range("dino.bird_chance", dino.bird_chance, 0.0, 1.0)?;
        validation::validate_distinct_labels(
            "dino.gestures",
            &[dino.jump_gesture.as_str(), dino.duck_gesture.as_str()],
        )?;
        if dino.ground_offset >= dino.height {
            return Err(ArcadeError::InvalidConfigValueError {
                field: "dino.ground_offset".to_string(),
                value: dino.ground_offset.to_string(),
                reason: format!("Must be smaller than dino.height ({})", dino.height),
            });
        }
        Ok(())
    }

    fn validate_pong(&self) -> Result<()> {
        let pong = &self.pong;
        validation::validate_positive_number("pong.fps", pong.fps as usize, 1)?;
        validation::validate_range("pong.confidence_threshold", pong.confidence_threshold, 0.0, 1.0)?;
        validation::validate_distinct_labels(
            "pong.gestures",
            &[pong.left_gesture.as_str(), pong.right_gesture.as_str()],
        )?;
        if pong.paddle_height >= pong.height || 2 * (pong.paddle_margin + pong.paddle_width) >= pong.width {
            return Err(ArcadeError::ConfigValidationError {
                field: "pong".to_string(),
                message: "Paddles do not fit in the window".to_string(),
            });
        }
        if let Some(max) = pong.max_score {
            validation::validate_positive_number("pong.max_score", max as usize, 1)?;
        }
        Ok(())
    }

    pub fn seed(&self) -> u64 {
        self.game
            .seed
            .unwrap_or_else(rand::random)
    }

    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.model.startup_timeout_secs)
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn monitoring_interval(&self) -> Duration {
        let secs = self
            .monitoring
            .as_ref()
            .and_then(|m| m.interval_secs)
            .unwrap_or(5);
        Duration::from_secs(secs.max(1))
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.json_logs)
            .unwrap_or(false)
    }

    pub fn score_log_path(&self) -> Option<&str> {
        self.scores.as_ref().map(|s| s.path.as_str())
    }
}

impl Validate for ArcadeConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ArcadeConfig::from_toml_str("").unwrap();
        assert_eq!(config.game.kind, GameKind::Dino);
        assert_eq!(config.model.path, DEFAULT_MODEL_PATH);
        assert_eq!(config.camera.device_path(), "/dev/video0");
        assert_eq!(config.display.backend, DisplayBackend::Framebuffer);
        assert_eq!(config.dino.fps, 60);
        assert_eq!(config.dino.jump_gesture, "peace");
        assert_eq!(config.pong.fps, 30);
        assert_eq!(config.pong.left_gesture, "five");
        assert!(!config.monitoring_enabled());
        assert!(config.score_log_path().is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[game]
kind = "pong"
seed = 42
game_over_hold_ms = 0

[model]
path = "/home/pi/gestures.eim"

[camera]
index = 1
input_format = "mjpeg"

[display]
backend = "headless"
font_path = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"

[dino]
confidence_threshold = 0.75
duck_gesture = "fist"

[pong]
max_score = 5

[monitoring]
enabled = true
interval_secs = 10

[scores]
path = "./scores.csv"
"#;

        let config = ArcadeConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.game.kind, GameKind::Pong);
        assert_eq!(config.seed(), 42);
        assert_eq!(config.camera.device_path(), "/dev/video1");
        assert_eq!(config.display.backend, DisplayBackend::Headless);
        assert_eq!(config.dino.duck_gesture, "fist");
        // 未指定的欄位保持預設
        assert_eq!(config.dino.jump_gesture, "peace");
        assert_eq!(config.pong.max_score, Some(5));
        assert!(config.monitoring_enabled());
        assert_eq!(config.monitoring_interval(), Duration::from_secs(10));
        assert_eq!(config.score_log_path(), Some("./scores.csv"));
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("GESTURE_ARCADE_TEST_MODEL", "/opt/models/hands.eim");

        let toml_content = r#"
[model]
path = "${GESTURE_ARCADE_TEST_MODEL}"

[display]
device = "${GESTURE_ARCADE_UNSET_VAR}"
"#;

        let config = ArcadeConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.model.path, "/opt/models/hands.eim");
        assert_eq!(config.display.device, "${GESTURE_ARCADE_UNSET_VAR}");

        std::env::remove_var("GESTURE_ARCADE_TEST_MODEL");
    }

    #[test]
    fn test_missing_model_fails_validation() {
        let config = ArcadeConfig::from_toml_str(
            r#"
[model]
path = "/definitely/missing.eim"
"#,
        )
        .unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ArcadeError::ModelNotFound { .. }));
    }

    #[test]
    fn test_replay_mode_skips_model_check() {
        let config = ArcadeConfig::from_toml_str(
            r#"
[model]
path = "/definitely/missing.eim"

[replay]
path = "./session.jsonl"

[display]
backend = "headless"
"#,
        )
        .unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_game_settings_fail_validation() {
        let base = r#"
[replay]
path = "./session.jsonl"
"#;
        let cases = [
            "[dino]\nconfidence_threshold = 1.5",
            "[dino]\njump_gesture = \"good\"",
            "[dino]\nfps = 0",
            "[pong]\npaddle_height = 500",
            "[pong]\nleft_gesture = \"peace\"",
        ];
        for case in cases {
            let config = ArcadeConfig::from_toml_str(&format!("{}\n{}", base, case)).unwrap();
            assert!(config.validate().is_err(), "expected failure for: {}", case);
        }
    }

    #[test]
    fn test_unknown_game_kind_is_parse_error() {
        let err = ArcadeConfig::from_toml_str("[game]\nkind = \"tetris\"").unwrap_err();
        assert!(matches!(err, ArcadeError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[game]\nkind = \"dino\"\nseed = 7\n")
            .unwrap();

        let config = ArcadeConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.seed(), 7);
    }
}
