use crate::config::toml_config::{ArcadeConfig, DisplayBackend, MonitoringConfig, ReplayConfig, ScoresConfig};
use crate::domain::model::GameKind;
use crate::utils::error::Result;
use clap::Parser;

/// 命令列參數，會覆蓋 `--config` 載入的 TOML 設定
#[derive(Debug, Clone, Parser)]
#[command(name = "gesture-arcade")]
#[command(about = "Play Dino or Pong with hand gestures detected by an Edge Impulse model")]
pub struct CliConfig {
    /// Game to play (defaults to the config file, then dino)
    #[arg(value_enum)]
    pub game: Option<GameKind>,

    /// Path to the Edge Impulse .eim model
    pub model: Option<String>,

    /// Camera index (/dev/videoN)
    pub camera: Option<u32>,

    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Render without a screen
    #[arg(long, conflicts_with = "framebuffer")]
    pub headless: bool,

    /// Framebuffer device, e.g. /dev/fb1
    #[arg(long)]
    pub framebuffer: Option<String>,

    /// TTF/OTF font for the HUD
    #[arg(long)]
    pub font: Option<String>,

    /// Replay recorded model output (JSON lines) instead of camera + model
    #[arg(long)]
    pub replay: Option<String>,

    #[arg(long)]
    pub seed: Option<u64>,

    /// CSV file to append final scores to
    #[arg(long)]
    pub score_log: Option<String>,

    /// Stop after rendering this many frames
    #[arg(long)]
    pub max_frames: Option<u64>,

    /// Save the last rendered frame as PNG
    #[arg(long)]
    pub snapshot: Option<String>,

    #[arg(long, help = "Enable system monitoring")]
    pub monitor: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    /// 載入設定檔（若有）並套用命令列覆蓋
    pub fn into_arcade_config(self) -> Result<ArcadeConfig> {
        let mut config = match &self.config {
            Some(path) => ArcadeConfig::from_file(path)?,
            None => ArcadeConfig::default(),
        };
        self.apply_to(&mut config);
        Ok(config)
    }

    pub fn apply_to(&self, config: &mut ArcadeConfig) {
        if let Some(game) = self.game {
            config.game.kind = game;
        }
        if let Some(model) = &self.model {
            config.model.path = model.clone();
        }
        if let Some(index) = self.camera {
            config.camera.index = index;
            config.camera.device = None;
        }
        if self.headless {
            config.display.backend = DisplayBackend::Headless;
        }
        if let Some(device) = &self.framebuffer {
            config.display.backend = DisplayBackend::Framebuffer;
            config.display.device = device.clone();
        }
        if let Some(font) = &self.font {
            config.display.font_path = Some(font.clone());
        }
        if let Some(snapshot) = &self.snapshot {
            config.display.snapshot_path = Some(snapshot.clone());
        }
        if let Some(path) = &self.replay {
            config.replay = Some(ReplayConfig {
                path: path.clone(),
                input_width: None,
                input_height: None,
            });
        }
        if let Some(seed) = self.seed {
            config.game.seed = Some(seed);
        }
        if let Some(max_frames) = self.max_frames {
            config.game.max_frames = Some(max_frames);
        }
        if let Some(path) = &self.score_log {
            config.scores = Some(ScoresConfig { path: path.clone() });
        }
        if self.monitor {
            let monitoring = config.monitoring.get_or_insert(MonitoringConfig {
                enabled: true,
                interval_secs: None,
                json_logs: None,
            });
            monitoring.enabled = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_arguments() {
        let cli = CliConfig::try_parse_from(["gesture-arcade", "pong", "./hands.eim", "2"]).unwrap();
        let config = cli.into_arcade_config().unwrap();
        assert_eq!(config.game.kind, GameKind::Pong);
        assert_eq!(config.model.path, "./hands.eim");
        assert_eq!(config.camera.device_path(), "/dev/video2");
    }

    #[test]
    fn test_defaults_without_arguments() {
        let cli = CliConfig::try_parse_from(["gesture-arcade"]).unwrap();
        let config = cli.into_arcade_config().unwrap();
        assert_eq!(config.game.kind, GameKind::Dino);
        assert_eq!(config.display.backend, DisplayBackend::Framebuffer);
        assert!(config.replay.is_none());
    }

    #[test]
    fn test_invalid_camera_index_is_rejected() {
        assert!(CliConfig::try_parse_from(["gesture-arcade", "dino", "m.eim", "front"]).is_err());
        assert!(CliConfig::try_parse_from(["gesture-arcade", "snake"]).is_err());
    }

    #[test]
    fn test_flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(
            &mut file,
            b"[game]\nkind = \"pong\"\nseed = 1\n\n[display]\ndevice = \"/dev/fb1\"\n",
        )
        .unwrap();
        let path = file.path().to_string_lossy().to_string();

        let cli = CliConfig::try_parse_from([
            "gesture-arcade",
            "--config",
            path.as_str(),
            "--headless",
            "--seed",
            "9",
            "--replay",
            "session.jsonl",
            "--score-log",
            "scores.csv",
            "--monitor",
        ])
        .unwrap();
        let config = cli.into_arcade_config().unwrap();

        // 沒給 game 參數時沿用設定檔
        assert_eq!(config.game.kind, GameKind::Pong);
        assert_eq!(config.game.seed, Some(9));
        assert_eq!(config.display.backend, DisplayBackend::Headless);
        assert_eq!(config.replay.unwrap().path, "session.jsonl");
        assert_eq!(config.scores.unwrap().path, "scores.csv");
        assert!(config.monitoring.unwrap().enabled);
    }

    #[test]
    fn test_headless_conflicts_with_framebuffer() {
        let result = CliConfig::try_parse_from(["gesture-arcade", "--headless", "--framebuffer", "/dev/fb0"]);
        assert!(result.is_err());
    }
}
