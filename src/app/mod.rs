use crate::adapters::{EdgeImpulseSource, FramebufferDisplay, HeadlessDisplay, ReplaySource};
use crate::config::toml_config::{ArcadeConfig, DisplayBackend};
use crate::core::dino::DinoGame;
use crate::core::engine::{ArcadeEngine, EngineOptions};
use crate::core::pong::PongGame;
use crate::core::scoreboard::ScoreLog;
use crate::domain::model::{GameKind, GameOutcome, ModelInfo};
use crate::domain::ports::{Display, Game, GestureSource};
use crate::render::HudFont;
use crate::utils::error::Result;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 依設定選擇手勢來源：有 replay 就不啟動相機與模型
pub async fn open_source(config: &ArcadeConfig) -> Result<Box<dyn GestureSource>> {
    match &config.replay {
        Some(replay) => {
            let info = match (replay.input_width, replay.input_height) {
                (Some(w), Some(h)) => ModelInfo::with_input_size(w, h),
                _ => ModelInfo::default(),
            };
            let source = ReplaySource::open(&replay.path, info).await?;
            Ok(Box::new(source))
        }
        None => {
            tracing::info!("🤖 Starting model {}", config.model.path);
            let source = EdgeImpulseSource::start(
                Path::new(&config.model.path),
                &config.camera,
                config.startup_timeout(),
            )
            .await?;
            let info = source.model_info();
            tracing::info!(
                "✅ Model ready: {} ({}x{}, labels: {})",
                info.project.name,
                info.input_size().0,
                info.input_size().1,
                info.model_parameters.labels.join(", ")
            );
            Ok(Box::new(source))
        }
    }
}

pub fn open_display(config: &ArcadeConfig, game_size: (u32, u32)) -> Result<Box<dyn Display>> {
    match config.display.backend {
        DisplayBackend::Headless => {
            tracing::info!("🙈 Headless mode, frames are not shown");
            Ok(Box::new(HeadlessDisplay::new(game_size.0, game_size.1)))
        }
        DisplayBackend::Framebuffer => Ok(Box::new(FramebufferDisplay::open(&config.display.device)?)),
    }
}

pub fn engine_options(config: &ArcadeConfig, best_score: Option<u32>) -> EngineOptions {
    EngineOptions {
        max_frames: config.game.max_frames,
        game_over_hold: Duration::from_millis(config.game.game_over_hold_ms),
        stats_interval: config.monitoring_interval(),
        best_score,
        snapshot_path: config.display.snapshot_path.as_ref().map(PathBuf::from),
        ..EngineOptions::default()
    }
}

/// 跑一局：開啟來源與顯示、執行引擎、寫入分數紀錄
pub async fn run_arcade(config: &ArcadeConfig) -> Result<GameOutcome> {
    let kind = config.game.kind;
    let score_log = config.score_log_path().map(ScoreLog::new);
    let best_score = match &score_log {
        Some(log) => log.best_score(kind).unwrap_or_else(|e| {
            tracing::warn!("⚠️ Cannot read score log {}: {}", log.path().display(), e);
            None
        }),
        None => None,
    };

    let seed = config.seed();
    tracing::info!("🎲 Seed: {}", seed);
    let font = HudFont::discover(config.display.font_path.as_deref());
    let options = engine_options(config, best_score);

    let outcome = match kind {
        GameKind::Dino => play(DinoGame::new(config.dino.clone(), seed), config, font, options).await?,
        GameKind::Pong => play(PongGame::new(config.pong.clone(), seed), config, font, options).await?,
    };

    if let Some(log) = &score_log {
        match log.append(&outcome) {
            Ok(_) => tracing::info!("📝 Score saved to {}", log.path().display()),
            Err(e) => tracing::warn!("⚠️ Failed to save score: {}", e),
        }
    }
    Ok(outcome)
}

async fn play<G: Game>(
    game: G,
    config: &ArcadeConfig,
    font: Option<HudFont>,
    options: EngineOptions,
) -> Result<GameOutcome> {
    // 顯示先開，失敗時不用啟動模型
    let display = open_display(config, game.size())?;
    let source = open_source(config).await?;

    ArcadeEngine::new_with_monitoring(game, source, display, config.monitoring_enabled())
        .with_font(font)
        .with_options(options)
        .run()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_options_from_config() {
        let config = ArcadeConfig::from_toml_str(
            r#"
[game]
max_frames = 120
game_over_hold_ms = 0

[display]
snapshot_path = "last.png"
"#,
        )
        .unwrap();
        let options = engine_options(&config, Some(30));
        assert_eq!(options.max_frames, Some(120));
        assert_eq!(options.game_over_hold, Duration::ZERO);
        assert_eq!(options.best_score, Some(30));
        assert_eq!(options.snapshot_path, Some(PathBuf::from("last.png")));
        assert!(options.handle_ctrl_c);
    }

    #[test]
    fn test_headless_display_uses_game_size() {
        let config = ArcadeConfig::from_toml_str("[display]\nbackend = \"headless\"").unwrap();
        let display = open_display(&config, (800, 300)).unwrap();
        assert_eq!(display.size(), (800, 300));
    }

    #[tokio::test]
    async fn test_replay_source_uses_configured_input_size() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut config = ArcadeConfig::default();
        config.replay = Some(crate::config::toml_config::ReplayConfig {
            path: file.path().to_string_lossy().to_string(),
            input_width: Some(96),
            input_height: Some(96),
        });
        let mut source = open_source(&config).await.unwrap();
        assert_eq!(source.model_info().input_size(), (96, 96));
        assert!(source.next_frame().await.unwrap().is_none());
    }
}
