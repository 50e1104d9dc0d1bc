use clap::Parser;
use gesture_arcade::app;
use gesture_arcade::config::toml_config::{ArcadeConfig, DisplayBackend};
use gesture_arcade::core::scoreboard::ScoreLog;
use gesture_arcade::domain::model::{GameKind, DEFAULT_INPUT_SIZE};
use gesture_arcade::utils::{logger, validation::Validate};

#[derive(Parser)]
#[command(name = "toml-arcade")]
#[command(about = "Gesture arcade driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "arcade.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override the game from config
    #[arg(long, value_enum)]
    game: Option<GameKind>,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Dry run - show what would be started without touching camera or screen
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // 載入 TOML 配置
    let mut config = match ArcadeConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    if config.json_logs() {
        logger::init_kiosk_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }
    tracing::info!("🚀 Starting TOML-based gesture arcade");
    tracing::info!("📁 Configuration loaded from: {}", args.config);

    // 應用命令列覆蓋設定
    if let Some(game) = args.game {
        config.game.kind = game;
        tracing::info!("🔧 Game overridden to: {}", game);
    }
    if let Some(monitor) = args.monitor {
        let monitoring = config
            .monitoring
            .get_or_insert(gesture_arcade::config::toml_config::MonitoringConfig {
                enabled: monitor,
                interval_secs: None,
                json_logs: None,
            });
        monitoring.enabled = monitor;
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");

    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - camera, model and screen are not started");
        perform_dry_run(&config);
        return Ok(());
    }

    match app::run_arcade(&config).await {
        Ok(outcome) => {
            tracing::info!("✅ Game finished");
            println!("Game Over! Final Score: {}", outcome.score);
        }
        Err(e) => {
            tracing::error!(
                "❌ Game failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            let exit_code = e.exit_code();
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &ArcadeConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!("  Game: {}", config.game.kind);
    match &config.replay {
        Some(replay) => println!("  Input: replay {}", replay.path),
        None => {
            println!("  Model: {}", config.model.path);
            println!("  Camera: {}", config.camera.device_path());
        }
    }
    match config.display.backend {
        DisplayBackend::Framebuffer => println!("  Display: framebuffer {}", config.display.device),
        DisplayBackend::Headless => println!("  Display: headless"),
    }
    if let Some(seed) = config.game.seed {
        println!("  Seed: {}", seed);
    }
    if let Some(max_frames) = config.game.max_frames {
        println!("  Max Frames: {}", max_frames);
    }
    println!("  Monitoring: {}", config.monitoring_enabled());

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn perform_dry_run(config: &ArcadeConfig) {
    println!("🔍 Dry Run Analysis:");
    println!();

    println!("🎮 Game Settings:");
    match config.game.kind {
        GameKind::Dino => {
            let dino = &config.dino;
            println!("  Window: {}x{} @ {} FPS", dino.width, dino.height, dino.fps);
            println!("  Lives: {}", dino.max_lives);
            println!(
                "  Gestures: jump = '{}', duck = '{}' (confidence >= {})",
                dino.jump_gesture, dino.duck_gesture, dino.confidence_threshold
            );
            println!("  Jump cooldown: {}ms", dino.jump_cooldown_ms);
        }
        GameKind::Pong => {
            let pong = &config.pong;
            println!("  Window: {}x{} @ {} FPS", pong.width, pong.height, pong.fps);
            println!(
                "  Gestures: left paddle = '{}', right paddle = '{}'",
                pong.left_gesture, pong.right_gesture
            );
            match pong.max_score {
                Some(max) => println!("  Match ends at {} points", max),
                None => println!("  Endless match"),
            }
        }
    }

    if config.replay.is_none() {
        println!();
        println!("📷 Camera:");
        let (w, h) = (DEFAULT_INPUT_SIZE, DEFAULT_INPUT_SIZE);
        println!(
            "  ffmpeg {}",
            config.camera.ffmpeg_args(w, h).join(" ")
        );
        println!("  (frame size follows the model input size, {}x{} shown)", w, h);
    }

    if let Some(path) = config.score_log_path() {
        println!();
        println!("🏆 Score Log: {}", path);
        match ScoreLog::new(path).best_score(config.game.kind) {
            Ok(Some(best)) => println!("  Best {}: {}", config.game.kind, best),
            Ok(None) => println!("  No {} scores yet", config.game.kind),
            Err(e) => println!("  ⚠️ Unreadable: {}", e),
        }
    }

    println!();
    println!("✅ Dry run analysis complete. Use --verbose for more details during actual run.");
}
