use clap::Parser;
use gesture_arcade::app;
use gesture_arcade::utils::{logger, validation::Validate};
use gesture_arcade::CliConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();
    let verbose = cli.verbose;

    let config = match cli.into_arcade_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    // 初始化日誌
    if config.json_logs() {
        logger::init_kiosk_logger();
    } else {
        logger::init_cli_logger(verbose);
    }

    tracing::info!("🚀 Starting gesture-arcade ({})", config.game.kind);
    if verbose {
        tracing::debug!("Config: {:?}", config);
    }

    // 驗證配置，碰硬體之前就失敗
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if config.monitoring_enabled() {
        tracing::info!("🔍 System monitoring enabled");
    }

    match app::run_arcade(&config).await {
        Ok(outcome) => {
            println!("Game Over! Final Score: {}", outcome.score);
            if !outcome.detail.is_empty() {
                println!("📊 {}", outcome.detail);
            }
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
