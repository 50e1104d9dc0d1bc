use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// `RUST_LOG` 沒設定時使用的過濾規則
pub fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        // 逐幀的推論時間在 trace，debug 只有 FPS 與碰撞
        "gesture_arcade=debug,warn"
    } else {
        "gesture_arcade=info,warn"
    }
}

fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)))
}

/// 在終端機上玩：精簡單行輸出
pub fn init_cli_logger(verbose: bool) {
    let result = tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(verbose)
                .with_ansi(std::io::IsTerminal::is_terminal(&std::io::stderr()))
                .with_writer(std::io::stderr)
                .compact(),
        )
        .try_init();
    if let Err(e) = result {
        eprintln!("⚠️ Logger already initialized: {}", e);
    }
}

/// 開機自動啟動（systemd）時用：JSON 交給 journald，保留 target 以便依模組過濾
pub fn init_kiosk_logger() {
    let result = tracing_subscriber::registry()
        .with(env_filter(false))
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .flatten_event(true)
                .with_current_span(false)
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .try_init();
    if let Err(e) = result {
        eprintln!("⚠️ Logger already initialized: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_parse() {
        for verbose in [false, true] {
            let directives = default_directives(verbose);
            assert!(directives.parse::<EnvFilter>().is_ok(), "{}", directives);
        }
        assert!(default_directives(true).contains("gesture_arcade=debug"));
        assert!(default_directives(false).contains("gesture_arcade=info"));
    }
}
