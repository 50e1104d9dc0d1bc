use crate::domain::model::{GameOutcome, GameStatus};
use crate::domain::ports::{Controls, Display, Game, GestureSource, Hud};
use crate::render::{Canvas, HudFont};
use crate::utils::error::Result;
use crate::utils::monitor::{FrameCounter, SystemMonitor};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// 畫完幾幀後停止，測試與 demo 錄影用
    pub max_frames: Option<u64>,
    pub game_over_hold: Duration,
    pub shutdown_grace: Duration,
    pub stats_interval: Duration,
    pub handle_ctrl_c: bool,
    pub best_score: Option<u32>,
    /// 結束時把最後一幀存成 PNG
    pub snapshot_path: Option<PathBuf>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_frames: None,
            game_over_hold: Duration::from_secs(2),
            shutdown_grace: Duration::from_secs(1),
            stats_interval: Duration::from_secs(5),
            handle_ctrl_c: true,
            best_score: None,
            snapshot_path: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    GameOver,
    SourceEnded,
    Interrupted,
    FrameLimit,
    DisplayFailed,
}

pub struct ArcadeEngine<G: Game, S: GestureSource, D: Display> {
    game: G,
    source: S,
    display: D,
    font: Option<HudFont>,
    options: EngineOptions,
    monitor: SystemMonitor,
}

impl<G, S, D> ArcadeEngine<G, S, D>
where
    G: Game,
    S: GestureSource + 'static,
    D: Display,
{
    pub fn new(game: G, source: S, display: D) -> Self {
        Self::new_with_monitoring(game, source, display, false)
    }

    pub fn new_with_monitoring(game: G, source: S, display: D, monitor_enabled: bool) -> Self {
        Self {
            game,
            source,
            display,
            font: None,
            options: EngineOptions::default(),
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn with_font(mut self, font: Option<HudFont>) -> Self {
        self.font = font;
        self
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub async fn run(self) -> Result<GameOutcome> {
        let Self {
            mut game,
            source,
            mut display,
            font,
            options,
            monitor,
        } = self;

        let (width, height) = game.size();
        let fps = game.fps().max(1);
        let (screen_w, screen_h) = display.size();
        tracing::info!(
            "🎮 Starting {} ({}x{} @ {} FPS, display {}x{})",
            game.title(),
            width,
            height,
            fps,
            screen_w,
            screen_h
        );
        if monitor.is_enabled() {
            monitor.log_stats("Startup");
        }

        let controls = Arc::new(Mutex::new(game.controls(source.model_info())));
        let inferences = Arc::new(AtomicU64::new(0));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut gesture_task = tokio::spawn(gesture_loop(
            source,
            Arc::clone(&controls),
            Arc::clone(&inferences),
            shutdown_rx,
        ));

        let mut canvas = Canvas::new(width, height);
        let mut hud = Hud {
            font: font.as_ref(),
            last_gesture: None,
            best_score: options.best_score,
        };

        let mut ticker = tokio::time::interval(Duration::from_secs_f64(1.0 / fps as f64));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let handle_ctrl_c = options.handle_ctrl_c;
        let ctrl_c = async move {
            if handle_ctrl_c {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::warn!("⚠️ Cannot listen for Ctrl-C: {}", e);
                    std::future::pending::<()>().await;
                }
            } else {
                std::future::pending::<()>().await;
            }
        };
        tokio::pin!(ctrl_c);

        let mut counter = FrameCounter::new(Instant::now());
        let mut seen_inferences = 0u64;
        let mut failure = None;

        let reason = loop {
            tokio::select! {
                _ = &mut ctrl_c => break StopReason::Interrupted,
                _ = ticker.tick() => {}
            }

            if gesture_task.is_finished() {
                tracing::warn!("⚠️ Gesture input stopped, ending game");
                break StopReason::SourceEnded;
            }

            let now = Instant::now();
            let command = {
                let mut guard = controls.lock().unwrap_or_else(|p| p.into_inner());
                hud.last_gesture = guard.last_gesture().map(str::to_string);
                guard.take(now)
            };

            let status = game.step(command, now);
            game.draw(&mut canvas, &hud);
            if let Err(e) = display.present(&canvas) {
                tracing::error!("❌ Display failed: {}", e);
                failure = Some(e);
                break StopReason::DisplayFailed;
            }

            counter.record_frame();
            let total_inferences = inferences.load(Ordering::Relaxed);
            counter.record_inferences(total_inferences - seen_inferences);
            seen_inferences = total_inferences;
            if let Some((fps, ips)) = counter.roll(now, options.stats_interval) {
                tracing::debug!("🎞️ {:.1} FPS, {:.1} inferences/s", fps, ips);
                monitor.log_stats("Playing");
            }

            if status == GameStatus::GameOver {
                break StopReason::GameOver;
            }
            if options
                .max_frames
                .is_some_and(|max| counter.total_frames() >= max)
            {
                break StopReason::FrameLimit;
            }
        };
        tracing::info!("🛑 Game loop stopped: {:?}", reason);

        // 手勢輸入中斷時也顯示 game over，玩家才知道遊戲已結束
        let show_game_over = matches!(reason, StopReason::GameOver | StopReason::SourceEnded);
        if failure.is_none() && show_game_over {
            game.draw_game_over(&mut canvas, &hud);
            match display.present(&canvas) {
                Ok(()) => tokio::time::sleep(options.game_over_hold).await,
                Err(e) => failure = Some(e),
            }
        }

        if let Some(path) = &options.snapshot_path {
            match canvas.save_png(path) {
                Ok(()) => tracing::info!("🖼️ Last frame saved to {}", path.display()),
                Err(e) => tracing::warn!("⚠️ Failed to save snapshot: {}", e),
            }
        }

        // 手勢 task 最多等 shutdown_grace
        let _ = shutdown_tx.send(true);
        match tokio::time::timeout(options.shutdown_grace, &mut gesture_task).await {
            Ok(Ok(mut source)) => {
                if let Err(e) = source.stop().await {
                    tracing::warn!("⚠️ Failed to stop gesture source: {}", e);
                }
            }
            Ok(Err(e)) => tracing::error!("❌ Gesture task failed: {}", e),
            Err(_) => {
                tracing::warn!("⚠️ Gesture task did not stop in time, aborting");
                gesture_task.abort();
            }
        }

        monitor.log_final_stats();

        if let Some(e) = failure {
            return Err(e);
        }
        let outcome = game.outcome();
        tracing::info!(
            "🏁 {} finished with score {} ({})",
            outcome.game,
            outcome.score,
            outcome.detail
        );
        Ok(outcome)
    }
}

async fn gesture_loop<S, C>(
    mut source: S,
    controls: Arc<Mutex<C>>,
    inferences: Arc<AtomicU64>,
    mut shutdown: watch::Receiver<bool>,
) -> S
where
    S: GestureSource,
    C: Controls,
{
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            next = source.next_frame() => match next {
                Ok(Some(frame)) => {
                    inferences.fetch_add(1, Ordering::Relaxed);
                    if let Some(timing) = frame.timing_ms {
                        tracing::trace!("Inference took {:.1}ms", timing);
                    }
                    let mut guard = controls.lock().unwrap_or_else(|p| p.into_inner());
                    guard.observe(&frame, Instant::now());
                }
                Ok(None) => {
                    tracing::info!("📭 Gesture source finished");
                    break;
                }
                Err(e) => {
                    tracing::error!("❌ Gesture source failed: {}", e);
                    tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
                    break;
                }
            }
        }
    }
    source
}
