use gesture_arcade::app;
use gesture_arcade::config::toml_config::ArcadeConfig;
use gesture_arcade::core::scoreboard::ScoreLog;
use gesture_arcade::domain::model::GameKind;
use gesture_arcade::utils::validation::Validate;
use gesture_arcade::ArcadeError;
use tempfile::TempDir;

fn write_replay(dir: &TempDir) -> String {
    let path = dir.path().join("session.jsonl");
    std::fs::write(
        &path,
        "# idle session\n{\"delay_ms\": 60000, \"result\": {\"bounding_boxes\": []}}\n",
    )
    .unwrap();
    path.to_string_lossy().to_string()
}

fn arcade_config(dir: &TempDir, game: &str) -> ArcadeConfig {
    let replay = write_replay(dir);
    let scores = dir.path().join("scores").join("scores.csv");
    let snapshot = dir.path().join("last.png");
    let toml_content = format!(
        r#"
[game]
kind = "{game}"
seed = 11
max_frames = 10
game_over_hold_ms = 0

[replay]
path = "{replay}"

[display]
backend = "headless"
snapshot_path = "{snapshot}"

[dino]
fps = 500

[pong]
fps = 500

[scores]
path = "{scores}"
"#,
        game = game,
        replay = replay,
        snapshot = snapshot.display(),
        scores = scores.display(),
    );
    ArcadeConfig::from_toml_str(&toml_content).unwrap()
}

#[tokio::test]
async fn test_run_arcade_with_replay_writes_score_and_snapshot() {
    let dir = TempDir::new().unwrap();
    let config = arcade_config(&dir, "dino");
    config.validate().unwrap();

    let outcome = app::run_arcade(&config).await.unwrap();
    assert_eq!(outcome.game, GameKind::Dino);

    let log = ScoreLog::new(config.score_log_path().unwrap());
    let records = log.records().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].game, GameKind::Dino);
    assert_eq!(records[0].score, outcome.score);

    let snapshot = image::open(dir.path().join("last.png")).unwrap();
    assert_eq!((snapshot.width(), snapshot.height()), (800, 300));
}

#[tokio::test]
async fn test_scores_accumulate_per_game() {
    let dir = TempDir::new().unwrap();

    let dino = arcade_config(&dir, "dino");
    app::run_arcade(&dino).await.unwrap();
    let pong = arcade_config(&dir, "pong");
    let outcome = app::run_arcade(&pong).await.unwrap();
    assert_eq!(outcome.game, GameKind::Pong);
    assert_eq!(outcome.detail, "0-0");

    let log = ScoreLog::new(dino.score_log_path().unwrap());
    assert_eq!(log.records().unwrap().len(), 2);
    assert_eq!(log.best_score(GameKind::Pong).unwrap(), Some(0));
}

#[tokio::test]
async fn test_missing_model_fails_before_start() {
    let config = ArcadeConfig::from_toml_str(
        r#"
[model]
path = "/nonexistent/gestures.eim"

[display]
backend = "headless"
"#,
    )
    .unwrap();

    let err = config.validate().unwrap_err();
    assert!(matches!(err, ArcadeError::ModelNotFound { .. }));

    // 跳過驗證直接啟動也一樣回報找不到模型
    let err = app::run_arcade(&config).await.unwrap_err();
    assert!(matches!(err, ArcadeError::ModelNotFound { .. }));
    assert_eq!(err.exit_code(), 1);
}
