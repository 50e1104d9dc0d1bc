//! Client for exported `.eim` model executables.
//!
//! The model binary is started with a unix socket path as its only argument
//! and then speaks JSON over that socket: every request carries an `id`,
//! every response is a JSON object followed by a single NUL byte.

use crate::domain::model::{InferenceResult, ModelInfo};
use crate::utils::error::{ArcadeError, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::process::{Child, Command};

const SOCKET_POLL_INTERVAL: Duration = Duration::from_millis(100);
const READ_CHUNK: usize = 4096;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Timing {
    #[serde(default)]
    pub dsp: f32,
    #[serde(default)]
    pub classification: f32,
    #[serde(default)]
    pub anomaly: f32,
}

impl Timing {
    pub fn total_ms(&self) -> f32 {
        self.dsp + self.classification + self.anomaly
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClassifyResponse {
    #[serde(default)]
    pub result: InferenceResult,
    #[serde(default)]
    pub timing: Option<Timing>,
}

pub struct EimRunner {
    child: Option<Child>,
    stream: UnixStream,
    socket_path: Option<PathBuf>,
    next_id: u64,
    info: ModelInfo,
}

impl EimRunner {
    /// 啟動模型程序、等待 socket 出現並完成 hello
    pub async fn start(model_path: &Path, startup_timeout: Duration) -> Result<Self> {
        if !model_path.is_file() {
            return Err(ArcadeError::ModelNotFound {
                path: model_path.display().to_string(),
            });
        }

        let socket_path = std::env::temp_dir().join(format!(
            "gesture-arcade-{}-{}.sock",
            std::process::id(),
            chrono::Utc::now().timestamp_millis()
        ));
        let _ = std::fs::remove_file(&socket_path);

        tracing::info!("🧠 Loading model: {}", model_path.display());
        let mut child = Command::new(model_path)
            .arg(&socket_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ArcadeError::ModelError {
                message: format!("failed to start {}: {}", model_path.display(), e),
            })?;

        let stream = match wait_for_socket(&mut child, &socket_path, startup_timeout).await {
            Ok(stream) => stream,
            Err(e) => {
                let _ = std::fs::remove_file(&socket_path);
                return Err(e);
            }
        };
        let mut runner = Self {
            child: Some(child),
            stream,
            socket_path: Some(socket_path),
            next_id: 0,
            info: ModelInfo::default(),
        };
        runner.hello().await?;
        Ok(runner)
    }

    /// 連到已經在跑的模型 socket
    pub async fn connect(socket_path: &Path) -> Result<Self> {
        let stream = UnixStream::connect(socket_path).await?;
        let mut runner = Self {
            child: None,
            stream,
            socket_path: None,
            next_id: 0,
            info: ModelInfo::default(),
        };
        runner.hello().await?;
        Ok(runner)
    }

    pub fn model_info(&self) -> &ModelInfo {
        &self.info
    }

    async fn send(&mut self, mut message: Value) -> Result<Value> {
        self.next_id += 1;
        message["id"] = json!(self.next_id);

        let bytes = serde_json::to_vec(&message)?;
        self.stream.write_all(&bytes).await?;

        let raw = read_message(&mut self.stream).await?;
        let response: Value = serde_json::from_slice(&raw)?;

        let success = response
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if !success {
            let error = response
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(ArcadeError::ModelError {
                message: error.to_string(),
            });
        }

        Ok(response)
    }

    async fn hello(&mut self) -> Result<&ModelInfo> {
        let response = self.send(json!({ "hello": 1 })).await?;
        self.info = serde_json::from_value(response)?;
        let (w, h) = self.info.input_size();
        tracing::info!(
            "✅ Loaded model: {} ({}x{}, {} labels)",
            self.info.project.name,
            w,
            h,
            self.info.model_parameters.labels.len()
        );
        if self.info.model_parameters.input_width.is_none() {
            tracing::warn!("⚠️ Model did not report an input size, using {}x{}", w, h);
        }
        Ok(&self.info)
    }

    pub async fn classify(&mut self, features: &[u32]) -> Result<ClassifyResponse> {
        let response = self.send(json!({ "classify": features })).await?;
        Ok(serde_json::from_value(response)?)
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(mut child) = self.child.take() {
            if child.try_wait()?.is_none() {
                child.kill().await?;
            }
            tracing::debug!("Model process stopped");
        }
        if let Some(path) = self.socket_path.take() {
            let _ = std::fs::remove_file(path);
        }
        Ok(())
    }
}

impl Drop for EimRunner {
    fn drop(&mut self) {
        // child 由 kill_on_drop 收掉，這裡只清 socket 檔
        if let Some(path) = self.socket_path.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

async fn wait_for_socket(child: &mut Child, socket_path: &Path, timeout: Duration) -> Result<UnixStream> {
    let started = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Err(ArcadeError::ModelError {
                message: format!("model process exited early ({})", status),
            });
        }

        if socket_path.exists() {
            match UnixStream::connect(socket_path).await {
                Ok(stream) => return Ok(stream),
                Err(e) => tracing::trace!("Socket not ready yet: {}", e),
            }
        }

        if started.elapsed() >= timeout {
            return Err(ArcadeError::ModelError {
                message: format!(
                    "model did not open {} within {:?}",
                    socket_path.display(),
                    timeout
                ),
            });
        }
        tokio::time::sleep(SOCKET_POLL_INTERVAL).await;
    }
}

/// 讀到以 NUL 結尾為止，回傳不含 NUL 的內容
pub async fn read_message<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    let mut chunk = [0u8; READ_CHUNK];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            return Err(ArcadeError::ProtocolError {
                message: "model closed the connection".to_string(),
            });
        }
        data.extend_from_slice(&chunk[..n]);
        if data.last() == Some(&0) {
            data.pop();
            return Ok(data);
        }
    }
}
