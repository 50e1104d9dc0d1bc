use crate::domain::model::{GestureFrame, InferenceResult, ModelInfo};
use crate::domain::ports::GestureSource;
use crate::utils::error::{ArcadeError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

/// 一行 JSON：等待 delay_ms 後送出 result
#[derive(Debug, Deserialize)]
struct ReplayLine {
    #[serde(default)]
    delay_ms: u64,
    #[serde(default)]
    result: InferenceResult,
    timing_ms: Option<f32>,
}

/// 用錄好的模型輸出取代相機與模型，方便在沒有硬體時測試
pub struct ReplaySource {
    lines: Lines<Box<dyn AsyncBufRead + Unpin + Send>>,
    info: ModelInfo,
    line_no: usize,
}

impl ReplaySource {
    pub async fn open<P: AsRef<Path>>(path: P, info: ModelInfo) -> Result<Self> {
        let file = tokio::fs::File::open(path.as_ref()).await?;
        tracing::info!("📼 Replaying gestures from {}", path.as_ref().display());
        Ok(Self::from_reader(BufReader::new(file), info))
    }

    pub fn from_reader<R>(reader: R, info: ModelInfo) -> Self
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let boxed: Box<dyn AsyncBufRead + Unpin + Send> = Box::new(reader);
        Self {
            lines: boxed.lines(),
            info,
            line_no: 0,
        }
    }
}

#[async_trait]
impl GestureSource for ReplaySource {
    fn model_info(&self) -> &ModelInfo {
        &self.info
    }

    async fn next_frame(&mut self) -> Result<Option<GestureFrame>> {
        while let Some(line) = self.lines.next_line().await? {
            self.line_no += 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let entry: ReplayLine =
                serde_json::from_str(trimmed).map_err(|e| ArcadeError::ProtocolError {
                    message: format!("replay line {}: {}", self.line_no, e),
                })?;

            if entry.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(entry.delay_ms)).await;
            }
            return Ok(Some(GestureFrame::from_result(
                entry.result,
                entry.timing_ms,
                Instant::now(),
            )));
        }
        Ok(None)
    }
}
