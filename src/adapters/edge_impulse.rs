use crate::adapters::camera::{CameraConfig, FfmpegCamera};
use crate::adapters::eim::EimRunner;
use crate::core::features::features_from_image;
use crate::domain::model::{GestureFrame, ModelInfo};
use crate::domain::ports::GestureSource;
use crate::utils::error::{ArcadeError, Result};
use async_trait::async_trait;
use std::path::Path;
use std::time::{Duration, Instant};

/// 相機 → 模型，每張畫面推論一次
pub struct EdgeImpulseSource {
    runner: EimRunner,
    camera: FfmpegCamera,
    channels: u32,
}

impl EdgeImpulseSource {
    pub async fn start(model_path: &Path, camera: &CameraConfig, startup_timeout: Duration) -> Result<Self> {
        let mut runner = EimRunner::start(model_path, startup_timeout).await?;
        let (width, height) = runner.model_info().input_size();

        let camera = match FfmpegCamera::open(camera, width, height).await {
            Ok(camera) => camera,
            Err(e) => {
                let _ = runner.stop().await;
                return Err(e);
            }
        };

        Ok(Self::new(runner, camera))
    }

    pub fn new(runner: EimRunner, camera: FfmpegCamera) -> Self {
        let channels = runner.model_info().channels();
        Self {
            runner,
            camera,
            channels,
        }
    }
}

#[async_trait]
impl GestureSource for EdgeImpulseSource {
    fn model_info(&self) -> &ModelInfo {
        self.runner.model_info()
    }

    async fn next_frame(&mut self) -> Result<Option<GestureFrame>> {
        loop {
            let image = self.camera.read_frame().await?;
            let captured_at = Instant::now();
            let features = features_from_image(&image, self.channels);

            match self.runner.classify(&features).await {
                Ok(response) => {
                    let timing = response.timing.as_ref().map(|t| t.total_ms());
                    return Ok(Some(GestureFrame::from_result(
                        response.result,
                        timing,
                        captured_at,
                    )));
                }
                // 模型回報單張失敗就跳過這張，連線問題才往上拋
                Err(ArcadeError::ModelError { message }) => {
                    tracing::warn!("⚠️ Classification error: {}", message);
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn stop(&mut self) -> Result<()> {
        let camera = self.camera.stop().await;
        let runner = self.runner.stop().await;
        camera.and(runner)
    }
}
