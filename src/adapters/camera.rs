use crate::utils::error::{ArcadeError, Result};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStdout, Command};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// `/dev/video<index>`
    pub index: u32,
    /// 直接指定裝置路徑，優先於 index
    pub device: Option<String>,
    pub ffmpeg: String,
    /// v4l2 輸入格式，例如 "mjpeg" 或 "yuyv422"
    pub input_format: Option<String>,
    /// 擷取解析度，例如 "640x480"
    pub video_size: Option<String>,
    pub framerate: Option<u32>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            device: None,
            ffmpeg: "ffmpeg".to_string(),
            input_format: None,
            video_size: None,
            framerate: None,
        }
    }
}

impl CameraConfig {
    pub fn device_path(&self) -> String {
        self.device
            .clone()
            .unwrap_or_else(|| format!("/dev/video{}", self.index))
    }

    /// ffmpeg 直接輸出已縮放並置中裁切好的 rgb24 畫面
    pub fn ffmpeg_args(&self, width: u32, height: u32) -> Vec<String> {
        let mut args: Vec<String> = ["-hide_banner", "-loglevel", "error", "-f", "v4l2"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        if let Some(format) = &self.input_format {
            args.extend(["-input_format".to_string(), format.clone()]);
        }
        if let Some(size) = &self.video_size {
            args.extend(["-video_size".to_string(), size.clone()]);
        }
        if let Some(fps) = self.framerate {
            args.extend(["-framerate".to_string(), fps.to_string()]);
        }

        args.extend([
            "-i".to_string(),
            self.device_path(),
            "-vf".to_string(),
            format!(
                "scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h}",
                w = width,
                h = height
            ),
            "-pix_fmt".to_string(),
            "rgb24".to_string(),
            "-f".to_string(),
            "rawvideo".to_string(),
            "-".to_string(),
        ]);
        args
    }
}

pub struct FfmpegCamera {
    child: Child,
    stdout: ChildStdout,
    width: u32,
    height: u32,
    buffer: Vec<u8>,
}

impl FfmpegCamera {
    pub async fn open(config: &CameraConfig, width: u32, height: u32) -> Result<Self> {
        let args = config.ffmpeg_args(width, height);
        tracing::debug!("Camera command: {} {}", config.ffmpeg, args.join(" "));

        let mut child = Command::new(&config.ffmpeg)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ArcadeError::CameraError {
                message: format!("failed to start {}: {}", config.ffmpeg, e),
            })?;

        let stdout = child.stdout.take().ok_or_else(|| ArcadeError::CameraError {
            message: "ffmpeg stdout not captured".to_string(),
        })?;

        tracing::info!(
            "📸 Camera initialized: {} → {}x{}",
            config.device_path(),
            width,
            height
        );

        Ok(Self {
            child,
            stdout,
            width,
            height,
            buffer: vec![0u8; (width * height * 3) as usize],
        })
    }

    pub async fn read_frame(&mut self) -> Result<RgbImage> {
        match self.stdout.read_exact(&mut self.buffer).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Err(ArcadeError::CameraError {
                    message: "camera stream ended".to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        }

        RgbImage::from_raw(self.width, self.height, self.buffer.clone()).ok_or_else(|| {
            ArcadeError::CameraError {
                message: "frame buffer size mismatch".to_string(),
            }
        })
    }

    pub async fn stop(&mut self) -> Result<()> {
        if self.child.try_wait()?.is_none() {
            self.child.kill().await?;
        }
        tracing::debug!("Camera released");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args_read_video0_as_rgb24() {
        let args = CameraConfig::default().ffmpeg_args(320, 240);
        let joined = args.join(" ");
        assert!(joined.contains("-f v4l2"));
        assert!(joined.contains("-i /dev/video0"));
        assert!(joined.contains("scale=320:240:force_original_aspect_ratio=increase,crop=320:240"));
        assert!(joined.ends_with("-pix_fmt rgb24 -f rawvideo -"));
        assert!(!joined.contains("-input_format"));
    }

    #[test]
    fn test_explicit_device_and_format() {
        let config = CameraConfig {
            index: 3,
            device: Some("/dev/v4l/by-id/usb-cam".to_string()),
            input_format: Some("mjpeg".to_string()),
            video_size: Some("640x480".to_string()),
            framerate: Some(15),
            ..Default::default()
        };
        let joined = config.ffmpeg_args(96, 96).join(" ");
        assert!(joined.contains("-input_format mjpeg -video_size 640x480 -framerate 15"));
        assert!(joined.contains("-i /dev/v4l/by-id/usb-cam"));
    }

    #[tokio::test]
    async fn test_missing_ffmpeg_binary_is_camera_error() {
        let config = CameraConfig {
            ffmpeg: "/no/such/ffmpeg".to_string(),
            ..Default::default()
        };
        let err = FfmpegCamera::open(&config, 96, 96).await.err().unwrap();
        assert!(matches!(err, ArcadeError::CameraError { .. }));
    }
}
