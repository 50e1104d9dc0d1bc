use crate::domain::ports::Display;
use crate::render::Canvas;
use crate::utils::error::{ArcadeError, Result};
use image::imageops::{self, FilterType};
use image::RgbaImage;
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

impl<D: Display + ?Sized> Display for Box<D> {
    fn size(&self) -> (u32, u32) {
        (**self).size()
    }

    fn present(&mut self, canvas: &Canvas) -> Result<()> {
        (**self).present(canvas)
    }
}

impl<D: Display + ?Sized> Display for &mut D {
    fn size(&self) -> (u32, u32) {
        (**self).size()
    }

    fn present(&mut self, canvas: &Canvas) -> Result<()> {
        (**self).present(canvas)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramebufferGeometry {
    pub width: u32,
    pub height: u32,
    pub bits_per_pixel: u32,
    /// 每列位元組數，可能大於 width * bpp / 8
    pub stride: u32,
}

impl FramebufferGeometry {
    pub fn parse(virtual_size: &str, bits_per_pixel: &str, stride: Option<&str>) -> Result<Self> {
        let invalid = |field: &str, value: &str| ArcadeError::DisplayError {
            message: format!("invalid framebuffer {}: '{}'", field, value.trim()),
        };

        let (w, h) = virtual_size
            .trim()
            .split_once(',')
            .ok_or_else(|| invalid("virtual_size", virtual_size))?;
        let width: u32 = w.trim().parse().map_err(|_| invalid("virtual_size", virtual_size))?;
        let height: u32 = h.trim().parse().map_err(|_| invalid("virtual_size", virtual_size))?;
        let bpp: u32 = bits_per_pixel
            .trim()
            .parse()
            .map_err(|_| invalid("bits_per_pixel", bits_per_pixel))?;

        if !matches!(bpp, 16 | 24 | 32) {
            return Err(ArcadeError::DisplayError {
                message: format!("unsupported framebuffer depth: {} bpp", bpp),
            });
        }

        if width == 0 || height == 0 {
            return Err(invalid("virtual_size", virtual_size));
        }

        let min_stride = width * bpp / 8;
        let stride = match stride {
            Some(s) => s.trim().parse().map_err(|_| invalid("stride", s))?,
            None => min_stride,
        };
        if stride < min_stride {
            return Err(ArcadeError::DisplayError {
                message: format!(
                    "framebuffer stride {} is smaller than one row ({} bytes)",
                    stride, min_stride
                ),
            });
        }

        Ok(Self {
            width,
            height,
            bits_per_pixel: bpp,
            stride,
        })
    }

    /// 讀取 /sys/class/graphics/fbN 底下的幾何資訊
    pub fn from_sysfs(sys_dir: &Path) -> Result<Self> {
        let virtual_size = std::fs::read_to_string(sys_dir.join("virtual_size"))?;
        let bpp = std::fs::read_to_string(sys_dir.join("bits_per_pixel"))?;
        let stride = std::fs::read_to_string(sys_dir.join("stride")).ok();
        Self::parse(&virtual_size, &bpp, stride.as_deref())
    }

    pub fn frame_len(&self) -> usize {
        self.stride as usize * self.height as usize
    }
}

/// 把畫面等比縮小（不放大）後置中寫入 fb 記憶體格式，其餘區域填黑
pub fn encode_frame(image: &RgbaImage, geometry: &FramebufferGeometry, out: &mut Vec<u8>) {
    out.clear();
    out.resize(geometry.frame_len(), 0);

    let (iw, ih) = image.dimensions();
    let scaled;
    let src = if iw > geometry.width || ih > geometry.height {
        let scale = f64::min(
            geometry.width as f64 / iw as f64,
            geometry.height as f64 / ih as f64,
        );
        let sw = ((iw as f64 * scale) as u32).max(1);
        let sh = ((ih as f64 * scale) as u32).max(1);
        scaled = imageops::resize(image, sw, sh, FilterType::Nearest);
        &scaled
    } else {
        image
    };

    let (sw, sh) = src.dimensions();
    let ox = (geometry.width - sw) / 2;
    let oy = (geometry.height - sh) / 2;
    let bytes_pp = (geometry.bits_per_pixel / 8) as usize;

    for (x, y, p) in src.enumerate_pixels() {
        let offset = (oy + y) as usize * geometry.stride as usize + (ox + x) as usize * bytes_pp;
        let (r, g, b) = (p[0], p[1], p[2]);
        match geometry.bits_per_pixel {
            16 => {
                let v: u16 = ((r as u16 >> 3) << 11) | ((g as u16 >> 2) << 5) | (b as u16 >> 3);
                out[offset..offset + 2].copy_from_slice(&v.to_le_bytes());
            }
            24 => out[offset..offset + 3].copy_from_slice(&[b, g, r]),
            _ => out[offset..offset + 4].copy_from_slice(&[b, g, r, 0xFF]),
        }
    }
}

/// Linux fbdev，Pi 接 LCD 時不需要桌面環境
pub struct FramebufferDisplay {
    file: File,
    geometry: FramebufferGeometry,
    buffer: Vec<u8>,
}

impl FramebufferDisplay {
    pub fn open(device: &str) -> Result<Self> {
        let name = Path::new(device)
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ArcadeError::DisplayError {
                message: format!("invalid framebuffer device: {}", device),
            })?;
        let sys_dir = PathBuf::from("/sys/class/graphics").join(name);
        let geometry = FramebufferGeometry::from_sysfs(&sys_dir).map_err(|e| ArcadeError::DisplayError {
            message: format!("cannot read geometry from {}: {}", sys_dir.display(), e),
        })?;

        let file = OpenOptions::new()
            .write(true)
            .open(device)
            .map_err(|e| ArcadeError::DisplayError {
                message: format!("cannot open {}: {}", device, e),
            })?;

        tracing::info!(
            "🖥️ Framebuffer {} ({}x{}, {} bpp)",
            device,
            geometry.width,
            geometry.height,
            geometry.bits_per_pixel
        );
        Ok(Self::with_geometry(file, geometry))
    }

    pub fn with_geometry(file: File, geometry: FramebufferGeometry) -> Self {
        Self {
            file,
            geometry,
            buffer: Vec::with_capacity(geometry.frame_len()),
        }
    }
}

impl Display for FramebufferDisplay {
    fn size(&self) -> (u32, u32) {
        (self.geometry.width, self.geometry.height)
    }

    fn present(&mut self, canvas: &Canvas) -> Result<()> {
        encode_frame(canvas.image(), &self.geometry, &mut self.buffer);
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(&self.buffer)?;
        Ok(())
    }
}

/// 不輸出畫面，只計數；可選擇保留最後一幀
pub struct HeadlessDisplay {
    width: u32,
    height: u32,
    frames: Arc<AtomicU64>,
    keep_last: bool,
    last: Option<RgbaImage>,
}

impl HeadlessDisplay {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frames: Arc::new(AtomicU64::new(0)),
            keep_last: false,
            last: None,
        }
    }

    pub fn keeping_last_frame(mut self) -> Self {
        self.keep_last = true;
        self
    }

    /// 引擎取走 display 後仍可讀取的計數器
    pub fn frame_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.frames)
    }

    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    pub fn last_frame(&self) -> Option<&RgbaImage> {
        self.last.as_ref()
    }
}

impl Display for HeadlessDisplay {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn present(&mut self, canvas: &Canvas) -> Result<()> {
        self.frames.fetch_add(1, Ordering::Relaxed);
        if self.keep_last {
            self.last = Some(canvas.image().clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::Rect;
    use std::io::Read;

    #[test]
    fn test_parse_geometry() {
        let g = FramebufferGeometry::parse("800,480\n", "16\n", None).unwrap();
        assert_eq!(g.width, 800);
        assert_eq!(g.height, 480);
        assert_eq!(g.stride, 1600);

        let g = FramebufferGeometry::parse("1920,1080", "32", Some("7808\n")).unwrap();
        assert_eq!(g.stride, 7808);
        assert_eq!(g.frame_len(), 7808 * 1080);
    }

    #[test]
    fn test_parse_geometry_rejects_bad_values() {
        assert!(FramebufferGeometry::parse("800x480", "16", None).is_err());
        assert!(FramebufferGeometry::parse("800,480", "8", None).is_err());
        assert!(FramebufferGeometry::parse("0,0", "16", None).is_err());
        assert!(FramebufferGeometry::parse("800,0", "32", None).is_err());
        // 32 bpp 一列至少 3200 bytes
        let err = FramebufferGeometry::parse("800,480", "32", Some("1600")).unwrap_err();
        assert!(err.to_string().contains("stride"));
    }

    #[test]
    fn test_geometry_from_sysfs_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("virtual_size"), "320,240\n").unwrap();
        std::fs::write(dir.path().join("bits_per_pixel"), "24\n").unwrap();
        let g = FramebufferGeometry::from_sysfs(dir.path()).unwrap();
        assert_eq!((g.width, g.height, g.stride), (320, 240, 960));
    }

    #[test]
    fn test_encode_rgb565_centers_image() {
        let geometry = FramebufferGeometry::parse("4,2", "16", None).unwrap();
        let mut img = RgbaImage::new(2, 2);
        for p in img.pixels_mut() {
            *p = image::Rgba([255, 0, 0, 255]);
        }
        let mut out = Vec::new();
        encode_frame(&img, &geometry, &mut out);

        assert_eq!(out.len(), 16);
        // 左邊第一格是黑色，x=1 開始是紅色
        assert_eq!(&out[0..2], &[0, 0]);
        assert_eq!(&out[2..4], &0xF800u16.to_le_bytes());
        assert_eq!(&out[6..8], &[0, 0]);
    }

    #[test]
    fn test_encode_downscales_large_canvas() {
        let geometry = FramebufferGeometry::parse("100,50", "32", None).unwrap();
        let img = RgbaImage::from_pixel(400, 100, image::Rgba([0, 255, 0, 255]));
        let mut out = Vec::new();
        encode_frame(&img, &geometry, &mut out);
        // 縮成 100x25，上下各留 12 列黑邊
        let row = |y: usize| &out[y * 400..y * 400 + 4];
        assert_eq!(row(0), &[0, 0, 0, 0]);
        assert_eq!(row(12), &[0, 255, 0, 0xFF]);
    }

    #[test]
    fn test_framebuffer_display_writes_whole_frame() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let geometry = FramebufferGeometry::parse("8,4", "32", None).unwrap();
        let mut display = FramebufferDisplay::with_geometry(file.reopen().unwrap(), geometry);

        let mut canvas = Canvas::new(8, 4);
        canvas.fill([1, 2, 3]);
        canvas.fill_rect(Rect::new(0, 0, 1, 1), [10, 20, 30]);
        display.present(&canvas).unwrap();
        display.present(&canvas).unwrap();

        let mut bytes = Vec::new();
        file.reopen().unwrap().read_to_end(&mut bytes).unwrap();
        assert_eq!(bytes.len(), 8 * 4 * 4);
        assert_eq!(&bytes[0..4], &[30, 20, 10, 0xFF]);
        assert_eq!(&bytes[4..8], &[3, 2, 1, 0xFF]);
    }

    #[test]
    fn test_headless_display_counts_frames() {
        let mut display = HeadlessDisplay::new(10, 10).keeping_last_frame();
        let counter = display.frame_counter();
        let canvas = Canvas::new(10, 10);
        display.present(&canvas).unwrap();
        (&mut display).present(&canvas).unwrap();
        assert_eq!(counter.load(Ordering::Relaxed), 2);
        assert_eq!(display.frames(), 2);
        assert!(display.last_frame().is_some());
    }
}
