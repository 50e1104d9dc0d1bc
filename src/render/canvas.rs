use crate::core::geometry::Rect;
use crate::render::font::HudFont;
use crate::utils::error::Result;
use image::{Rgba, RgbaImage};
use std::path::Path;

pub type Color = [u8; 3];

pub const BLACK: Color = [0, 0, 0];
pub const WHITE: Color = [255, 255, 255];

/// 軟體繪圖畫布，畫完整張交給 Display
pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        let p = self.image.get_pixel(x, y);
        Some([p[0], p[1], p[2]])
    }

    pub fn fill(&mut self, color: Color) {
        let px = Rgba([color[0], color[1], color[2], 255]);
        for p in self.image.pixels_mut() {
            *p = px;
        }
    }

    /// 回傳裁切到畫布內的範圍 (x0, y0, x1, y1)
    fn clip(&self, rect: Rect) -> Option<(u32, u32, u32, u32)> {
        let x0 = rect.left().max(0);
        let y0 = rect.top().max(0);
        let x1 = rect.right().min(self.width() as i32);
        let y1 = rect.bottom().min(self.height() as i32);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        let Some((x0, y0, x1, y1)) = self.clip(rect) else {
            return;
        };
        let px = Rgba([color[0], color[1], color[2], 255]);
        for y in y0..y1 {
            for x in x0..x1 {
                self.image.put_pixel(x, y, px);
            }
        }
    }

    /// 內切於 rect 的橢圓
    pub fn fill_ellipse(&mut self, rect: Rect, color: Color) {
        let Some((x0, y0, x1, y1)) = self.clip(rect) else {
            return;
        };
        let rx = rect.w as f32 / 2.0;
        let ry = rect.h as f32 / 2.0;
        let cx = rect.x as f32 + rx;
        let cy = rect.y as f32 + ry;
        let px = Rgba([color[0], color[1], color[2], 255]);
        for y in y0..y1 {
            for x in x0..x1 {
                let dx = (x as f32 + 0.5 - cx) / rx;
                let dy = (y as f32 + 0.5 - cy) / ry;
                if dx * dx + dy * dy <= 1.0 {
                    self.image.put_pixel(x, y, px);
                }
            }
        }
    }

    pub fn vline(&mut self, x: i32, color: Color) {
        let h = self.height() as i32;
        self.fill_rect(Rect::new(x, 0, 1, h), color);
    }

    fn blend(&mut self, x: i32, y: i32, color: Color, coverage: f32) {
        if x < 0 || y < 0 || x >= self.width() as i32 || y >= self.height() as i32 {
            return;
        }
        let a = coverage.clamp(0.0, 1.0);
        let dst = self.image.get_pixel_mut(x as u32, y as u32);
        for c in 0..3 {
            let mixed = color[c] as f32 * a + dst[c] as f32 * (1.0 - a);
            dst[c] = mixed.round() as u8;
        }
        dst[3] = 255;
    }

    pub fn draw_text(&mut self, font: &HudFont, text: &str, x: i32, y: i32, px: f32, color: Color) {
        font.rasterize(text, px, |gx, gy, coverage| {
            self.blend(x + gx, y + gy, color, coverage);
        });
    }

    /// 水平置中，y 為文字頂端
    pub fn draw_text_centered(&mut self, font: &HudFont, text: &str, y: i32, px: f32, color: Color) {
        let w = font.text_width(text, px);
        let x = (self.width() as f32 / 2.0 - w / 2.0).round() as i32;
        self.draw_text(font, text, x, y, px, color);
    }

    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.image.save(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_rect_is_clipped_to_canvas() {
        let mut canvas = Canvas::new(10, 10);
        canvas.fill(BLACK);
        canvas.fill_rect(Rect::new(-5, 8, 20, 20), WHITE);
        assert_eq!(canvas.pixel(0, 8), Some(WHITE));
        assert_eq!(canvas.pixel(9, 9), Some(WHITE));
        assert_eq!(canvas.pixel(0, 7), Some(BLACK));
    }

    #[test]
    fn test_rect_outside_canvas_draws_nothing() {
        let mut canvas = Canvas::new(10, 10);
        canvas.fill(BLACK);
        canvas.fill_rect(Rect::new(20, 20, 5, 5), WHITE);
        canvas.fill_ellipse(Rect::new(-30, 0, 5, 5), WHITE);
        assert!(canvas.image().pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn test_ellipse_leaves_corners_untouched() {
        let mut canvas = Canvas::new(20, 20);
        canvas.fill(BLACK);
        canvas.fill_ellipse(Rect::new(0, 0, 20, 20), WHITE);
        assert_eq!(canvas.pixel(10, 10), Some(WHITE));
        assert_eq!(canvas.pixel(0, 0), Some(BLACK));
        assert_eq!(canvas.pixel(19, 19), Some(BLACK));
    }

    #[test]
    fn test_vline_spans_full_height() {
        let mut canvas = Canvas::new(8, 6);
        canvas.fill(BLACK);
        canvas.vline(4, WHITE);
        assert!((0..6).all(|y| canvas.pixel(4, y) == Some(WHITE)));
        assert_eq!(canvas.pixel(3, 0), Some(BLACK));
    }

    #[test]
    fn test_save_png_round_trips_size() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("frame.png");
        let mut canvas = Canvas::new(12, 7);
        canvas.fill(WHITE);
        canvas.save_png(&path).unwrap();
        let loaded = image::open(&path).unwrap();
        assert_eq!((loaded.width(), loaded.height()), (12, 7));
    }
}
