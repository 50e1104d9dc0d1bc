//! HUD text rasterised on the CPU with `ab_glyph`.
//!
//! The games only need a handful of short strings per frame (score, lives,
//! gesture name) so glyphs are outlined on every call instead of cached in
//! an atlas.

use crate::utils::error::Result;
use ab_glyph::{point, Font, FontArc, GlyphId, PxScale, ScaleFont};
use std::path::Path;

/// Raspberry Pi OS / Debian 預設會裝的字型
pub const DEFAULT_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
];

pub struct HudFont {
    font: FontArc,
}

impl HudFont {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let font = FontArc::try_from_vec(bytes)?;
        Ok(Self { font })
    }

    /// 指定路徑優先，否則依序嘗試系統字型；全部失敗就不畫文字
    pub fn discover(explicit: Option<&str>) -> Option<Self> {
        let candidates: Vec<&str> = match explicit {
            Some(path) => vec![path],
            None => DEFAULT_FONT_PATHS.to_vec(),
        };

        for path in candidates {
            match Self::from_file(path) {
                Ok(font) => {
                    tracing::debug!("🔤 HUD font loaded from {}", path);
                    return Some(font);
                }
                Err(e) => tracing::debug!("Font {} unusable: {}", path, e),
            }
        }

        tracing::warn!("⚠️ No usable HUD font found, text will not be drawn");
        None
    }

    pub fn text_width(&self, text: &str, px: f32) -> f32 {
        let scaled = self.font.as_scaled(PxScale::from(px));
        let mut width = 0.0;
        let mut prev: Option<GlyphId> = None;
        for ch in text.chars() {
            let gid = self.font.glyph_id(ch);
            if let Some(p) = prev {
                width += scaled.kern(p, gid);
            }
            width += scaled.h_advance(gid);
            prev = Some(gid);
        }
        width
    }

    pub fn line_height(&self, px: f32) -> f32 {
        let scaled = self.font.as_scaled(PxScale::from(px));
        scaled.ascent() - scaled.descent()
    }

    /// 以左上角為原點回呼每個像素的覆蓋率
    pub fn rasterize<F: FnMut(i32, i32, f32)>(&self, text: &str, px: f32, mut plot: F) {
        let scale = PxScale::from(px);
        let scaled = self.font.as_scaled(scale);
        let ascent = scaled.ascent();
        let mut caret = 0.0f32;
        let mut prev: Option<GlyphId> = None;

        for ch in text.chars() {
            let gid = self.font.glyph_id(ch);
            if let Some(p) = prev {
                caret += scaled.kern(p, gid);
            }
            let glyph = gid.with_scale_and_position(scale, point(caret, ascent));
            caret += scaled.h_advance(gid);
            prev = Some(gid);

            if let Some(outlined) = self.font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                let ox = bounds.min.x.floor() as i32;
                let oy = bounds.min.y.floor() as i32;
                outlined.draw(|gx, gy, coverage| {
                    plot(ox + gx as i32, oy + gy as i32, coverage);
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_font_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"not a font").unwrap();
        assert!(HudFont::from_file(file.path()).is_err());
    }

    #[test]
    fn test_discover_with_bad_explicit_path_gives_none() {
        assert!(HudFont::discover(Some("/no/such/font.ttf")).is_none());
    }
}
