use image::imageops::{self, FilterType};
use image::RgbImage;

/// 等比縮放到短邊吻合，再從中央裁切成 width x height
pub fn fit_shortest(image: &RgbImage, width: u32, height: u32) -> RgbImage {
    let (iw, ih) = image.dimensions();
    if (iw, ih) == (width, height) || iw == 0 || ih == 0 {
        return image.clone();
    }

    let scale = f64::max(width as f64 / iw as f64, height as f64 / ih as f64);
    let rw = ((iw as f64 * scale).round() as u32).max(width);
    let rh = ((ih as f64 * scale).round() as u32).max(height);
    let resized = imageops::resize(image, rw, rh, FilterType::Triangle);

    let x = (rw - width) / 2;
    let y = (rh - height) / 2;
    imageops::crop_imm(&resized, x, y, width, height).to_image()
}

/// 每個像素一個 feature，RGB 打包成 0xRRGGBB；灰階模型則三個位元組都放亮度
pub fn features_from_image(image: &RgbImage, channels: u32) -> Vec<u32> {
    image
        .pixels()
        .map(|p| {
            let (r, g, b) = (p[0] as u32, p[1] as u32, p[2] as u32);
            if channels == 1 {
                let luma = (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32)
                    .round()
                    .min(255.0) as u32;
                (luma << 16) | (luma << 8) | luma
            } else {
                (r << 16) | (g << 8) | b
            }
        })
        .collect()
}
