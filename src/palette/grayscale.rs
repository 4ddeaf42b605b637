//! 灰度图判定：取缓冲区前 N 个像素，统计“三通道两两差值都很小”的比例。

use super::Bitmap;

const MAX_SAMPLED_PIXELS: usize = 1000;
const CHANNEL_TOLERANCE: u8 = 5;
/// 严格大于该比例才判定为灰度图。
const GRAY_FRACTION_THRESHOLD: f64 = 0.9;

/// 单个像素是否“近似灰色”（使用原始、未分桶的通道值）。
pub fn is_gray_like(r: u8, g: u8, b: u8) -> bool {
    r.abs_diff(g) <= CHANNEL_TOLERANCE
        && g.abs_diff(b) <= CHANNEL_TOLERANCE
        && r.abs_diff(b) <= CHANNEL_TOLERANCE
}

/// 判定整张图是否为灰度图。
///
/// 按迭代顺序检查前 `min(1000, 像素总数)` 个像素，结果只取决于输入。
pub fn is_grayscale(bitmap: &Bitmap) -> bool {
    let mut sampled = 0usize;
    let mut gray_like = 0usize;

    for px in bitmap.pixels().chunks_exact(4).take(MAX_SAMPLED_PIXELS) {
        sampled += 1;
        if is_gray_like(px[0], px[1], px[2]) {
            gray_like += 1;
        }
    }

    if sampled == 0 {
        return false;
    }

    gray_like as f64 / sampled as f64 > GRAY_FRACTION_THRESHOLD
}
