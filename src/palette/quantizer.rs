//! # 分桶与排序
//!
//! ## 设计思路
//!
//! 每个通道按 `round(c / 10) * 10` 粗粒度离散化（共 26 档：0, 10, …, 250），
//! 以离散后的 RGB 三元组为键统计出现次数，再按次数降序取前 K 个。
//!
//! ## 实现思路
//!
//! - 固定步长：只访问每第 4 个像素（RGBA 字节偏移 0, 16, 32, …），确定性、不随机。
//! - 计数表用 `HashMap<ColorKey, usize>` 存“键 → 首次出现序号”，
//!   计数本身放在按首次出现顺序排列的 `Vec` 中。
//! - `sort_by` 是稳定排序：次数相同的颜色保留首次出现的先后顺序。
//! - 255 按公式会得到 260，这里统一截断到 250，保证键落在 `[0, 255]` 内。

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use super::Bitmap;

/// 每隔多少个像素采样一次。
const SAMPLE_PIXEL_STRIDE: usize = 4;
const BYTES_PER_PIXEL: usize = 4;
const BUCKET_STEP: u16 = 10;
const BUCKET_MAX: u8 = 250;

/// 离散化后的 RGB 键。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorKey {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl ColorKey {
    /// 对原始 RGB 分别分桶。
    pub fn bucketed(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: bucket_channel(r),
            g: bucket_channel(g),
            b: bucket_channel(b),
        }
    }

    pub fn to_hex(self) -> String {
        to_hex(self)
    }
}

/// 排名结果：颜色键 + 采样命中次数。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankedColor {
    pub key: ColorKey,
    pub count: usize,
}

/// 单通道分桶：四舍五入到最近的 10 的倍数（`.5` 向上），上限 250。
pub fn bucket_channel(channel: u8) -> u8 {
    let rounded = (channel as u16 + BUCKET_STEP / 2) / BUCKET_STEP * BUCKET_STEP;
    rounded.min(BUCKET_MAX as u16) as u8
}

/// `#RRGGBB`，两位大写十六进制。
pub fn to_hex(key: ColorKey) -> String {
    format!("#{:02X}{:02X}{:02X}", key.r, key.g, key.b)
}

/// 对位图做分桶计数，返回出现次数最多的至多 `k` 个颜色。
///
/// # 示例
/// ```rust
/// use palette_extractor::palette::{rank, Bitmap};
///
/// let bitmap = Bitmap::filled(4, 4, [120, 50, 200, 255])?;
/// let ranked = rank(&bitmap, 5);
/// assert_eq!(ranked.len(), 1);
/// assert_eq!(ranked[0].key.to_hex(), "#7832C8");
/// # Ok::<(), palette_extractor::extractor::ExtractError>(())
/// ```
pub fn rank(bitmap: &Bitmap, k: usize) -> Vec<RankedColor> {
    rank_pixels(bitmap.pixels(), k)
}

/// 直接作用于 RGBA 字节缓冲；空缓冲返回空结果。
///
/// 末尾不足 4 字节的残片会被忽略。
pub fn rank_pixels(pixels: &[u8], k: usize) -> Vec<RankedColor> {
    if k == 0 {
        return Vec::new();
    }

    let mut first_seen: HashMap<ColorKey, usize> = HashMap::new();
    let mut ranked: Vec<RankedColor> = Vec::new();

    for px in pixels.chunks_exact(BYTES_PER_PIXEL).step_by(SAMPLE_PIXEL_STRIDE) {
        let key = ColorKey::bucketed(px[0], px[1], px[2]);
        match first_seen.entry(key) {
            Entry::Occupied(slot) => ranked[*slot.get()].count += 1,
            Entry::Vacant(slot) => {
                slot.insert(ranked.len());
                ranked.push(RankedColor { key, count: 1 });
            }
        }
    }

    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(k);
    ranked
}

/// 排名 + 十六进制转换的组合入口。
pub fn extract_palette(bitmap: &Bitmap, k: usize) -> Vec<String> {
    rank(bitmap, k).into_iter().map(|ranked| ranked.key.to_hex()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bitmap_from_pixels(width: u32, height: u32, pixels: &[[u8; 4]]) -> Bitmap {
        let bytes = pixels.iter().flatten().copied().collect();
        Bitmap::new(width, height, bytes).expect("valid bitmap")
    }

    #[test]
    fn bucket_rounds_half_up_and_clamps() {
        assert_eq!(bucket_channel(0), 0);
        assert_eq!(bucket_channel(4), 0);
        assert_eq!(bucket_channel(5), 10);
        assert_eq!(bucket_channel(14), 10);
        assert_eq!(bucket_channel(15), 20);
        assert_eq!(bucket_channel(128), 130);
        assert_eq!(bucket_channel(244), 240);
        assert_eq!(bucket_channel(245), 250);
        assert_eq!(bucket_channel(255), 250);
    }

    #[test]
    fn hex_is_uppercase_and_zero_padded() {
        assert_eq!(to_hex(ColorKey { r: 0, g: 10, b: 250 }), "#000AFA");
        assert_eq!(to_hex(ColorKey { r: 120, g: 50, b: 200 }), "#7832C8");
    }

    #[test]
    fn uniform_image_yields_single_color() {
        let bitmap = Bitmap::filled(10, 10, [120, 50, 200, 255]).expect("valid bitmap");
        assert_eq!(extract_palette(&bitmap, 5), vec!["#7832C8".to_string()]);
    }

    #[test]
    fn stride_only_visits_every_fourth_pixel() {
        // 只有下标 0 和 4 会被采样
        let pixels = [
            [255, 0, 0, 255],
            [0, 0, 255, 255],
            [0, 0, 255, 255],
            [0, 0, 255, 255],
            [255, 0, 0, 255],
            [0, 0, 255, 255],
            [0, 0, 255, 255],
            [0, 0, 255, 255],
        ];
        let bitmap = bitmap_from_pixels(8, 1, &pixels);

        let ranked = rank(&bitmap, 5);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].key, ColorKey { r: 250, g: 0, b: 0 });
        assert_eq!(ranked[0].count, 2);
    }

    #[test]
    fn ties_keep_first_seen_order() {
        // 采样点依次为：绿、红、红、绿，两者各 2 次，绿色先出现
        let green = [0, 200, 0, 255];
        let red = [200, 0, 0, 255];
        let filler = [7, 7, 7, 255];
        let mut pixels = Vec::new();
        for sampled in [green, red, red, green] {
            pixels.push(sampled);
            pixels.extend([filler; 3]);
        }
        let bitmap = bitmap_from_pixels(16, 1, &pixels);

        let palette = extract_palette(&bitmap, 5);
        assert_eq!(palette, vec!["#00C800".to_string(), "#C80000".to_string()]);
    }

    #[test]
    fn higher_count_wins_over_first_seen() {
        let a = [10, 10, 10, 255];
        let b = [90, 90, 90, 255];
        let filler = [0, 0, 0, 255];
        let mut pixels = Vec::new();
        for sampled in [a, b, b, b] {
            pixels.push(sampled);
            pixels.extend([filler; 3]);
        }
        let bitmap = bitmap_from_pixels(4, 4, &pixels);

        let ranked = rank(&bitmap, 5);
        assert_eq!(ranked[0].key, ColorKey { r: 90, g: 90, b: 90 });
        assert_eq!(ranked[0].count, 3);
        assert_eq!(ranked[1].count, 1);
    }

    #[test]
    fn result_is_truncated_to_k() {
        let pixels: Vec<[u8; 4]> = (0..40u8).map(|i| [i * 6, 0, 0, 255]).collect();
        let bitmap = bitmap_from_pixels(40, 1, &pixels);

        assert!(rank(&bitmap, 3).len() <= 3);
        assert!(rank(&bitmap, 0).is_empty());
    }

    #[test]
    fn fewer_buckets_than_k_returns_all() {
        let bitmap = Bitmap::filled(8, 8, [33, 66, 99, 255]).expect("valid bitmap");
        assert_eq!(rank(&bitmap, 10).len(), 1);
    }

    #[test]
    fn empty_buffer_yields_empty_palette() {
        assert!(rank_pixels(&[], 5).is_empty());
        assert!(rank_pixels(&[1, 2, 3], 5).is_empty());
    }

    #[test]
    fn alpha_channel_is_ignored() {
        let opaque = Bitmap::filled(4, 4, [60, 70, 80, 255]).expect("valid bitmap");
        let transparent = Bitmap::filled(4, 4, [60, 70, 80, 0]).expect("valid bitmap");
        assert_eq!(extract_palette(&opaque, 5), extract_palette(&transparent, 5));
    }
}
