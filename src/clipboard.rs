//! # 剪贴板写入模块
//!
//! ## 设计思路
//!
//! 将与操作系统剪贴板交互的逻辑独立出来，便于隔离平台不稳定因素。
//! 只写入单个颜色的文本（`#RRGGBB`），写入前先校验格式。
//!
//! ## 实现思路
//!
//! - 使用 `arboard` 写文本；其他进程占用剪贴板时会偶发失败，因此做有限重试。
//! - 重试间隔按指数退避，单次等待不超过上限。
//! - 所有失败统一映射为 `AppError::Clipboard`。

use std::thread;
use std::time::Duration;

use crate::error::AppError;

/// “已复制”提示的展示时长。
pub const COPY_FEEDBACK_DURATION: Duration = Duration::from_millis(2_000);

const CLIPBOARD_RETRIES: u32 = 3;
const CLIPBOARD_RETRY_BASE_DELAY_MS: u64 = 60;
const CLIPBOARD_RETRY_MAX_DELAY_MS: u64 = 400;

/// 是否为合法的 `#RRGGBB`（大小写均可）。
pub fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}

fn compute_backoff_delay(attempt: u32) -> u64 {
    CLIPBOARD_RETRY_BASE_DELAY_MS
        .saturating_mul(1_u64 << attempt.saturating_sub(1).min(8))
        .min(CLIPBOARD_RETRY_MAX_DELAY_MS)
}

/// 将一个颜色复制到系统剪贴板（阻塞，含重试）。
pub fn copy_color(color: &str) -> Result<(), AppError> {
    if !is_hex_color(color) {
        return Err(AppError::Clipboard(format!("不是合法的颜色值：{}", color)));
    }

    let mut last_error = None;
    for attempt in 1..=CLIPBOARD_RETRIES {
        if attempt > 1 {
            let wait_ms = compute_backoff_delay(attempt - 1);
            log::debug!("🔄 重试 {}/{}，等待 {}ms", attempt, CLIPBOARD_RETRIES, wait_ms);
            thread::sleep(Duration::from_millis(wait_ms));
        }

        match arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(color)) {
            Ok(()) => {
                log::info!("📋 已复制颜色 {} (尝试 {})", color, attempt);
                return Ok(());
            }
            Err(err) => {
                log::warn!("❌ 尝试 {} 失败: {}", attempt, err);
                last_error = Some(err.to_string());
            }
        }
    }

    Err(AppError::Clipboard(
        last_error.unwrap_or_else(|| "未知错误".to_string()),
    ))
}
