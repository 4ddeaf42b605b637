//! # 服务层（可注入状态）
//!
//! ## 设计思路
//!
//! `PaletteService` 把提取器、调色板缓存与会话状态组合在一起，
//! 作为 CLI 或任意宿主界面的唯一入口；存储实现由调用方注入。
//!
//! ## 实现思路
//!
//! - `submit`：在 `spawn_blocking` 中执行完整提取链路，成功后写缓存、更新会话。
//! - `copy_color`：写入剪贴板后标记“已复制”，在 Tokio 运行时内定时清除标记。
//! - `restore_last / clear_cache`：缓存读写失败只记日志，不影响主流程。
//! - 会话锁中毒时直接取回内部状态继续使用，会话只是展示用数据。

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::clipboard::{self, COPY_FEEDBACK_DURATION};
use crate::error::AppError;
use crate::export::{self, ExportArtifact};
use crate::extractor::{ImageInput, PaletteExtractor};
use crate::palette::ExtractionResult;
use crate::session::{PaletteSession, SessionEvent, SessionState};
use crate::storage::{KeyValueStore, PaletteCache};

pub struct PaletteService<S: KeyValueStore> {
    extractor: PaletteExtractor,
    cache: PaletteCache<S>,
    session: Arc<Mutex<PaletteSession>>,
    copy_feedback: Duration,
}

impl<S: KeyValueStore> PaletteService<S> {
    /// 使用给定提取器与存储创建服务。
    ///
    /// # 示例
    /// ```rust
    /// use palette_extractor::extractor::{ExtractorConfig, PaletteExtractor};
    /// use palette_extractor::service::PaletteService;
    /// use palette_extractor::storage::MemoryStore;
    ///
    /// let extractor = PaletteExtractor::new(ExtractorConfig::default())?;
    /// let service = PaletteService::new(extractor, MemoryStore::new());
    /// assert!(service.snapshot().colors.is_empty());
    /// # Ok::<(), palette_extractor::extractor::ExtractError>(())
    /// ```
    pub fn new(extractor: PaletteExtractor, store: S) -> Self {
        Self {
            extractor,
            cache: PaletteCache::new(store),
            session: Arc::new(Mutex::new(PaletteSession::new())),
            copy_feedback: COPY_FEEDBACK_DURATION,
        }
    }

    /// 调整“已复制”提示的展示时长。
    pub fn with_copy_feedback(mut self, duration: Duration) -> Self {
        self.copy_feedback = duration;
        self
    }

    pub fn extractor(&self) -> &PaletteExtractor {
        &self.extractor
    }

    pub fn cache(&self) -> &PaletteCache<S> {
        &self.cache
    }

    fn with_session<T>(&self, op: impl FnOnce(&mut PaletteSession) -> T) -> T {
        let mut guard = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        op(&mut guard)
    }

    /// 持锁完成迁移，释放锁后再通知观察者，观察者可以回调本服务。
    fn dispatch(&self, event: SessionEvent) -> SessionState {
        self.with_session(|session| session.apply(event)).notify()
    }

    /// 当前会话状态的副本。
    pub fn snapshot(&self) -> SessionState {
        self.with_session(|session| session.state().clone())
    }

    pub fn subscribe(&self, observer: impl Fn(&SessionState) + Send + Sync + 'static) {
        self.with_session(|session| session.subscribe(observer));
    }

    /// 从缓存恢复上一次结果；没有或不可用时返回 `None`，会话保持不变。
    pub fn restore_last(&self) -> Option<ExtractionResult> {
        let result = self.cache.load()?;
        self.dispatch(SessionEvent::CacheRestored(result.clone()));
        Some(result)
    }

    /// 提交一张图片并等待提取完成。
    ///
    /// 失败时会话记录错误文案并清空调色板，错误同时返回给调用方。
    pub async fn submit(&self, input: ImageInput) -> Result<ExtractionResult, AppError> {
        self.dispatch(SessionEvent::ExtractionStarted {
            source_name: input.source_name.clone(),
        });

        let extractor = self.extractor.clone();
        let outcome = tokio::task::spawn_blocking(move || extractor.extract(input))
            .await
            .map_err(|e| AppError::Io(std::io::Error::other(format!("提取任务异常退出: {}", e))))?;

        match outcome {
            Ok(result) => {
                if !self.cache.save(&result) {
                    log::debug!("调色板未写入缓存 - {}", result.source_name);
                }
                self.dispatch(SessionEvent::ExtractionSucceeded(result.clone()));
                Ok(result)
            }
            Err(err) => {
                self.dispatch(SessionEvent::ExtractionFailed {
                    message: err.to_string(),
                });
                Err(err.into())
            }
        }
    }

    /// 复制当前调色板中第 `index` 个颜色到系统剪贴板，返回被复制的颜色。
    pub fn copy_color(&self, index: usize) -> Result<String, AppError> {
        let color = self
            .snapshot()
            .colors
            .get(index)
            .cloned()
            .ok_or_else(|| AppError::Clipboard(format!("调色板中没有第 {} 个颜色", index + 1)))?;

        clipboard::copy_color(&color)?;
        self.mark_copied(index);
        Ok(color)
    }

    /// 标记某个颜色“已复制”，并在提示时长后自动清除。
    ///
    /// 不在 Tokio 运行时中调用时只做标记，不会自动清除。
    pub fn mark_copied(&self, index: usize) -> bool {
        let state = self.dispatch(SessionEvent::ColorCopied { index });
        if state.copied_index != Some(index) {
            return false;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let session = Arc::clone(&self.session);
                let delay = self.copy_feedback;
                handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    let transition = session
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .apply(SessionEvent::CopyFeedbackExpired { index });
                    transition.notify();
                });
            }
            Err(_) => log::debug!("不在异步运行时中，复制提示不会自动清除"),
        }
        true
    }

    /// 当前调色板的导出产物；调色板为空时返回 `None`。
    pub fn export_artifact(&self) -> Option<ExportArtifact> {
        let state = self.snapshot();
        state.has_palette().then(|| export::build_artifact(&state.colors))
    }

    pub fn export_to(&self, path: &Path) -> Result<(), AppError> {
        export::write_export(path, &self.snapshot().colors)
    }

    /// “更换图片”：清空会话，缓存保留。
    pub fn reset(&self) {
        self.dispatch(SessionEvent::Reset);
    }

    pub fn clear_cache(&self) -> bool {
        self.cache.clear()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba};

    use super::*;
    use crate::extractor::{ExtractError, ExtractorConfig};
    use crate::storage::MemoryStore;

    fn solid_png(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
        let img = ImageBuffer::from_pixel(width, height, Rgba([rgb[0], rgb[1], rgb[2], 255]));
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut cursor, ImageFormat::Png)
            .expect("failed to encode test image");
        cursor.into_inner()
    }

    fn service() -> PaletteService<MemoryStore> {
        let extractor = PaletteExtractor::new(ExtractorConfig::default()).expect("default config is valid");
        PaletteService::new(extractor, MemoryStore::new()).with_copy_feedback(Duration::from_millis(20))
    }

    #[tokio::test]
    async fn submit_updates_session_and_cache() {
        let service = service();
        let input = ImageInput::from_bytes("purple.png", "image/png", solid_png(64, 48, [120, 50, 200]));

        let result = service.submit(input).await.expect("extraction should succeed");
        assert_eq!(result.colors, vec!["#7832C8".to_string()]);

        let state = service.snapshot();
        assert_eq!(state.colors, result.colors);
        assert_eq!(state.source_name.as_deref(), Some("purple.png"));
        assert!(state.error.is_none());

        let cached = service.cache().load().expect("result should be cached");
        assert_eq!(cached, result);
    }

    #[tokio::test]
    async fn failed_submit_records_error_and_keeps_cache() {
        let service = service();
        service
            .submit(ImageInput::from_bytes("ok.png", "image/png", solid_png(8, 8, [0, 0, 0])))
            .await
            .expect("first extraction should succeed");

        let err = service
            .submit(ImageInput::from_bytes("doc.pdf", "application/pdf", b"%PDF-1.7".to_vec()))
            .await
            .expect_err("pdf must be rejected");
        assert!(matches!(err, AppError::Extract(ExtractError::InvalidType(_))));

        let state = service.snapshot();
        assert!(state.colors.is_empty());
        assert!(state.error.is_some());
        assert_eq!(
            service.cache().load().map(|r| r.source_name),
            Some("ok.png".to_string())
        );
    }

    #[tokio::test]
    async fn restore_last_loads_cached_palette() {
        let store = Arc::new(MemoryStore::new());
        let extractor = PaletteExtractor::new(ExtractorConfig::default()).expect("default config is valid");

        let first = PaletteService::new(extractor.clone(), Arc::clone(&store));
        first
            .submit(ImageInput::from_bytes("white.png", "image/png", solid_png(4, 4, [255, 255, 255])))
            .await
            .expect("extraction should succeed");

        let second = PaletteService::new(extractor, store);
        assert!(second.snapshot().colors.is_empty());
        let restored = second.restore_last().expect("cache should be restored");
        assert_eq!(restored.colors, vec!["#FAFAFA".to_string()]);
        assert_eq!(second.snapshot().colors, restored.colors);
    }

    #[tokio::test]
    async fn copy_marker_expires_after_feedback_duration() {
        let service = service();
        service
            .submit(ImageInput::from_bytes("p.png", "image/png", solid_png(8, 8, [120, 50, 200])))
            .await
            .expect("extraction should succeed");

        assert!(service.mark_copied(0));
        assert_eq!(service.snapshot().copied_index, Some(0));

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(service.snapshot().copied_index, None);
    }

    #[test]
    fn copy_out_of_range_is_rejected() {
        let service = service();
        assert!(!service.mark_copied(0));
        assert!(matches!(service.copy_color(3), Err(AppError::Clipboard(_))));
    }

    #[tokio::test]
    async fn export_and_reset() {
        let service = service();
        assert!(service.export_artifact().is_none());

        service
            .submit(ImageInput::from_bytes("p.png", "image/png", solid_png(8, 8, [120, 50, 200])))
            .await
            .expect("extraction should succeed");

        let artifact = service.export_artifact().expect("palette is present");
        assert_eq!(artifact.contents, "#7832C8");
        assert_eq!(artifact.file_name, "palette.txt");

        service.reset();
        assert_eq!(service.snapshot(), SessionState::default());
        assert!(service.cache().load().is_some());

        assert!(service.clear_cache());
        assert!(service.cache().load().is_none());
    }

    #[tokio::test]
    async fn observers_are_notified_for_submit() {
        let service = service();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        service.subscribe(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        service
            .submit(ImageInput::from_bytes("p.png", "image/png", solid_png(8, 8, [10, 10, 10])))
            .await
            .expect("extraction should succeed");

        // started + succeeded
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn observers_may_call_back_into_service() {
        let service = Arc::new(service());
        let weak = Arc::downgrade(&service);
        let seen_sources = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen_sources);

        service.subscribe(move |_| {
            if let Some(service) = weak.upgrade() {
                let snapshot = service.snapshot();
                sink.lock().expect("sink lock").push(snapshot.source_name);
            }
        });

        service
            .submit(ImageInput::from_bytes("p.png", "image/png", solid_png(8, 8, [120, 50, 200])))
            .await
            .expect("extraction should succeed");
        assert!(service.mark_copied(0));
        tokio::time::sleep(Duration::from_millis(200)).await;
        service.reset();

        let seen = seen_sources.lock().expect("sink lock");
        // started, succeeded, copied, expired, reset
        assert_eq!(seen.len(), 5);
        assert_eq!(seen[1].as_deref(), Some("p.png"));
        assert_eq!(seen[4], None);
    }
}
