//! # 会话状态适配层
//!
//! ## 设计思路
//!
//! 把“界面当前显示什么”从核心算法里剥离出来：核心只产出 `ExtractionResult`，
//! 会话层负责记录当前图片、调色板、错误提示与“已复制”标记。
//!
//! ## 实现思路
//!
//! - 状态迁移是纯函数 `reduce(state, event) -> state`，便于单测。
//! - `PaletteSession::apply` 只做迁移并返回待通知的 `Transition`，
//!   调用方释放自己的锁之后再 `notify`；`dispatch` 是两步合一的便捷入口。
//! - 提取失败时清空调色板并记录错误文案；重新选择图片前的 `Reset` 清空一切。
//! - “已复制”提示只在对应下标仍被标记时才会被过期事件清除，避免误清新的提示。

use std::sync::Arc;

use serde::Serialize;

use crate::palette::ExtractionResult;

/// 当前会话可被渲染的全部状态。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub source_name: Option<String>,
    pub colors: Vec<String>,
    pub is_grayscale: bool,
    pub extracted_at: Option<String>,
    pub error: Option<String>,
    pub copied_index: Option<usize>,
}

impl SessionState {
    pub fn has_palette(&self) -> bool {
        !self.colors.is_empty()
    }
}

/// 会话事件。
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// 新一次提取开始：清除上次错误与复制标记。
    ExtractionStarted { source_name: String },
    ExtractionSucceeded(ExtractionResult),
    ExtractionFailed { message: String },
    /// 启动时从缓存恢复上一次结果。
    CacheRestored(ExtractionResult),
    ColorCopied { index: usize },
    CopyFeedbackExpired { index: usize },
    /// “更换图片”：回到初始状态。
    Reset,
}

/// 纯状态迁移。
pub fn reduce(state: &SessionState, event: &SessionEvent) -> SessionState {
    match event {
        SessionEvent::ExtractionStarted { source_name } => SessionState {
            source_name: Some(source_name.clone()),
            error: None,
            copied_index: None,
            ..state.clone()
        },
        SessionEvent::ExtractionSucceeded(result) | SessionEvent::CacheRestored(result) => SessionState {
            source_name: Some(result.source_name.clone()),
            colors: result.colors.clone(),
            is_grayscale: result.is_grayscale,
            extracted_at: Some(result.extracted_at.clone()),
            error: None,
            copied_index: None,
        },
        SessionEvent::ExtractionFailed { message } => SessionState {
            source_name: None,
            colors: Vec::new(),
            is_grayscale: false,
            extracted_at: None,
            error: Some(message.clone()),
            copied_index: None,
        },
        SessionEvent::ColorCopied { index } => {
            if *index < state.colors.len() {
                SessionState {
                    copied_index: Some(*index),
                    ..state.clone()
                }
            } else {
                state.clone()
            }
        }
        SessionEvent::CopyFeedbackExpired { index } => {
            if state.copied_index == Some(*index) {
                SessionState {
                    copied_index: None,
                    ..state.clone()
                }
            } else {
                state.clone()
            }
        }
        SessionEvent::Reset => SessionState::default(),
    }
}

/// 状态观察者；以 `Arc` 持有，便于在释放外层锁之后再回调。
pub type Observer = Arc<dyn Fn(&SessionState) + Send + Sync>;

/// 一次已生效、尚未通知观察者的状态迁移。
///
/// 持有会话的外层锁时先拿到它，释放锁后再调用 `notify`，
/// 观察者因此可以安全地回调持锁的一方。
#[must_use = "call notify() to deliver the new state to observers"]
pub struct Transition {
    state: SessionState,
    observers: Vec<Observer>,
}

impl Transition {
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn notify(self) -> SessionState {
        for observer in &self.observers {
            observer(&self.state);
        }
        self.state
    }
}

/// 持有当前状态与观察者列表。
#[derive(Default)]
pub struct PaletteSession {
    state: SessionState,
    observers: Vec<Observer>,
}

impl PaletteSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// 注册观察者；每次状态迁移之后都会收到最新状态。
    pub fn subscribe(&mut self, observer: impl Fn(&SessionState) + Send + Sync + 'static) {
        self.observers.push(Arc::new(observer));
    }

    /// 应用迁移但不通知观察者。
    pub fn apply(&mut self, event: SessionEvent) -> Transition {
        log::debug!("🔁 会话事件: {:?}", event);
        self.state = reduce(&self.state, &event);
        Transition {
            state: self.state.clone(),
            observers: self.observers.clone(),
        }
    }

    /// 应用迁移并立即通知观察者。
    pub fn dispatch(&mut self, event: SessionEvent) -> &SessionState {
        self.apply(event).notify();
        &self.state
    }
}
