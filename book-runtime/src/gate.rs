//! # Gate 模块
//!
//! 等待一段外部演出（开场翻书动画、时间轴）结束的门控。
//!
//! ## 完成条件
//!
//! ```text
//!             ┌── 原生完成信号 ──┐
//! Waiting ────┤                  ├──► Completed（回调只触发一次）
//!             └── 备用计时器到期 ─┘
//! ```
//!
//! 第三方动画引擎的完成信号并不总是可靠（片段缺失、零时长资源、渲染器被禁用），
//! 因此门控总是同时挂一个备用计时器，保证交互不会被永久锁住。

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, error, info, warn};

use crate::backend::{
    AnimationEngine, AssetHandle, CompletionCallback, SkeletonData, SkeletonPlayer, TrackHandle,
};
use crate::state::{CompletionTrigger, GateState};

/// 开场动画默认的备用超时（秒）
pub const DEFAULT_FALLBACK_TIMEOUT_SECS: f64 = 3.0;

struct LatchInner {
    state: GateState,
    trigger: Option<CompletionTrigger>,
    callback: Option<CompletionCallback>,
}

/// 完成信号
///
/// 单次赋值的完成锁存器。可以被克隆后交给动画引擎，
/// 无论被触发多少次，回调最多执行一次。
#[derive(Clone)]
pub struct CompletionSignal {
    inner: Rc<RefCell<LatchInner>>,
}

impl CompletionSignal {
    fn new(callback: CompletionCallback) -> Self {
        Self {
            inner: Rc::new(RefCell::new(LatchInner {
                state: GateState::Waiting,
                trigger: None,
                callback: Some(callback),
            })),
        }
    }

    /// 原生完成信号
    ///
    /// 返回本次调用是否真正完成了门控。
    pub fn fire(&self) -> bool {
        self.complete(CompletionTrigger::Native)
    }

    pub fn is_completed(&self) -> bool {
        self.inner.borrow().state == GateState::Completed
    }

    fn complete(&self, trigger: CompletionTrigger) -> bool {
        let callback = {
            let mut inner = self.inner.borrow_mut();
            if inner.state == GateState::Completed {
                return false;
            }
            inner.state = GateState::Completed;
            inner.trigger = Some(trigger);
            inner.callback.take()
        };
        // 回调可能回头查询门控状态，必须在释放借用之后调用
        if let Some(callback) = callback {
            callback();
        }
        true
    }

    /// 丢弃尚未触发的回调，之后的触发不再产生任何效果
    fn disarm(&self) {
        self.inner.borrow_mut().callback = None;
    }

    fn state(&self) -> GateState {
        self.inner.borrow().state
    }

    fn trigger(&self) -> Option<CompletionTrigger> {
        self.inner.borrow().trigger
    }
}

impl std::fmt::Debug for CompletionSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionSignal")
            .field("state", &self.state())
            .field("trigger", &self.trigger())
            .finish()
    }
}

/// 可被门控等待的外部演出
pub trait Presentation {
    /// 演出名称（用于日志）
    fn name(&self) -> &str;

    /// 开始播放，并在播放结束时调用 `signal.fire()`
    ///
    /// 无法播放时返回 `false`，门控会立即完成。
    fn begin(&mut self, signal: CompletionSignal) -> bool;
}

/// 动画门控
pub struct AnimationGate {
    name: String,
    signal: Option<CompletionSignal>,
    deadline: Option<f64>,
    /// 持有演出，保证播放实例在等待期间存活
    presentation: Option<Box<dyn Presentation>>,
}

impl AnimationGate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            signal: None,
            deadline: None,
            presentation: None,
        }
    }

    /// 开始等待演出
    ///
    /// - `presentation` 为 `None` 或无法播放：立即完成
    /// - 否则等待原生完成信号，或在 `fallback_timeout_secs` 后由 [`update`](Self::update) 强制完成
    ///
    /// 重复调用会丢弃上一次的等待（旧的完成信号不再生效）。
    pub fn start(
        &mut self,
        presentation: Option<Box<dyn Presentation>>,
        on_complete: impl FnOnce() + 'static,
        fallback_timeout_secs: f64,
        now: f64,
    ) {
        if let Some(previous) = self.signal.take() {
            previous.disarm();
        }
        let signal = CompletionSignal::new(Box::new(on_complete));
        self.signal = Some(signal.clone());
        self.deadline = None;
        self.presentation = None;

        let Some(mut presentation) = presentation else {
            warn!(gate = %self.name, "演出句柄无效，直接完成");
            signal.complete(CompletionTrigger::InvalidPresentation);
            return;
        };

        if !presentation.begin(signal.clone()) {
            error!(gate = %self.name, presentation = %presentation.name(), "演出无法播放，直接完成");
            signal.complete(CompletionTrigger::InvalidPresentation);
            return;
        }

        info!(gate = %self.name, presentation = %presentation.name(), "演出开始播放");
        self.presentation = Some(presentation);
        if !signal.is_completed() {
            let timeout = if fallback_timeout_secs.is_finite() {
                fallback_timeout_secs.max(0.0)
            } else {
                0.0
            };
            self.deadline = Some(now + timeout);
        }
    }

    /// 每个调度周期调用一次，检查备用计时器
    ///
    /// 返回门控是否已完成。
    pub fn update(&mut self, now: f64) -> bool {
        let Some(signal) = &self.signal else {
            return false;
        };

        if signal.is_completed() {
            self.deadline = None;
            return true;
        }

        if let Some(deadline) = self.deadline
            && now >= deadline
        {
            info!(gate = %self.name, "⏰ 演出超时，强制完成");
            self.deadline = None;
            signal.complete(CompletionTrigger::Timeout);
        }

        signal.is_completed()
    }

    /// 外部强制完成
    ///
    /// 仍在等待时与备用计时器到期等价；返回本次调用是否完成了门控。
    pub fn force_complete(&mut self) -> bool {
        let Some(signal) = &self.signal else {
            return false;
        };
        self.deadline = None;
        let completed = signal.complete(CompletionTrigger::Forced);
        if completed {
            info!(gate = %self.name, "演出被手动完成");
        }
        completed
    }

    pub fn state(&self) -> GateState {
        self.signal
            .as_ref()
            .map_or(GateState::Waiting, CompletionSignal::state)
    }

    pub fn is_completed(&self) -> bool {
        self.state() == GateState::Completed
    }

    /// 是否调用过 [`start`](Self::start)
    pub fn is_started(&self) -> bool {
        self.signal.is_some()
    }

    /// 完成来源
    pub fn trigger(&self) -> Option<CompletionTrigger> {
        self.signal.as_ref().and_then(CompletionSignal::trigger)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 正在等待的演出名称
    pub fn presentation_name(&self) -> Option<&str> {
        self.presentation.as_ref().map(|presentation| presentation.name())
    }
}

impl std::fmt::Debug for AnimationGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationGate")
            .field("name", &self.name)
            .field("state", &self.state())
            .field("trigger", &self.trigger())
            .field("deadline", &self.deadline)
            .finish()
    }
}

/// 骨骼动画演出
///
/// 在 0 号轨道上单次播放一个片段；指定片段不存在时退回资源的第一个片段。
/// 只有资源不含任何片段时才视为无法播放，播放被拒绝时由备用计时器完成。
pub struct SkeletonPresentation {
    clip_name: String,
    data: SkeletonData,
    player: Box<dyn SkeletonPlayer>,
    track: Option<Box<dyn TrackHandle>>,
}

impl SkeletonPresentation {
    /// 加载骨骼资源并创建播放实例
    ///
    /// 资源无法加载时返回 `None`（视为无效演出句柄）。
    pub fn load(
        engine: &mut dyn AnimationEngine,
        asset: &AssetHandle,
        clip_name: impl Into<String>,
    ) -> Option<Self> {
        let Some(data) = engine.load_skeleton_asset(asset) else {
            error!(asset = %asset, "开场动画资源加载失败");
            return None;
        };
        let player = engine.spawn_player(&data);
        Some(Self {
            clip_name: clip_name.into(),
            data,
            player,
            track: None,
        })
    }

    /// 实际播放的片段
    pub fn current_clip(&self) -> Option<String> {
        self.player.current_clip(0)
    }

    /// 正在播放的片段时长
    pub fn clip_duration(&self) -> Option<f32> {
        self.track.as_ref().map(|track| track.clip_duration())
    }
}

impl Presentation for SkeletonPresentation {
    fn name(&self) -> &str {
        &self.clip_name
    }

    fn begin(&mut self, signal: CompletionSignal) -> bool {
        let mut track = self.player.set_animation(0, &self.clip_name, false);

        if track.is_none() {
            warn!(clip = %self.clip_name, "找不到动画，尝试使用第一个可用动画");
            let fallback = self
                .data
                .first_clip()
                .filter(|first| *first != self.clip_name)
                .map(str::to_string);
            match fallback {
                Some(first) => {
                    debug!(clip = %first, "播放第一个动画");
                    track = self.player.set_animation(0, &first, false);
                }
                None if self.data.clip_count() == 0 => {
                    error!(asset = %self.data.asset(), "没有找到任何动画");
                    return false;
                }
                None => {}
            }
        }

        // 资源中有片段但播放失败：不强制完成，交给备用计时器
        let Some(mut track) = track else {
            warn!(clip = %self.clip_name, "动画播放失败，等待备用计时器");
            return true;
        };

        debug!(duration = track.clip_duration(), "动画时长");
        let native = signal.clone();
        track.on_complete(Box::new(move || {
            native.fire();
        }));
        self.track = Some(track);
        true
    }
}
