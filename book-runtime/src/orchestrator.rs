//! # Orchestrator 模块
//!
//! 过场编排器：把过场遮罩与场景加载门控组合成一次完整的场景切换。
//!
//! ## 执行流程
//!
//! ```text
//! request_transition(request)
//!   │  1. Active 中 → 丢弃
//!   │  2. 目标为空 → 拒绝（无任何副作用）
//!   │  3. 开始加载（激活被抑制）；无法加载 → Failed，保持 Idle
//!   │  4. 进入 Active：Started 事件、冻结游戏时间、播放过场动画
//!   ▼
//! update()  每个调度周期调用一次
//!   │  5. elapsed ≥ min_display_secs 且 progress ≥ 0.9 → 放行激活
//!   │  6. 等待加载完成
//!   ▼
//! finish：隐藏遮罩、恢复时间、Ended 事件、回到 Idle
//! ```
//!
//! 编排器在整个进程中只有一个实例，由宿主在启动时构造并持有。
//! 所有调用都来自同一个协作式上下文，`Idle/Active` 状态本身就是唯一的互斥手段。

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::backend::{AnimationEngine, AssetHandle, Clock, SceneLoader};
use crate::error::TransitionError;
use crate::overlay::TransitionOverlay;
use crate::request::{OverlaySelection, TransitionRequest, clamp_secs};
use crate::scene_load::SceneLoadGate;
use crate::state::{RequestOutcome, TransitionEvent, TransitionState};

/// 接收过场请求的一方
///
/// 热区控制器只依赖这个接口，而不是具体的编排器。
pub trait TransitionSink {
    fn request_transition(&mut self, request: TransitionRequest) -> RequestOutcome;
}

/// 过场配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionConfig {
    /// 默认过场动画资源
    #[serde(default)]
    pub default_overlay: Option<AssetHandle>,

    /// 默认片段名（空字符串表示使用资源的第一个片段）
    #[serde(default)]
    pub default_clip: String,

    /// 默认是否循环播放
    #[serde(default = "default_looping")]
    pub looping: bool,

    /// 默认最小过场时间（秒）
    #[serde(default = "default_min_display_secs")]
    pub min_display_secs: f64,

    /// 过场时是否暂停游戏
    #[serde(default = "default_pause_game")]
    pub pause_game: bool,
}

fn default_looping() -> bool {
    true
}

fn default_min_display_secs() -> f64 {
    2.0
}

fn default_pause_game() -> bool {
    true
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            default_overlay: None,
            default_clip: String::new(),
            looping: default_looping(),
            min_display_secs: default_min_display_secs(),
            pause_game: default_pause_game(),
        }
    }
}

/// Active 状态下的等待阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPhase {
    /// 等待最小显示时长与加载就绪
    AwaitingActivation,
    /// 已放行激活，等待加载完成
    AwaitingLoadDone,
}

#[derive(Debug)]
struct ActiveTransition {
    scene_id: String,
    min_display_secs: f64,
    started_at: f64,
    load: SceneLoadGate,
    phase: TransitionPhase,
    /// 进入过场前的时间缩放（仅在冻结时间时记录）
    saved_time_scale: Option<f32>,
}

/// 过场编排器
pub struct TransitionOrchestrator {
    config: TransitionConfig,
    engine: Box<dyn AnimationEngine>,
    loader: Box<dyn SceneLoader>,
    clock: Rc<dyn Clock>,
    overlay: TransitionOverlay,
    active: Option<ActiveTransition>,
    events: Vec<TransitionEvent>,
    completed: usize,
}

impl TransitionOrchestrator {
    /// 创建编排器，同时创建（隐藏的）过场覆盖层
    pub fn new(
        config: TransitionConfig,
        engine: Box<dyn AnimationEngine>,
        loader: Box<dyn SceneLoader>,
        clock: Rc<dyn Clock>,
    ) -> Self {
        let mut overlay = TransitionOverlay::new();
        overlay.ensure_created();
        Self {
            config,
            engine,
            loader,
            clock,
            overlay,
            active: None,
            events: Vec::new(),
            completed: 0,
        }
    }

    /// 发起场景切换
    ///
    /// 从不 panic，也从不返回错误给调用方：失败只体现在返回值和事件里，
    /// 编排器始终保持可以接受下一个请求。
    pub fn request_transition(&mut self, request: TransitionRequest) -> RequestOutcome {
        let scene_id = request.target_scene_id();

        if let Some(active) = &self.active {
            info!(scene = %scene_id, current = %active.scene_id, "过场进行中，忽略请求");
            return RequestOutcome::Busy;
        }

        if scene_id.trim().is_empty() {
            error!("目标场景名称为空，忽略过场请求");
            return RequestOutcome::Rejected(TransitionError::EmptyTargetScene);
        }

        let load = match SceneLoadGate::begin_load(self.loader.as_mut(), scene_id) {
            Ok(load) => load,
            Err(err) => {
                error!(scene = %scene_id, error = %err, "过场请求失败");
                self.overlay.dismiss();
                self.events.push(TransitionEvent::Failed {
                    scene_id: scene_id.to_string(),
                    reason: err.to_string(),
                });
                return RequestOutcome::Rejected(err);
            }
        };

        let started_at = self.clock.real_time_seconds();
        let min_display_secs = request
            .min_display_secs()
            .unwrap_or_else(|| clamp_secs(self.config.min_display_secs));

        info!(scene = %scene_id, min_display_secs, "过场开始");
        self.events.push(TransitionEvent::Started {
            scene_id: scene_id.to_string(),
        });

        let saved_time_scale = if self.config.pause_game {
            let previous = self.clock.time_scale();
            self.clock.set_time_scale(0.0);
            Some(previous)
        } else {
            None
        };

        self.present_overlay(&request);

        self.active = Some(ActiveTransition {
            scene_id: scene_id.to_string(),
            min_display_secs,
            started_at,
            load,
            phase: TransitionPhase::AwaitingActivation,
            saved_time_scale,
        });
        RequestOutcome::Accepted
    }

    /// 播放过场动画（尽力而为，失败不影响场景加载）
    fn present_overlay(&mut self, request: &TransitionRequest) {
        let scene_id = request.target_scene_id();
        let asset = match request.overlay() {
            OverlaySelection::Default => self.config.default_overlay.clone(),
            OverlaySelection::Asset(asset) => Some(asset.clone()),
            OverlaySelection::Disabled => None,
        };
        let Some(asset) = asset else {
            debug!(scene = %scene_id, "未配置过场动画，直接切换场景");
            return;
        };

        // 默认片段只属于默认资源；指定资源时空片段名表示第一个片段
        let clip_name = if !request.clip_name().is_empty() {
            request.clip_name()
        } else if matches!(request.overlay(), OverlaySelection::Default) {
            self.config.default_clip.as_str()
        } else {
            ""
        };
        let looping = request.looping().unwrap_or(self.config.looping);

        if let Err(err) = self
            .overlay
            .present(self.engine.as_mut(), &asset, clip_name, looping)
        {
            if err.is_configuration() {
                error!(scene = %scene_id, error = %err, "过场动画配置错误，以无动画方式继续");
            } else {
                warn!(scene = %scene_id, error = %err, "过场动画不可用，以无动画方式继续");
            }
            self.events.push(TransitionEvent::OverlayDegraded {
                scene_id: scene_id.to_string(),
                reason: err.to_string(),
            });
        }
    }

    /// 推进过场（每个调度周期调用一次）
    ///
    /// # 返回
    /// - `true`: 过场仍在进行中
    /// - `false`: 过场已完成或处于空闲状态
    pub fn update(&mut self) -> bool {
        let Some(active) = self.active.as_mut() else {
            return false;
        };
        let elapsed = self.clock.real_time_seconds() - active.started_at;

        if active.phase == TransitionPhase::AwaitingActivation {
            if elapsed < active.min_display_secs || !active.load.is_ready_for_activation() {
                return true;
            }
            active.load.release();
            active.phase = TransitionPhase::AwaitingLoadDone;
            debug!(scene = %active.scene_id, elapsed, "最小显示时长已满足且场景已就绪");
            self.events.push(TransitionEvent::ActivationReleased {
                scene_id: active.scene_id.clone(),
                elapsed_secs: elapsed,
            });
        }

        if !active.load.is_done() {
            return true;
        }

        self.finish(elapsed);
        false
    }

    fn finish(&mut self, elapsed: f64) {
        let Some(active) = self.active.take() else {
            return;
        };
        self.overlay.dismiss();
        if let Some(scale) = active.saved_time_scale {
            self.clock.set_time_scale(scale);
        }
        self.completed += 1;
        info!(scene = %active.scene_id, elapsed, "过场结束");
        self.events.push(TransitionEvent::Ended {
            scene_id: active.scene_id,
        });
    }

    /// 取出并清空事件队列
    pub fn drain_events(&mut self) -> Vec<TransitionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn state(&self) -> TransitionState {
        if self.active.is_some() {
            TransitionState::Active
        } else {
            TransitionState::Idle
        }
    }

    pub fn is_active(&self) -> bool {
        self.state().is_active()
    }

    /// 当前等待阶段（Idle 时为 `None`）
    pub fn phase(&self) -> Option<TransitionPhase> {
        self.active.as_ref().map(|active| active.phase)
    }

    /// 当前过场的目标场景
    pub fn target_scene(&self) -> Option<&str> {
        self.active.as_ref().map(|active| active.scene_id.as_str())
    }

    /// 当前过场的加载进度
    pub fn load_progress(&self) -> Option<f32> {
        self.active.as_ref().map(|active| active.load.progress())
    }

    pub fn overlay(&self) -> &TransitionOverlay {
        &self.overlay
    }

    pub fn config(&self) -> &TransitionConfig {
        &self.config
    }

    /// 已完成的过场次数
    pub fn completed_transitions(&self) -> usize {
        self.completed
    }
}

impl TransitionSink for TransitionOrchestrator {
    fn request_transition(&mut self, request: TransitionRequest) -> RequestOutcome {
        TransitionOrchestrator::request_transition(self, request)
    }
}

impl std::fmt::Debug for TransitionOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionOrchestrator")
            .field("state", &self.state())
            .field("active", &self.active)
            .field("overlay", &self.overlay)
            .field("completed", &self.completed)
            .finish()
    }
}
