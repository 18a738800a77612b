//! # Book Runtime
//!
//! 弹出书场景的过场编排核心库。
//!
//! ## 架构概述
//!
//! `book-runtime` 是纯逻辑核心，不依赖任何渲染、动画或场景管理实现。
//! 外部协作者通过 [`backend`] 中的 trait 注入，宿主层每个调度周期驱动一次：
//!
//! ```text
//! Host                                   Runtime
//!   │                                       │
//!   │── click(region) ─────────────────────►│ HotspotUnlockController
//!   │                                       │   └─► TransitionOrchestrator
//!   │── update() 每帧 ─────────────────────►│        ├─ TransitionOverlay
//!   │                                       │        └─ SceneLoadGate
//!   │◄─ drain_events() ─────────────────────│
//! ```
//!
//! ## 核心类型
//!
//! - [`AnimationGate`]：等待开场演出结束（原生完成信号 + 备用计时器）
//! - [`TransitionOverlay`]：跨场景存活的过场遮罩
//! - [`SceneLoadGate`]：抑制激活的异步场景加载
//! - [`TransitionOrchestrator`]：串行化所有场景切换的编排器
//! - [`HotspotUnlockController`]：演出结束后才放行热区点击
//!
//! ## 模块结构
//!
//! - [`backend`]：外部协作者接口
//! - [`request`]：过场请求与热区映射
//! - [`state`]：状态与事件
//! - [`error`]：错误类型定义
//! - [`diagnostic`]：热区映射静态检查

pub mod backend;
pub mod diagnostic;
pub mod error;
pub mod gate;
pub mod hotspot;
pub mod orchestrator;
pub mod overlay;
pub mod request;
pub mod scene_load;
pub mod state;

#[cfg(test)]
mod testing;

// 重导出核心类型
pub use backend::{
    AnimationEngine, AssetHandle, ClipInfo, Clock, CompletionCallback, LoadHandle, SceneLoader,
    SkeletonData, SkeletonPlayer, TrackHandle,
};
pub use diagnostic::{
    Diagnostic, DiagnosticLevel, DiagnosticResult, analyze_mappings, check_scene_targets,
};
pub use error::{OverlayError, TransitionError, TransitionResult};
pub use gate::{
    AnimationGate, CompletionSignal, DEFAULT_FALLBACK_TIMEOUT_SECS, Presentation,
    SkeletonPresentation,
};
pub use hotspot::{ClickOutcome, HotspotUnlockController};
pub use orchestrator::{TransitionConfig, TransitionOrchestrator, TransitionPhase, TransitionSink};
pub use overlay::{OverlaySurface, TransitionOverlay};
pub use request::{HotspotMapping, OverlaySelection, TransitionRequest, default_book_mappings};
pub use scene_load::{ACTIVATION_READY_PROGRESS, SceneLoadGate};
pub use state::{CompletionTrigger, GateState, RequestOutcome, TransitionEvent, TransitionState};
