//! # State 模块
//!
//! 定义编排器与门控的显式状态，以及编排器向宿主发出的事件。
//!
//! ## 设计原则
//!
//! - 所有状态必须**显式建模**
//! - 状态转换只发生在单一协作式上下文中，不需要锁
//! - 宿主通过事件队列观察过场进度，而不是轮询内部字段

use serde::{Deserialize, Serialize};

use crate::error::TransitionError;

/// 编排器状态
///
/// ```text
/// Idle ──request_transition──► Active ──load done / failure──► Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransitionState {
    /// 空闲，可以接受新请求
    #[default]
    Idle,
    /// 过场进行中，新请求被丢弃
    Active,
}

impl TransitionState {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// 门控状态
///
/// `Waiting → Completed` 只发生一次。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GateState {
    #[default]
    Waiting,
    Completed,
}

/// 门控完成的触发来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompletionTrigger {
    /// 动画引擎的原生完成信号
    Native,
    /// 备用计时器到期
    Timeout,
    /// 外部强制完成
    Forced,
    /// 演出句柄无效，立即完成
    InvalidPresentation,
}

/// 编排器事件
///
/// 由 [`TransitionOrchestrator::drain_events`](crate::TransitionOrchestrator::drain_events) 取出。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TransitionEvent {
    /// 过场开始（已进入 Active）
    Started { scene_id: String },
    /// 过场动画降级为无动画
    OverlayDegraded { scene_id: String, reason: String },
    /// 已允许新场景激活
    ActivationReleased { scene_id: String, elapsed_secs: f64 },
    /// 过场结束（已回到 Idle）
    Ended { scene_id: String },
    /// 请求失败（已回到 Idle）
    Failed { scene_id: String, reason: String },
}

impl TransitionEvent {
    /// 事件关联的场景
    pub fn scene_id(&self) -> &str {
        match self {
            Self::Started { scene_id }
            | Self::OverlayDegraded { scene_id, .. }
            | Self::ActivationReleased { scene_id, .. }
            | Self::Ended { scene_id }
            | Self::Failed { scene_id, .. } => scene_id,
        }
    }
}

/// 过场请求的处理结果
///
/// 调用方可以忽略它；失败已经在编排器内部记录。
#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutcome {
    /// 请求被接受，过场开始
    Accepted,
    /// 已有过场进行中，请求被丢弃
    Busy,
    /// 请求被拒绝，状态保持 Idle
    Rejected(TransitionError),
}

impl RequestOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}
