//! # Hotspot 模块
//!
//! 弹出书场景的热区控制器。
//!
//! 开场演出（翻书动画）结束前，所有热区点击都被忽略；
//! 演出结束后就绪标记被锁存，之后每次点击都转发给编排器。

use std::cell::Cell;
use std::rc::Rc;

use tracing::{debug, error, info};

use crate::backend::AssetHandle;
use crate::diagnostic::{DiagnosticResult, analyze_mappings};
use crate::error::TransitionError;
use crate::gate::{AnimationGate, DEFAULT_FALLBACK_TIMEOUT_SECS, Presentation};
use crate::orchestrator::TransitionSink;
use crate::request::{HotspotMapping, TransitionRequest};
use crate::state::{CompletionTrigger, RequestOutcome};

/// 点击处理结果
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// 开场演出尚未结束
    NotReady,
    /// 没有对应的热区
    UnknownRegion,
    /// 热区配置错误，未发起过场
    Misconfigured(TransitionError),
    /// 已转发给编排器
    Dispatched(RequestOutcome),
}

/// 热区控制器
pub struct HotspotUnlockController {
    mappings: Vec<HotspotMapping>,
    default_overlay: Option<AssetHandle>,
    intro: AnimationGate,
    ready: Rc<Cell<bool>>,
    fallback_timeout_secs: f64,
}

impl HotspotUnlockController {
    /// 创建控制器
    ///
    /// `default_overlay` 是本场景的默认过场动画，热区未单独指定时使用。
    pub fn new(mappings: Vec<HotspotMapping>, default_overlay: Option<AssetHandle>) -> Self {
        Self {
            mappings,
            default_overlay,
            intro: AnimationGate::new("intro"),
            ready: Rc::new(Cell::new(false)),
            fallback_timeout_secs: DEFAULT_FALLBACK_TIMEOUT_SECS,
        }
    }

    /// 设置开场演出的备用超时
    pub fn with_fallback_timeout(mut self, secs: f64) -> Self {
        self.fallback_timeout_secs = secs;
        self
    }

    /// 开始播放开场演出
    pub fn start_intro(&mut self, presentation: Option<Box<dyn Presentation>>, now: f64) {
        let ready = self.ready.clone();
        self.intro.start(
            presentation,
            move || {
                ready.set(true);
                info!("🎯 开场演出完成，现在可以点击各个区域了");
            },
            self.fallback_timeout_secs,
            now,
        );
    }

    /// 重新播放开场演出，就绪状态被重置
    pub fn replay_intro(&mut self, presentation: Option<Box<dyn Presentation>>, now: f64) {
        info!("重新播放开场演出");
        self.ready.set(false);
        self.start_intro(presentation, now);
    }

    /// 每个调度周期调用一次
    pub fn update(&mut self, now: f64) {
        self.intro.update(now);
    }

    /// 外部直接解锁热区
    pub fn mark_ready(&mut self) {
        if !self.intro.force_complete() && !self.ready.get() {
            info!("已从外部启用热区点击");
        }
        self.ready.set(true);
    }

    /// [`mark_ready`](Self::mark_ready) 的别名，供时间轴等外部控制器调用
    pub fn complete_externally(&mut self) {
        self.mark_ready();
    }

    pub fn is_ready(&self) -> bool {
        self.ready.get()
    }

    /// 开场演出的完成来源
    pub fn intro_trigger(&self) -> Option<CompletionTrigger> {
        self.intro.trigger()
    }

    /// 处理热区点击
    pub fn on_hotspot_clicked(
        &mut self,
        region_id: &str,
        sink: &mut dyn TransitionSink,
    ) -> ClickOutcome {
        if !self.ready.get() {
            debug!(region = %region_id, "请等待开场演出完成");
            return ClickOutcome::NotReady;
        }

        let Some(mapping) = self.mapping(region_id) else {
            debug!(region = %region_id, "点击位置没有对应的热区");
            return ClickOutcome::UnknownRegion;
        };

        if mapping.target_scene_id.trim().is_empty() {
            let err = TransitionError::EmptyHotspotTarget {
                region: mapping.region_id.clone(),
            };
            error!(region = %region_id, error = %err, "热区配置错误");
            return ClickOutcome::Misconfigured(err);
        }

        info!(region = %region_id, scene = %mapping.target_scene_id, "点击热区");
        let request = self.build_request(mapping);
        ClickOutcome::Dispatched(sink.request_transition(request))
    }

    /// 解析热区对应的过场请求
    ///
    /// 过场动画优先级：热区覆盖 → 场景默认 → 无动画直接切换。
    fn build_request(&self, mapping: &HotspotMapping) -> TransitionRequest {
        let request = TransitionRequest::new(mapping.target_scene_id.clone());
        let overlay = mapping
            .overlay_asset
            .as_ref()
            .or(self.default_overlay.as_ref());

        match overlay {
            Some(asset) => {
                let request = request.with_overlay(asset.clone());
                if mapping.clip_name.is_empty() {
                    request
                } else {
                    request.with_clip(mapping.clip_name.clone())
                }
            }
            None => request.without_overlay().with_min_display_secs(0.0),
        }
    }

    pub fn mapping(&self, region_id: &str) -> Option<&HotspotMapping> {
        self.mappings.iter().find(|m| m.region_id == region_id)
    }

    pub fn mappings(&self) -> &[HotspotMapping] {
        &self.mappings
    }

    /// 检查热区映射配置
    pub fn check_mappings(&self) -> DiagnosticResult {
        analyze_mappings(&self.mappings, self.default_overlay.as_ref())
    }
}

impl std::fmt::Debug for HotspotUnlockController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HotspotUnlockController")
            .field("ready", &self.ready.get())
            .field("intro", &self.intro)
            .field("mappings", &self.mappings.len())
            .finish()
    }
}
