//! # App 模块
//!
//! 应用组合根：按配置构造模拟后端、编排器与热区控制器，并在每个调度周期驱动它们。
//!
//! 编排器与热区控制器在进程中各只有一个实例，启动时创建，运行期间不销毁。

use std::rc::Rc;

use book_runtime::{
    ClickOutcome, Clock, HotspotUnlockController, Presentation, RequestOutcome,
    SkeletonPresentation, TransitionEvent, TransitionOrchestrator, TransitionRequest,
};
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::sim::{SimAnimationEngine, SimClock, SimSceneLoader};

/// 应用状态
pub struct BookApp {
    config: AppConfig,
    clock: Rc<SimClock>,
    engine: SimAnimationEngine,
    loader: SimSceneLoader,
    orchestrator: TransitionOrchestrator,
    hotspots: HotspotUnlockController,
    history: Vec<TransitionEvent>,
}

impl BookApp {
    /// 按配置创建应用（不启动开场演出）
    pub fn new(config: AppConfig) -> Self {
        let clock = Rc::new(SimClock::new());

        let engine = SimAnimationEngine::new();
        for asset in &config.simulation.assets {
            engine.register_asset(asset.id.clone(), asset.clips.clone(), asset.silent);
        }

        let loader = SimSceneLoader::new(config.simulation.book_scene.clone());
        for scene in &config.simulation.scenes {
            loader.register_scene(scene.id.clone(), scene.load_secs);
        }

        let orchestrator = TransitionOrchestrator::new(
            config.transition.clone(),
            Box::new(engine.clone()),
            Box::new(loader.clone()),
            clock.clone(),
        );

        let hotspots = HotspotUnlockController::new(
            config.hotspots.mappings.clone(),
            config.hotspots.default_overlay.clone(),
        )
        .with_fallback_timeout(config.intro.fallback_timeout_secs);

        Self {
            config,
            clock,
            engine,
            loader,
            orchestrator,
            hotspots,
            history: Vec::new(),
        }
    }

    /// 启动：可选的配置检查 + 开场演出
    pub fn start(&mut self) {
        if self.config.debug.config_check {
            let result = self.config.diagnose();
            for diagnostic in &result.diagnostics {
                warn!("{}", diagnostic);
            }
            if result.is_empty() {
                debug!("热区配置检查通过");
            }
        }

        let presentation = self.intro_presentation();
        self.hotspots
            .start_intro(presentation, self.clock.real_time_seconds());
    }

    fn intro_presentation(&mut self) -> Option<Box<dyn Presentation>> {
        let Some(asset) = self.config.intro.asset.as_ref() else {
            info!("未配置开场演出，热区立即可用");
            return None;
        };
        let clip_name = self.config.intro.clip_name.clone();
        let presentation = SkeletonPresentation::load(&mut self.engine, asset, clip_name)?;
        Some(Box::new(presentation))
    }

    /// 推进一个调度周期，返回本周期产生的过场事件
    pub fn tick(&mut self, dt: f64) -> Vec<TransitionEvent> {
        self.clock.advance(dt);
        self.engine.advance(dt);
        self.loader.advance(dt);

        let now = self.clock.real_time_seconds();
        self.hotspots.update(now);
        self.orchestrator.update();

        let events = self.orchestrator.drain_events();
        for event in &events {
            self.on_event(event);
        }
        self.history.extend(events.iter().cloned());
        events
    }

    fn on_event(&mut self, event: &TransitionEvent) {
        match event {
            TransitionEvent::Started { scene_id } => {
                info!(scene = %scene_id, "▶ 过场开始");
            }
            TransitionEvent::OverlayDegraded { scene_id, reason } => {
                warn!(scene = %scene_id, reason = %reason, "过场动画降级");
            }
            TransitionEvent::ActivationReleased {
                scene_id,
                elapsed_secs,
            } => {
                info!(scene = %scene_id, elapsed_secs, "放行场景激活");
            }
            TransitionEvent::Ended { scene_id } => {
                info!(scene = %scene_id, "■ 过场结束");
                // 回到弹出书时重新播放翻书动画
                if *scene_id == self.config.simulation.book_scene {
                    let presentation = self.intro_presentation();
                    self.hotspots
                        .replay_intro(presentation, self.clock.real_time_seconds());
                }
            }
            TransitionEvent::Failed { scene_id, reason } => {
                error!(scene = %scene_id, reason = %reason, "过场失败");
            }
        }
    }

    /// 点击弹出书上的热区
    ///
    /// 只有弹出书是活动场景时热区才存在。
    pub fn click(&mut self, region_id: &str) -> ClickOutcome {
        if !self.on_book_scene() {
            debug!(region = %region_id, scene = %self.active_scene(), "当前不在弹出书场景");
            return ClickOutcome::NotReady;
        }
        self.hotspots
            .on_hotspot_clicked(region_id, &mut self.orchestrator)
    }

    /// 从其他场景返回弹出书
    ///
    /// 已经在弹出书场景时返回 `None`。
    pub fn return_to_book(&mut self) -> Option<RequestOutcome> {
        if self.on_book_scene() {
            debug!("已经在弹出书场景");
            return None;
        }
        let request = TransitionRequest::new(self.config.simulation.book_scene.clone());
        Some(self.orchestrator.request_transition(request))
    }

    /// 直接发起过场请求
    pub fn request(&mut self, request: TransitionRequest) -> RequestOutcome {
        self.orchestrator.request_transition(request)
    }

    pub fn active_scene(&self) -> String {
        self.loader.active_scene()
    }

    pub fn on_book_scene(&self) -> bool {
        self.active_scene() == self.config.simulation.book_scene
    }

    /// 当前真实时间（秒）
    pub fn now(&self) -> f64 {
        self.clock.real_time_seconds()
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn orchestrator(&self) -> &TransitionOrchestrator {
        &self.orchestrator
    }

    pub fn hotspots(&self) -> &HotspotUnlockController {
        &self.hotspots
    }

    pub fn hotspots_mut(&mut self) -> &mut HotspotUnlockController {
        &mut self.hotspots
    }

    pub fn engine(&self) -> &SimAnimationEngine {
        &self.engine
    }

    pub fn loader(&self) -> &SimSceneLoader {
        &self.loader
    }

    /// 所有已发生的过场事件
    pub fn history(&self) -> &[TransitionEvent] {
        &self.history
    }
}

impl std::fmt::Debug for BookApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookApp")
            .field("now", &self.now())
            .field("active_scene", &self.active_scene())
            .field("orchestrator", &self.orchestrator)
            .field("hotspots", &self.hotspots)
            .finish()
    }
}
