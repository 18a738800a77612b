//! # 过场流程集成测试
//!
//! 测试 BookApp / TransitionOrchestrator 与模拟后端组合后的完整过场。
//! 这些测试不依赖真实的渲染/动画/场景管理实现。

use std::cell::Cell;
use std::rc::Rc;

use book_host::{AppConfig, BookApp, SimAnimationEngine, SimClock, SimSceneLoader};
use book_runtime::{
    AssetHandle, ClickOutcome, ClipInfo, Clock, LoadHandle, RequestOutcome, SceneLoader,
    TransitionConfig, TransitionError, TransitionEvent, TransitionOrchestrator, TransitionRequest,
    TransitionState,
};

const DT: f64 = 0.05;

/// 进度在 1 秒内从 0 线性增长到 1，1.2 秒时加载完成
struct LinearLoader {
    clock: Rc<SimClock>,
    allow: Rc<Cell<bool>>,
}

struct LinearLoad {
    clock: Rc<SimClock>,
    started_at: f64,
    allow: Rc<Cell<bool>>,
}

impl LinearLoad {
    fn elapsed(&self) -> f64 {
        self.clock.real_time_seconds() - self.started_at
    }
}

impl SceneLoader for LinearLoader {
    fn begin_async_load(&mut self, scene_id: &str) -> Option<Box<dyn LoadHandle>> {
        if scene_id != "Library" {
            return None;
        }
        Some(Box::new(LinearLoad {
            clock: self.clock.clone(),
            started_at: self.clock.real_time_seconds(),
            allow: self.allow.clone(),
        }))
    }
}

impl LoadHandle for LinearLoad {
    fn progress(&self) -> f32 {
        self.elapsed().min(1.0) as f32
    }

    fn is_done(&self) -> bool {
        self.elapsed() >= 1.2 && self.allow.get()
    }

    fn allow_activation(&self) -> bool {
        self.allow.get()
    }

    fn set_allow_activation(&mut self, allow: bool) {
        self.allow.set(allow);
    }
}

fn overlay_engine() -> SimAnimationEngine {
    let engine = SimAnimationEngine::new();
    engine.register_asset("ink", vec![ClipInfo::new("animation", 1.0)], false);
    engine
}

fn orchestrator_config() -> TransitionConfig {
    TransitionConfig {
        default_overlay: Some(AssetHandle::new("ink")),
        ..TransitionConfig::default()
    }
}

/// 测试最小过场时间：加载早已完成，也要等满 3 秒才放行激活
#[test]
fn test_library_transition_respects_min_display() {
    let clock = Rc::new(SimClock::new());
    let allow = Rc::new(Cell::new(true));
    let engine = overlay_engine();
    let loader = LinearLoader {
        clock: clock.clone(),
        allow: allow.clone(),
    };
    let mut orchestrator = TransitionOrchestrator::new(
        orchestrator_config(),
        Box::new(engine.clone()),
        Box::new(loader),
        clock.clone(),
    );

    let request = TransitionRequest::new("Library")
        .with_min_display_secs(3.0)
        .with_looping(true);
    assert_eq!(
        orchestrator.request_transition(request),
        RequestOutcome::Accepted
    );

    // t = 0：遮罩可见，激活被抑制，游戏时间冻结
    assert!(orchestrator.overlay().is_visible());
    assert!(orchestrator.overlay().is_looping());
    assert!(!allow.get());
    assert_eq!(clock.time_scale(), 0.0);

    let mut finished_at = None;
    for _ in 0..100 {
        clock.advance(DT);
        engine.advance(DT);
        let now = clock.real_time_seconds();

        if !orchestrator.update() {
            finished_at = Some(now);
            break;
        }
        assert!(orchestrator.overlay().is_visible());
        assert!(!allow.get(), "t={now:.2} 时不应放行激活");
    }

    let finished_at = finished_at.expect("过场应该结束");
    assert!((3.0..3.0 + DT + 1e-6).contains(&finished_at));
    assert!(allow.get());
    assert_eq!(orchestrator.state(), TransitionState::Idle);
    assert!(!orchestrator.overlay().is_visible());
    assert_eq!(clock.time_scale(), 1.0);

    let events = orchestrator.drain_events();
    assert_eq!(events.len(), 3);
    assert!(matches!(
        &events[1],
        TransitionEvent::ActivationReleased { elapsed_secs, .. } if *elapsed_secs >= 3.0
    ));
}

/// 测试未注册的场景：遮罩从不显示，时间缩放不受影响
#[test]
fn test_unknown_scene_has_no_side_effects() {
    let clock = Rc::new(SimClock::new());
    let loader = SimSceneLoader::new("PopupBook");
    loader.register_scene("Library", 1.0);
    let mut orchestrator = TransitionOrchestrator::new(
        orchestrator_config(),
        Box::new(overlay_engine()),
        Box::new(loader.clone()),
        clock.clone(),
    );

    let outcome = orchestrator.request_transition(TransitionRequest::new("Atlas"));

    assert_eq!(
        outcome,
        RequestOutcome::Rejected(TransitionError::UnknownScene {
            scene: "Atlas".to_string()
        })
    );
    assert_eq!(orchestrator.state(), TransitionState::Idle);
    assert!(!orchestrator.overlay().is_visible());
    assert_eq!(clock.time_scale(), 1.0);

    let events = orchestrator.drain_events();
    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], TransitionEvent::Failed { scene_id, .. } if scene_id == "Atlas"));

    // 失败后仍可接受下一个请求
    assert_eq!(
        orchestrator.request_transition(TransitionRequest::new("Library")),
        RequestOutcome::Accepted
    );
    assert_eq!(loader.active_scene(), "PopupBook");
}

fn tick_for(app: &mut BookApp, secs: f64) {
    let dt = app.config().tick_secs();
    let ticks = (secs / dt).round() as usize;
    for _ in 0..ticks {
        app.tick(dt);
    }
}

/// 测试热区：开场演出结束前的点击被忽略，之后的点击正常转发
#[test]
fn test_hotspot_clicks_gated_by_intro() {
    let mut app = BookApp::new(AppConfig::default());
    app.start();

    tick_for(&mut app, 1.0);
    assert_eq!(app.click("library"), ClickOutcome::NotReady);
    assert!(!app.orchestrator().is_active());

    tick_for(&mut app, 2.0);
    assert!(app.hotspots().is_ready());
    assert_eq!(
        app.click("library"),
        ClickOutcome::Dispatched(RequestOutcome::Accepted)
    );

    // 过场中的第二次点击被丢弃
    assert_eq!(
        app.click("gym"),
        ClickOutcome::Dispatched(RequestOutcome::Busy)
    );

    tick_for(&mut app, 3.0);
    assert_eq!(app.active_scene(), "Library");
    assert_eq!(app.orchestrator().completed_transitions(), 1);
    let started = app
        .history()
        .iter()
        .filter(|event| matches!(event, TransitionEvent::Started { .. }))
        .count();
    assert_eq!(started, 1);
}

/// 测试过场动画资源缺失：以无动画方式完成切换
#[test]
fn test_missing_overlay_asset_degrades() {
    let mut config = AppConfig::default();
    config.simulation.assets.retain(|asset| asset.id == "popup_book");
    let mut app = BookApp::new(config);
    app.start();
    app.hotspots_mut().mark_ready();

    assert_eq!(
        app.click("school"),
        ClickOutcome::Dispatched(RequestOutcome::Accepted)
    );
    assert!(!app.orchestrator().overlay().is_visible());

    let dt = app.config().tick_secs();
    app.tick(dt);
    assert!(app.history().iter().any(|event| matches!(
        event,
        TransitionEvent::OverlayDegraded { scene_id, .. } if scene_id == "School"
    )));

    tick_for(&mut app, 3.0);
    assert_eq!(app.active_scene(), "School");
    assert_eq!(app.orchestrator().completed_transitions(), 1);
}
