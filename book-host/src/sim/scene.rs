//! 模拟场景加载器
//!
//! 行为与常见引擎的异步加载一致：
//!
//! - 抑制激活时，进度停在 [`ACTIVATION_READY_PROGRESS`]
//! - 加载完成且允许激活后，在下一次推进时切换活动场景，进度变为 1.0

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use book_runtime::{ACTIVATION_READY_PROGRESS, LoadHandle, SceneLoader};
use tracing::{info, warn};

#[derive(Default)]
struct LoaderInner {
    scenes: HashMap<String, f64>,
    active_scene: String,
    loads: Vec<Weak<RefCell<SimLoad>>>,
    activations: Vec<String>,
}

struct SimLoad {
    scene_id: String,
    load_secs: f64,
    elapsed: f64,
    allow_activation: bool,
    activated: bool,
}

impl SimLoad {
    fn loaded(&self) -> bool {
        self.elapsed >= self.load_secs
    }
}

/// 模拟场景加载器
#[derive(Clone, Default)]
pub struct SimSceneLoader {
    inner: Rc<RefCell<LoaderInner>>,
}

impl SimSceneLoader {
    /// 创建加载器，`active_scene` 为启动时的活动场景
    pub fn new(active_scene: impl Into<String>) -> Self {
        let loader = Self::default();
        loader.inner.borrow_mut().active_scene = active_scene.into();
        loader
    }

    /// 注册场景及其加载耗时
    pub fn register_scene(&self, scene_id: impl Into<String>, load_secs: f64) {
        self.inner
            .borrow_mut()
            .scenes
            .insert(scene_id.into(), load_secs.max(0.0));
    }

    /// 推进所有进行中的加载
    pub fn advance(&self, dt: f64) {
        let mut inner = self.inner.borrow_mut();
        inner.loads.retain(|load| load.strong_count() > 0);

        let loads: Vec<_> = inner.loads.iter().filter_map(Weak::upgrade).collect();
        for load in loads {
            let mut load = load.borrow_mut();
            if load.activated {
                continue;
            }
            load.elapsed += dt;
            if load.loaded() && load.allow_activation {
                load.activated = true;
                info!(scene = %load.scene_id, "场景已激活");
                inner.active_scene = load.scene_id.clone();
                inner.activations.push(load.scene_id.clone());
            }
        }
    }

    /// 当前活动场景
    pub fn active_scene(&self) -> String {
        self.inner.borrow().active_scene.clone()
    }

    /// 按顺序记录的场景激活历史
    pub fn activations(&self) -> Vec<String> {
        self.inner.borrow().activations.clone()
    }

    pub fn is_registered(&self, scene_id: &str) -> bool {
        self.inner.borrow().scenes.contains_key(scene_id)
    }
}

impl SceneLoader for SimSceneLoader {
    fn begin_async_load(&mut self, scene_id: &str) -> Option<Box<dyn LoadHandle>> {
        let mut inner = self.inner.borrow_mut();
        let Some(&load_secs) = inner.scenes.get(scene_id) else {
            warn!(scene = %scene_id, "场景未注册");
            return None;
        };

        let load = Rc::new(RefCell::new(SimLoad {
            scene_id: scene_id.to_string(),
            load_secs,
            elapsed: 0.0,
            allow_activation: true,
            activated: false,
        }));
        inner.loads.push(Rc::downgrade(&load));
        Some(Box::new(SimLoadHandle { load }))
    }
}

struct SimLoadHandle {
    load: Rc<RefCell<SimLoad>>,
}

impl LoadHandle for SimLoadHandle {
    fn progress(&self) -> f32 {
        let load = self.load.borrow();
        if load.activated {
            return 1.0;
        }
        let fraction = if load.load_secs > 0.0 {
            (load.elapsed / load.load_secs).min(1.0)
        } else {
            1.0
        };
        ACTIVATION_READY_PROGRESS * fraction as f32
    }

    fn is_done(&self) -> bool {
        self.load.borrow().activated
    }

    fn allow_activation(&self) -> bool {
        self.load.borrow().allow_activation
    }

    fn set_allow_activation(&mut self, allow: bool) {
        self.load.borrow_mut().allow_activation = allow;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loader() -> SimSceneLoader {
        let loader = SimSceneLoader::new("PopupBook");
        loader.register_scene("Library", 1.0);
        loader
    }

    #[test]
    fn test_unknown_scene() {
        let mut loader = loader();
        assert!(loader.begin_async_load("Atlas").is_none());
        assert!(!loader.is_registered("Atlas"));
    }

    #[test]
    fn test_suppressed_activation_holds_progress() {
        let mut loader = loader();
        let mut handle = loader.begin_async_load("Library").unwrap();
        handle.set_allow_activation(false);

        loader.advance(0.5);
        assert!((handle.progress() - 0.45).abs() < 1e-6);

        loader.advance(5.0);
        assert_eq!(handle.progress(), ACTIVATION_READY_PROGRESS);
        assert!(!handle.is_done());
        assert_eq!(loader.active_scene(), "PopupBook");

        handle.set_allow_activation(true);
        assert!(!handle.is_done());
        loader.advance(0.016);
        assert!(handle.is_done());
        assert_eq!(handle.progress(), 1.0);
        assert_eq!(loader.active_scene(), "Library");
        assert_eq!(loader.activations(), vec!["Library".to_string()]);
    }

    #[test]
    fn test_dropped_handle_stops_loading() {
        let mut loader = loader();
        let handle = loader.begin_async_load("Library").unwrap();
        drop(handle);

        loader.advance(2.0);
        assert_eq!(loader.active_scene(), "PopupBook");
    }
}
