//! 单元测试用的协作者替身

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::backend::{
    AnimationEngine, AssetHandle, ClipInfo, Clock, CompletionCallback, LoadHandle, SceneLoader,
    SkeletonData, SkeletonPlayer, TrackHandle,
};

#[derive(Debug)]
pub struct MockClock {
    now: Cell<f64>,
    scale: Cell<f32>,
    scale_writes: Cell<usize>,
}

impl MockClock {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            now: Cell::new(0.0),
            scale: Cell::new(1.0),
            scale_writes: Cell::new(0),
        })
    }

    pub fn advance(&self, dt: f64) {
        self.now.set(self.now.get() + dt);
    }

    pub fn scale_writes(&self) -> usize {
        self.scale_writes.get()
    }
}

impl Clock for MockClock {
    fn real_time_seconds(&self) -> f64 {
        self.now.get()
    }

    fn set_time_scale(&self, scale: f32) {
        self.scale.set(scale);
        self.scale_writes.set(self.scale_writes.get() + 1);
    }

    fn time_scale(&self) -> f32 {
        self.scale.get()
    }
}

#[derive(Default)]
pub struct EngineState {
    assets: HashMap<String, Vec<ClipInfo>>,
    pub reject_tracks: bool,
    pub spawned: usize,
    pub live_players: usize,
    pub played: Vec<(String, bool)>,
    pending: Vec<CompletionCallback>,
}

#[derive(Clone, Default)]
pub struct MockEngine {
    pub state: Rc<RefCell<EngineState>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_asset(self, id: &str, clips: &[(&str, f32)]) -> Self {
        self.state.borrow_mut().assets.insert(
            id.to_string(),
            clips
                .iter()
                .map(|(name, duration)| ClipInfo::new(*name, *duration))
                .collect(),
        );
        self
    }

    /// 触发所有已注册的完成回调
    pub fn fire_completions(&self) -> usize {
        let pending = std::mem::take(&mut self.state.borrow_mut().pending);
        let count = pending.len();
        for callback in pending {
            callback();
        }
        count
    }
}

impl AnimationEngine for MockEngine {
    fn load_skeleton_asset(&mut self, asset: &AssetHandle) -> Option<SkeletonData> {
        let state = self.state.borrow();
        let clips = state.assets.get(asset.id())?;
        Some(SkeletonData::new(asset.clone(), clips.clone()))
    }

    fn spawn_player(&mut self, data: &SkeletonData) -> Box<dyn SkeletonPlayer> {
        let mut state = self.state.borrow_mut();
        state.spawned += 1;
        state.live_players += 1;
        Box::new(MockPlayer {
            engine: self.state.clone(),
            data: data.clone(),
            current: None,
        })
    }
}

struct MockPlayer {
    engine: Rc<RefCell<EngineState>>,
    data: SkeletonData,
    current: Option<String>,
}

impl SkeletonPlayer for MockPlayer {
    fn set_animation(
        &mut self,
        _track_index: usize,
        clip_name: &str,
        looping: bool,
    ) -> Option<Box<dyn TrackHandle>> {
        let duration = self.data.clip_duration(clip_name)?;
        let mut engine = self.engine.borrow_mut();
        if engine.reject_tracks {
            return None;
        }
        engine.played.push((clip_name.to_string(), looping));
        self.current = Some(clip_name.to_string());
        Some(Box::new(MockTrack {
            engine: self.engine.clone(),
            duration,
        }))
    }

    fn current_clip(&self, _track_index: usize) -> Option<String> {
        self.current.clone()
    }
}

impl Drop for MockPlayer {
    fn drop(&mut self) {
        self.engine.borrow_mut().live_players -= 1;
    }
}

struct MockTrack {
    engine: Rc<RefCell<EngineState>>,
    duration: f32,
}

impl TrackHandle for MockTrack {
    fn on_complete(&mut self, callback: CompletionCallback) {
        self.engine.borrow_mut().pending.push(callback);
    }

    fn clip_duration(&self) -> f32 {
        self.duration
    }
}

#[derive(Debug, Default)]
pub struct LoadState {
    pub progress: f32,
    pub loaded: bool,
    pub allow: bool,
}

#[derive(Default)]
pub struct LoaderState {
    scenes: HashSet<String>,
    pub begun: Vec<String>,
    pub loads: Vec<Rc<RefCell<LoadState>>>,
}

#[derive(Clone, Default)]
pub struct MockLoader {
    pub state: Rc<RefCell<LoaderState>>,
}

impl MockLoader {
    pub fn with_scenes(scenes: &[&str]) -> Self {
        let loader = Self::default();
        loader
            .state
            .borrow_mut()
            .scenes
            .extend(scenes.iter().map(|s| s.to_string()));
        loader
    }

    pub fn begun(&self) -> usize {
        self.state.borrow().begun.len()
    }

    /// 最近一次加载
    pub fn last_load(&self) -> Rc<RefCell<LoadState>> {
        self.state.borrow().loads.last().cloned().unwrap()
    }
}

impl SceneLoader for MockLoader {
    fn begin_async_load(&mut self, scene_id: &str) -> Option<Box<dyn LoadHandle>> {
        let mut state = self.state.borrow_mut();
        if !state.scenes.contains(scene_id) {
            return None;
        }
        state.begun.push(scene_id.to_string());
        let load = Rc::new(RefCell::new(LoadState {
            allow: true,
            ..LoadState::default()
        }));
        state.loads.push(load.clone());
        Some(Box::new(MockLoadHandle { load }))
    }
}

struct MockLoadHandle {
    load: Rc<RefCell<LoadState>>,
}

impl LoadHandle for MockLoadHandle {
    fn progress(&self) -> f32 {
        self.load.borrow().progress
    }

    fn is_done(&self) -> bool {
        let load = self.load.borrow();
        load.loaded && load.allow
    }

    fn allow_activation(&self) -> bool {
        self.load.borrow().allow
    }

    fn set_allow_activation(&mut self, allow: bool) {
        self.load.borrow_mut().allow = allow;
    }
}
