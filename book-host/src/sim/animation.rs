//! 模拟骨骼动画引擎
//!
//! 轨道按真实时间推进（过场期间游戏时间被冻结，动画仍需播放）。
//! 片段第一次播放到结尾时触发完成回调；循环片段继续播放但不再触发。

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use book_runtime::{
    AnimationEngine, AssetHandle, ClipInfo, CompletionCallback, SkeletonData, SkeletonPlayer,
    TrackHandle,
};
use tracing::{debug, trace};

struct SimAsset {
    clips: Vec<ClipInfo>,
    silent: bool,
}

#[derive(Default)]
struct EngineInner {
    assets: HashMap<String, SimAsset>,
    tracks: Vec<Weak<RefCell<SimTrack>>>,
    spawned: usize,
    live_players: usize,
}

struct SimTrack {
    clip: String,
    duration: f64,
    looping: bool,
    elapsed: f64,
    completed: bool,
    interrupted: bool,
    silent: bool,
    callbacks: Vec<CompletionCallback>,
}

/// 模拟骨骼动画引擎
#[derive(Clone, Default)]
pub struct SimAnimationEngine {
    inner: Rc<RefCell<EngineInner>>,
}

impl SimAnimationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册骨骼资源
    ///
    /// `silent` 为 `true` 时该资源的片段永远不会发出完成信号。
    pub fn register_asset(&self, id: impl Into<String>, clips: Vec<ClipInfo>, silent: bool) {
        self.inner
            .borrow_mut()
            .assets
            .insert(id.into(), SimAsset { clips, silent });
    }

    /// 推进所有轨道，返回本次触发的完成回调数
    pub fn advance(&self, dt: f64) -> usize {
        let tracks: Vec<Rc<RefCell<SimTrack>>> = {
            let mut inner = self.inner.borrow_mut();
            inner.tracks.retain(|track| track.strong_count() > 0);
            inner.tracks.iter().filter_map(Weak::upgrade).collect()
        };

        let mut ready = Vec::new();
        for track in &tracks {
            let mut track = track.borrow_mut();
            if track.interrupted {
                continue;
            }
            track.elapsed += dt;
            if !track.completed && track.elapsed >= track.duration {
                track.completed = true;
                trace!(clip = %track.clip, looping = track.looping, "片段播放到结尾");
                if !track.silent {
                    ready.append(&mut track.callbacks);
                }
            }
        }

        // 回调可能访问其他共享状态，必须在释放借用之后调用
        let fired = ready.len();
        for callback in ready {
            callback();
        }
        fired
    }

    /// 累计创建的播放实例数
    pub fn spawned_players(&self) -> usize {
        self.inner.borrow().spawned
    }

    /// 仍存活的播放实例数
    pub fn live_players(&self) -> usize {
        self.inner.borrow().live_players
    }
}

impl AnimationEngine for SimAnimationEngine {
    fn load_skeleton_asset(&mut self, asset: &AssetHandle) -> Option<SkeletonData> {
        let inner = self.inner.borrow();
        let entry = inner.assets.get(asset.id())?;
        Some(SkeletonData::new(asset.clone(), entry.clips.clone()))
    }

    fn spawn_player(&mut self, data: &SkeletonData) -> Box<dyn SkeletonPlayer> {
        let mut inner = self.inner.borrow_mut();
        inner.spawned += 1;
        inner.live_players += 1;
        let silent = inner
            .assets
            .get(data.asset().id())
            .is_some_and(|asset| asset.silent);
        debug!(asset = %data.asset(), "创建骨骼播放实例");
        Box::new(SimPlayer {
            engine: self.inner.clone(),
            data: data.clone(),
            silent,
            tracks: HashMap::new(),
        })
    }
}

struct SimPlayer {
    engine: Rc<RefCell<EngineInner>>,
    data: SkeletonData,
    silent: bool,
    tracks: HashMap<usize, Rc<RefCell<SimTrack>>>,
}

impl SkeletonPlayer for SimPlayer {
    fn set_animation(
        &mut self,
        track_index: usize,
        clip_name: &str,
        looping: bool,
    ) -> Option<Box<dyn TrackHandle>> {
        let duration = self.data.clip_duration(clip_name)?;
        let track = Rc::new(RefCell::new(SimTrack {
            clip: clip_name.to_string(),
            duration: f64::from(duration),
            looping,
            elapsed: 0.0,
            completed: false,
            interrupted: false,
            silent: self.silent,
            callbacks: Vec::new(),
        }));

        // 同一轨道上的旧片段被打断，不再发出完成信号
        if let Some(previous) = self.tracks.insert(track_index, track.clone()) {
            previous.borrow_mut().interrupted = true;
        }
        self.engine
            .borrow_mut()
            .tracks
            .push(Rc::downgrade(&track));

        Some(Box::new(SimTrackHandle { track }))
    }

    fn current_clip(&self, track_index: usize) -> Option<String> {
        self.tracks
            .get(&track_index)
            .map(|track| track.borrow().clip.clone())
    }
}

impl Drop for SimPlayer {
    fn drop(&mut self) {
        for track in self.tracks.values() {
            track.borrow_mut().interrupted = true;
        }
        let mut engine = self.engine.borrow_mut();
        engine.live_players = engine.live_players.saturating_sub(1);
    }
}

struct SimTrackHandle {
    track: Rc<RefCell<SimTrack>>,
}

impl TrackHandle for SimTrackHandle {
    fn on_complete(&mut self, callback: CompletionCallback) {
        self.track.borrow_mut().callbacks.push(callback);
    }

    fn clip_duration(&self) -> f32 {
        self.track.borrow().duration as f32
    }
}
