//! # Overlay 模块
//!
//! 过场遮罩：一块跨场景存活的覆盖层，在过场期间播放一段短动画。
//!
//! ## 生命周期
//!
//! - 覆盖层在第一次使用时创建，标记为跨场景保留，之后不再销毁
//! - 每次 `present` 都会先丢弃上一次的播放实例，覆盖层上最多只有一个动画
//! - 只有动画真正开始播放后覆盖层才可见；任何降级路径都保持隐藏

use tracing::{debug, error, info, warn};

use crate::backend::{AnimationEngine, AssetHandle, SkeletonPlayer, TrackHandle};
use crate::error::OverlayError;

/// 覆盖层排序值（位于所有场景内容之上）
pub const OVERLAY_SORT_ORDER: i32 = 1000;

/// 覆盖层
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlaySurface {
    visible: bool,
    persistent: bool,
    sort_order: i32,
}

impl OverlaySurface {
    fn new() -> Self {
        Self {
            visible: false,
            persistent: true,
            sort_order: OVERLAY_SORT_ORDER,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// 是否跨场景保留
    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    pub fn sort_order(&self) -> i32 {
        self.sort_order
    }
}

/// 挂在覆盖层上的播放实例
struct OverlayPlayback {
    asset: AssetHandle,
    clip: String,
    looping: bool,
    _player: Box<dyn SkeletonPlayer>,
    track: Box<dyn TrackHandle>,
}

/// 过场遮罩
pub struct TransitionOverlay {
    surface: Option<OverlaySurface>,
    playback: Option<OverlayPlayback>,
    created_count: usize,
}

impl TransitionOverlay {
    pub fn new() -> Self {
        Self {
            surface: None,
            playback: None,
            created_count: 0,
        }
    }

    /// 确保覆盖层已创建（幂等）
    pub fn ensure_created(&mut self) -> &mut OverlaySurface {
        if self.surface.is_none() {
            self.created_count += 1;
            debug!(sort_order = OVERLAY_SORT_ORDER, "创建过场覆盖层");
        }
        self.surface.get_or_insert_with(OverlaySurface::new)
    }

    /// 在覆盖层上播放过场动画
    ///
    /// 成功时返回实际播放的片段名，覆盖层变为可见。
    /// 失败时覆盖层保持隐藏，调用方应继续场景切换。
    pub fn present(
        &mut self,
        engine: &mut dyn AnimationEngine,
        asset: &AssetHandle,
        clip_name: &str,
        looping: bool,
    ) -> Result<&str, OverlayError> {
        self.ensure_created().visible = false;
        // 不叠加：先释放旧的播放实例
        self.playback = None;

        let Some(data) = engine.load_skeleton_asset(asset) else {
            warn!(asset = %asset, "过场动画资源加载失败");
            return Err(OverlayError::AssetLoadFailed {
                asset: asset.clone(),
            });
        };

        let Some(clip) = data.resolve_clip(clip_name).map(str::to_string) else {
            error!(asset = %asset, "过场动画资源不包含任何动画");
            return Err(OverlayError::NoClips {
                asset: asset.clone(),
            });
        };
        if !clip_name.is_empty() && clip != clip_name {
            warn!(requested = %clip_name, clip = %clip, "找不到指定动画，使用第一个动画");
        }

        let mut player = engine.spawn_player(&data);
        let Some(track) = player.set_animation(0, &clip, looping) else {
            warn!(clip = %clip, "过场动画播放失败");
            return Err(OverlayError::TrackRejected { clip });
        };

        info!(asset = %asset, clip = %clip, looping, "播放过场动画");
        let playback = self.playback.insert(OverlayPlayback {
            asset: asset.clone(),
            clip,
            looping,
            _player: player,
            track,
        });
        if let Some(surface) = self.surface.as_mut() {
            surface.visible = true;
        }
        Ok(playback.clip.as_str())
    }

    /// 隐藏覆盖层并释放播放实例
    pub fn dismiss(&mut self) {
        if let Some(playback) = self.playback.take() {
            debug!(asset = %playback.asset, clip = %playback.clip, "释放过场动画");
        }
        if let Some(surface) = self.surface.as_mut() {
            surface.visible = false;
        }
    }

    pub fn surface(&self) -> Option<&OverlaySurface> {
        self.surface.as_ref()
    }

    pub fn is_created(&self) -> bool {
        self.surface.is_some()
    }

    pub fn is_visible(&self) -> bool {
        self.surface.as_ref().is_some_and(OverlaySurface::is_visible)
    }

    /// 是否有过场动画正在播放
    pub fn is_active(&self) -> bool {
        self.playback.is_some()
    }

    /// 当前播放的片段
    pub fn current_clip(&self) -> Option<&str> {
        self.playback.as_ref().map(|playback| playback.clip.as_str())
    }

    /// 当前片段是否循环
    pub fn is_looping(&self) -> bool {
        self.playback.as_ref().is_some_and(|playback| playback.looping)
    }

    /// 当前片段时长
    pub fn clip_duration(&self) -> Option<f32> {
        self.playback
            .as_ref()
            .map(|playback| playback.track.clip_duration())
    }

    /// 覆盖层被创建的次数（正常情况下至多为 1）
    pub fn created_count(&self) -> usize {
        self.created_count
    }
}

impl Default for TransitionOverlay {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TransitionOverlay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionOverlay")
            .field("surface", &self.surface)
            .field("clip", &self.current_clip())
            .field("looping", &self.is_looping())
            .finish()
    }
}
