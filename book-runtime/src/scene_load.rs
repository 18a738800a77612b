//! # SceneLoad 模块
//!
//! 包装引擎的异步场景加载：开始加载后立即抑制激活，
//! 直到编排器显式放行，新场景才会真正切换进来。

use tracing::{debug, error};

use crate::backend::{LoadHandle, SceneLoader};
use crate::error::{TransitionError, TransitionResult};

/// 加载进度达到此值即视为"可以激活"
///
/// 引擎在激活被抑制时会把进度停在这里。
pub const ACTIVATION_READY_PROGRESS: f32 = 0.9;

/// 场景加载门控
pub struct SceneLoadGate {
    scene_id: String,
    handle: Box<dyn LoadHandle>,
    released: bool,
}

impl SceneLoadGate {
    /// 开始异步加载并抑制激活
    ///
    /// 加载器无法开始加载时返回 [`TransitionError::UnknownScene`]。
    pub fn begin_load(
        loader: &mut dyn SceneLoader,
        scene_id: &str,
    ) -> TransitionResult<Self> {
        let Some(mut handle) = loader.begin_async_load(scene_id) else {
            error!(scene = %scene_id, "场景无法开始加载");
            return Err(TransitionError::UnknownScene {
                scene: scene_id.to_string(),
            });
        };
        handle.set_allow_activation(false);
        debug!(scene = %scene_id, "开始异步加载场景（激活已抑制）");

        Ok(Self {
            scene_id: scene_id.to_string(),
            handle,
            released: false,
        })
    }

    pub fn scene_id(&self) -> &str {
        &self.scene_id
    }

    /// 加载进度 [0, 1]
    pub fn progress(&self) -> f32 {
        let progress = self.handle.progress();
        if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        }
    }

    /// 是否已加载到可以激活的程度
    pub fn is_ready_for_activation(&self) -> bool {
        self.progress() >= ACTIVATION_READY_PROGRESS
    }

    /// 场景是否已激活完成
    pub fn is_done(&self) -> bool {
        self.handle.is_done()
    }

    /// 放行激活
    pub fn release(&mut self) {
        if !self.released {
            debug!(scene = %self.scene_id, progress = self.progress(), "放行场景激活");
        }
        self.released = true;
        self.handle.set_allow_activation(true);
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl std::fmt::Debug for SceneLoadGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneLoadGate")
            .field("scene_id", &self.scene_id)
            .field("progress", &self.progress())
            .field("released", &self.released)
            .field("is_done", &self.is_done())
            .finish()
    }
}
