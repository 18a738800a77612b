//! # Backend 模块
//!
//! 过场核心依赖的外部协作者接口。
//!
//! ## 设计说明
//!
//! 核心不直接持有任何渲染、动画或场景管理实现，只依赖下列 trait：
//!
//! - [`AnimationEngine`] / [`SkeletonPlayer`] / [`TrackHandle`]：骨骼动画播放
//! - [`SceneLoader`] / [`LoadHandle`]：异步场景加载
//! - [`Clock`]：真实时间与游戏时间缩放
//!
//! 所有接口都运行在同一个协作式上下文中，因此不要求 `Send`/`Sync`。

use std::fmt;

use serde::{Deserialize, Serialize};

/// 动画资源句柄
///
/// 对核心而言是不透明的标识符，具体含义由动画引擎解释。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetHandle(String);

impl AssetHandle {
    /// 创建资源句柄
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// 获取资源标识符
    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 单个动画片段的描述
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipInfo {
    /// 片段名称
    pub name: String,
    /// 片段时长（秒）
    pub duration: f32,
}

impl ClipInfo {
    pub fn new(name: impl Into<String>, duration: f32) -> Self {
        Self {
            name: name.into(),
            duration,
        }
    }
}

/// 骨骼数据
///
/// 由 [`AnimationEngine::load_skeleton_asset`] 返回，保存资源内的片段表（有序）。
#[derive(Debug, Clone, PartialEq)]
pub struct SkeletonData {
    asset: AssetHandle,
    clips: Vec<ClipInfo>,
}

impl SkeletonData {
    pub fn new(asset: AssetHandle, clips: Vec<ClipInfo>) -> Self {
        Self { asset, clips }
    }

    /// 来源资源
    pub fn asset(&self) -> &AssetHandle {
        &self.asset
    }

    /// 按定义顺序返回所有片段名
    pub fn clip_names(&self) -> impl Iterator<Item = &str> {
        self.clips.iter().map(|clip| clip.name.as_str())
    }

    /// 片段数量
    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }

    /// 第一个片段
    pub fn first_clip(&self) -> Option<&str> {
        self.clips.first().map(|clip| clip.name.as_str())
    }

    /// 是否包含指定片段
    pub fn has_clip(&self, name: &str) -> bool {
        self.clips.iter().any(|clip| clip.name == name)
    }

    /// 查询片段时长
    pub fn clip_duration(&self, name: &str) -> Option<f32> {
        self.clips
            .iter()
            .find(|clip| clip.name == name)
            .map(|clip| clip.duration)
    }

    /// 解析实际要播放的片段
    ///
    /// - `requested` 非空且存在于片段表：使用它
    /// - 否则：使用第一个片段
    /// - 片段表为空：返回 `None`
    pub fn resolve_clip(&self, requested: &str) -> Option<&str> {
        if !requested.is_empty()
            && let Some(clip) = self.clips.iter().find(|clip| clip.name == requested)
        {
            return Some(clip.name.as_str());
        }
        self.first_clip()
    }
}

/// 完成回调
pub type CompletionCallback = Box<dyn FnOnce()>;

/// 动画轨道句柄
///
/// 对应一次 `set_animation` 调用产生的播放条目。
pub trait TrackHandle {
    /// 注册完成回调（非循环片段播放结束时触发）
    fn on_complete(&mut self, callback: CompletionCallback);

    /// 片段时长（秒）
    fn clip_duration(&self) -> f32;
}

/// 骨骼动画播放实例
///
/// 实例被 drop 时即视为释放。
pub trait SkeletonPlayer {
    /// 在指定轨道上播放片段
    ///
    /// 片段不存在或播放器不可用时返回 `None`。
    fn set_animation(
        &mut self,
        track_index: usize,
        clip_name: &str,
        looping: bool,
    ) -> Option<Box<dyn TrackHandle>>;

    /// 查询轨道上当前播放的片段名
    fn current_clip(&self, track_index: usize) -> Option<String>;
}

/// 骨骼动画引擎
pub trait AnimationEngine {
    /// 加载骨骼资源，失败时返回 `None`
    fn load_skeleton_asset(&mut self, asset: &AssetHandle) -> Option<SkeletonData>;

    /// 基于骨骼数据创建新的播放实例
    fn spawn_player(&mut self, data: &SkeletonData) -> Box<dyn SkeletonPlayer>;
}

/// 异步场景加载句柄
pub trait LoadHandle {
    /// 加载进度 [0, 1]
    fn progress(&self) -> f32;

    /// 场景是否已加载并激活
    fn is_done(&self) -> bool;

    /// 是否允许激活
    fn allow_activation(&self) -> bool;

    /// 设置是否允许激活
    fn set_allow_activation(&mut self, allow: bool);
}

/// 场景加载器
pub trait SceneLoader {
    /// 开始异步加载
    ///
    /// 场景未注册或不存在时返回 `None`。
    fn begin_async_load(&mut self, scene_id: &str) -> Option<Box<dyn LoadHandle>>;
}

/// 时钟
///
/// `real_time_seconds` 是单调真实时间，不受时间缩放影响；
/// 时间缩放只影响游戏模拟（0 = 冻结，1 = 正常）。
pub trait Clock {
    fn real_time_seconds(&self) -> f64;

    fn set_time_scale(&self, scale: f32);

    fn time_scale(&self) -> f32;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book_data() -> SkeletonData {
        SkeletonData::new(
            AssetHandle::new("book"),
            vec![ClipInfo::new("open", 3.0), ClipInfo::new("idle", 1.0)],
        )
    }

    #[test]
    fn test_resolve_clip_prefers_requested() {
        let data = book_data();
        assert_eq!(data.resolve_clip("idle"), Some("idle"));
        assert_eq!(data.clip_duration("idle"), Some(1.0));
    }

    #[test]
    fn test_resolve_clip_falls_back_to_first() {
        let data = book_data();
        assert_eq!(data.resolve_clip(""), Some("open"));
        assert_eq!(data.resolve_clip("missing"), Some("open"));
    }

    #[test]
    fn test_resolve_clip_empty_table() {
        let data = SkeletonData::new(AssetHandle::new("empty"), Vec::new());
        assert_eq!(data.resolve_clip(""), None);
        assert_eq!(data.clip_count(), 0);
    }

    #[test]
    fn test_asset_handle_serializes_transparently() {
        let handle = AssetHandle::new("transition_ink");
        let json = serde_json::to_string(&handle).unwrap();
        assert_eq!(json, "\"transition_ink\"");
    }
}
