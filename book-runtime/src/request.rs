//! # Request 模块
//!
//! 过场请求与热区映射的数据模型。

use serde::{Deserialize, Serialize};

use crate::backend::AssetHandle;

/// 过场动画的选择方式
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlaySelection {
    /// 使用编排器配置中的默认资源
    #[default]
    Default,
    /// 使用指定资源
    Asset(AssetHandle),
    /// 不播放过场动画，直接切换场景
    Disabled,
}

/// 过场请求
///
/// 被编排器接受后不再修改；字段只能通过构造方法设置。
/// `looping` 与 `min_display_secs` 为 `None` 时使用编排器配置的默认值。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRequest {
    target_scene_id: String,
    #[serde(default)]
    overlay: OverlaySelection,
    #[serde(default)]
    clip_name: String,
    #[serde(default)]
    looping: Option<bool>,
    #[serde(default)]
    min_display_secs: Option<f64>,
}

impl TransitionRequest {
    /// 创建指向目标场景的请求
    pub fn new(target_scene_id: impl Into<String>) -> Self {
        Self {
            target_scene_id: target_scene_id.into(),
            overlay: OverlaySelection::Default,
            clip_name: String::new(),
            looping: None,
            min_display_secs: None,
        }
    }

    pub fn with_overlay(mut self, asset: AssetHandle) -> Self {
        self.overlay = OverlaySelection::Asset(asset);
        self
    }

    /// 不播放过场动画
    pub fn without_overlay(mut self) -> Self {
        self.overlay = OverlaySelection::Disabled;
        self
    }

    pub fn with_clip(mut self, clip_name: impl Into<String>) -> Self {
        self.clip_name = clip_name.into();
        self
    }

    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = Some(looping);
        self
    }

    pub fn with_min_display_secs(mut self, secs: f64) -> Self {
        self.min_display_secs = Some(secs);
        self
    }

    pub fn target_scene_id(&self) -> &str {
        &self.target_scene_id
    }

    pub fn overlay(&self) -> &OverlaySelection {
        &self.overlay
    }

    /// 片段名（空字符串表示使用资源的第一个片段）
    pub fn clip_name(&self) -> &str {
        &self.clip_name
    }

    pub fn looping(&self) -> Option<bool> {
        self.looping
    }

    /// 最小显示时长
    ///
    /// 负数与 NaN 视为 0。
    pub fn min_display_secs(&self) -> Option<f64> {
        self.min_display_secs.map(clamp_secs)
    }
}

pub(crate) fn clamp_secs(secs: f64) -> f64 {
    if secs.is_finite() && secs > 0.0 {
        secs
    } else {
        0.0
    }
}

/// 热区映射
///
/// 场景初始化时创建，之后只读。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotspotMapping {
    /// 可点击区域标识（对应骨骼 slot 名）
    pub region_id: String,
    /// 目标场景
    pub target_scene_id: String,
    /// 热区专属过场动画（覆盖场景默认值）
    #[serde(default)]
    pub overlay_asset: Option<AssetHandle>,
    /// 热区专属片段名（空字符串表示不覆盖）
    #[serde(default)]
    pub clip_name: String,
}

impl HotspotMapping {
    pub fn new(region_id: impl Into<String>, target_scene_id: impl Into<String>) -> Self {
        Self {
            region_id: region_id.into(),
            target_scene_id: target_scene_id.into(),
            overlay_asset: None,
            clip_name: String::new(),
        }
    }

    pub fn with_overlay(mut self, asset: AssetHandle, clip_name: impl Into<String>) -> Self {
        self.overlay_asset = Some(asset);
        self.clip_name = clip_name.into();
        self
    }
}

/// 弹出书默认热区
pub fn default_book_mappings() -> Vec<HotspotMapping> {
    vec![
        HotspotMapping::new("school", "School"),
        HotspotMapping::new("shop", "Shop"),
        HotspotMapping::new("fengdi", "Restaurant"),
        HotspotMapping::new("gym", "Gym"),
        HotspotMapping::new("library", "Library"),
        HotspotMapping::new("restroom", "Restroom"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = TransitionRequest::new("Library")
            .with_overlay(AssetHandle::new("ink"))
            .with_clip("spin")
            .with_looping(true)
            .with_min_display_secs(3.0);

        assert_eq!(request.target_scene_id(), "Library");
        assert_eq!(
            request.overlay(),
            &OverlaySelection::Asset(AssetHandle::new("ink"))
        );
        assert_eq!(request.clip_name(), "spin");
        assert_eq!(request.looping(), Some(true));
        assert_eq!(request.min_display_secs(), Some(3.0));
    }

    #[test]
    fn test_min_display_is_clamped() {
        let request = TransitionRequest::new("Gym").with_min_display_secs(-1.0);
        assert_eq!(request.min_display_secs(), Some(0.0));

        let request = TransitionRequest::new("Gym").with_min_display_secs(f64::NAN);
        assert_eq!(request.min_display_secs(), Some(0.0));

        assert_eq!(TransitionRequest::new("Gym").min_display_secs(), None);
    }

    #[test]
    fn test_mapping_deserialize_defaults() {
        let json = r#"{ "region_id": "gym", "target_scene_id": "Gym" }"#;
        let mapping: HotspotMapping = serde_json::from_str(json).unwrap();
        assert_eq!(mapping, HotspotMapping::new("gym", "Gym"));
    }

    #[test]
    fn test_default_book_mappings() {
        let mappings = default_book_mappings();
        assert_eq!(mappings.len(), 6);
        assert!(
            mappings
                .iter()
                .any(|m| m.region_id == "fengdi" && m.target_scene_id == "Restaurant")
        );
    }
}
