//! # Config 模块
//!
//! 宿主运行时配置，集中管理所有配置项。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高）
//! 2. 配置文件 (config.json)
//! 3. 默认值（最低）

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use book_runtime::{
    AssetHandle, ClipInfo, Diagnostic, DiagnosticResult, HotspotMapping, TransitionConfig,
    analyze_mappings, check_scene_targets, default_book_mappings,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 过场编排配置
    #[serde(default = "default_transition")]
    pub transition: TransitionConfig,

    /// 开场演出配置
    #[serde(default)]
    pub intro: IntroConfig,

    /// 热区配置
    #[serde(default)]
    pub hotspots: HotspotsConfig,

    /// 模拟后端配置
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// 调试配置
    #[serde(default)]
    pub debug: DebugConfig,
}

/// 开场演出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntroConfig {
    /// 翻书动画资源（为空时跳过演出，热区立即可用）
    #[serde(default = "default_intro_asset")]
    pub asset: Option<AssetHandle>,

    /// 翻书动画片段名
    #[serde(default = "default_intro_clip")]
    pub clip_name: String,

    /// 完成信号丢失时的备用超时（秒）
    #[serde(default = "default_fallback_timeout_secs")]
    pub fallback_timeout_secs: f64,
}

/// 热区配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotspotsConfig {
    /// 弹出书场景的默认过场动画
    #[serde(default = "default_scene_overlay")]
    pub default_overlay: Option<AssetHandle>,

    /// 热区映射表
    #[serde(default = "default_book_mappings")]
    pub mappings: Vec<HotspotMapping>,
}

/// 模拟后端配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// 每秒调度次数
    #[serde(default = "default_tick_rate")]
    pub tick_rate: u32,

    /// 弹出书场景（启动时的活动场景）
    #[serde(default = "default_book_scene")]
    pub book_scene: String,

    /// 已注册的场景
    #[serde(default = "default_scenes")]
    pub scenes: Vec<SceneEntry>,

    /// 可用的骨骼动画资源
    #[serde(default = "default_assets")]
    pub assets: Vec<AssetEntry>,
}

/// 已注册场景
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneEntry {
    /// 场景名称
    pub id: String,
    /// 加载耗时（秒）
    #[serde(default = "default_load_secs")]
    pub load_secs: f64,
}

impl SceneEntry {
    pub fn new(id: impl Into<String>, load_secs: f64) -> Self {
        Self {
            id: id.into(),
            load_secs,
        }
    }
}

/// 骨骼动画资源
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetEntry {
    /// 资源标识符
    pub id: String,
    /// 动画片段
    #[serde(default)]
    pub clips: Vec<ClipInfo>,
    /// 不发送完成信号（模拟丢失的原生回调）
    #[serde(default)]
    pub silent: bool,
}

impl AssetEntry {
    pub fn new(id: impl Into<String>, clips: Vec<ClipInfo>) -> Self {
        Self {
            id: id.into(),
            clips,
            silent: false,
        }
    }
}

/// 日志级别
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_tracing(self) -> tracing::Level {
        match self {
            Self::Error => tracing::Level::ERROR,
            Self::Warn => tracing::Level::WARN,
            Self::Info => tracing::Level::INFO,
            Self::Debug => tracing::Level::DEBUG,
            Self::Trace => tracing::Level::TRACE,
        }
    }
}

/// 调试配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugConfig {
    /// 日志级别
    #[serde(default)]
    pub log_level: LogLevel,

    /// 启动时是否检查热区配置
    ///
    /// 检查结果只输出诊断，不阻塞启动。
    #[serde(default = "default_config_check")]
    pub config_check: bool,
}

// 默认值函数
const DEFAULT_OVERLAY_ASSET: &str = "ink_transition";

fn default_transition() -> TransitionConfig {
    TransitionConfig {
        default_overlay: Some(AssetHandle::new(DEFAULT_OVERLAY_ASSET)),
        ..TransitionConfig::default()
    }
}

fn default_intro_asset() -> Option<AssetHandle> {
    Some(AssetHandle::new("popup_book"))
}

fn default_intro_clip() -> String {
    "book".to_string()
}

fn default_fallback_timeout_secs() -> f64 {
    book_runtime::DEFAULT_FALLBACK_TIMEOUT_SECS
}

fn default_scene_overlay() -> Option<AssetHandle> {
    Some(AssetHandle::new(DEFAULT_OVERLAY_ASSET))
}

fn default_tick_rate() -> u32 {
    60
}

fn default_book_scene() -> String {
    "PopupBook".to_string()
}

fn default_load_secs() -> f64 {
    1.0
}

fn default_scenes() -> Vec<SceneEntry> {
    vec![
        SceneEntry::new("PopupBook", 0.5),
        SceneEntry::new("School", 1.5),
        SceneEntry::new("Shop", 0.8),
        SceneEntry::new("Restaurant", 1.0),
        SceneEntry::new("Gym", 1.2),
        SceneEntry::new("Library", 1.2),
        SceneEntry::new("Restroom", 0.4),
    ]
}

fn default_assets() -> Vec<AssetEntry> {
    vec![
        AssetEntry::new("popup_book", vec![ClipInfo::new("book", 2.5)]),
        AssetEntry::new(
            DEFAULT_OVERLAY_ASSET,
            vec![ClipInfo::new("animation", 1.0), ClipInfo::new("ink", 1.5)],
        ),
    ]
}

fn default_config_check() -> bool {
    cfg!(debug_assertions)
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            transition: default_transition(),
            intro: IntroConfig::default(),
            hotspots: HotspotsConfig::default(),
            simulation: SimulationConfig::default(),
            debug: DebugConfig::default(),
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            config_check: default_config_check(),
        }
    }
}

impl Default for IntroConfig {
    fn default() -> Self {
        Self {
            asset: default_intro_asset(),
            clip_name: default_intro_clip(),
            fallback_timeout_secs: default_fallback_timeout_secs(),
        }
    }
}

impl Default for HotspotsConfig {
    fn default() -> Self {
        Self {
            default_overlay: default_scene_overlay(),
            mappings: default_book_mappings(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_rate: default_tick_rate(),
            book_scene: default_book_scene(),
            scenes: default_scenes(),
            assets: default_assets(),
        }
    }
}

impl AppConfig {
    /// 加载配置文件
    ///
    /// 如果文件不存在或解析失败，返回默认配置并输出警告。
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            warn!(path = %path.display(), "配置文件不存在，使用默认配置");
            return Self::default();
        }

        match Self::try_load(path) {
            Ok(config) => {
                info!(path = %path.display(), "配置文件加载成功");
                config
            }
            Err(err) => {
                warn!(error = %err, "使用默认配置");
                Self::default()
            }
        }
    }

    /// 加载配置文件，失败时返回错误
    pub fn try_load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// 单个调度周期的时长（秒）
    pub fn tick_secs(&self) -> f64 {
        1.0 / f64::from(self.simulation.tick_rate.max(1))
    }

    /// 已注册的场景名称
    pub fn scene_ids(&self) -> Vec<String> {
        self.simulation
            .scenes
            .iter()
            .map(|scene| scene.id.clone())
            .collect()
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.simulation.tick_rate == 0 {
            return Err(ConfigError::ValidationFailed(
                "tick_rate 必须大于 0".to_string(),
            ));
        }

        let min_display = self.transition.min_display_secs;
        if !min_display.is_finite() || min_display < 0.0 {
            return Err(ConfigError::ValidationFailed(format!(
                "最小过场时间必须是非负数: {}",
                min_display
            )));
        }

        let timeout = self.intro.fallback_timeout_secs;
        if !timeout.is_finite() || timeout <= 0.0 {
            return Err(ConfigError::ValidationFailed(format!(
                "开场演出备用超时必须大于 0: {}",
                timeout
            )));
        }

        if self.simulation.book_scene.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "必须配置 book_scene（弹出书场景名称）".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for scene in &self.simulation.scenes {
            if scene.id.trim().is_empty() {
                return Err(ConfigError::ValidationFailed(
                    "场景名称不能为空".to_string(),
                ));
            }
            if !seen.insert(scene.id.as_str()) {
                return Err(ConfigError::ValidationFailed(format!(
                    "场景重复注册: {}",
                    scene.id
                )));
            }
            if !scene.load_secs.is_finite() || scene.load_secs < 0.0 {
                return Err(ConfigError::ValidationFailed(format!(
                    "场景 '{}' 的加载耗时无效: {}",
                    scene.id, scene.load_secs
                )));
            }
        }

        if !seen.contains(self.simulation.book_scene.as_str()) {
            return Err(ConfigError::ValidationFailed(format!(
                "弹出书场景未注册: {}",
                self.simulation.book_scene
            )));
        }

        for asset in &self.simulation.assets {
            if let Some(clip) = asset
                .clips
                .iter()
                .find(|clip| !clip.duration.is_finite() || clip.duration < 0.0)
            {
                return Err(ConfigError::ValidationFailed(format!(
                    "资源 '{}' 的片段 '{}' 时长无效",
                    asset.id, clip.name
                )));
            }
        }

        Ok(())
    }

    /// 静态检查热区与资源引用
    ///
    /// 与 [`validate`](Self::validate) 不同，这里的问题不会阻止启动：
    /// 缺失的资源只会让过场以无动画方式降级。
    pub fn diagnose(&self) -> DiagnosticResult {
        let hotspots = &self.hotspots;
        let mut result = analyze_mappings(&hotspots.mappings, hotspots.default_overlay.as_ref());
        result.merge(check_scene_targets(&hotspots.mappings, &self.scene_ids()));

        let known: HashSet<&str> = self
            .simulation
            .assets
            .iter()
            .map(|asset| asset.id.as_str())
            .collect();
        let mut check_asset = |subject: &str, asset: Option<&AssetHandle>| {
            if let Some(asset) = asset.filter(|asset| !known.contains(asset.id())) {
                result.push(Diagnostic::warn(
                    subject,
                    format!("动画资源 '{}' 不存在", asset),
                ));
            }
        };

        check_asset("transition", self.transition.default_overlay.as_ref());
        check_asset("intro", self.intro.asset.as_ref());
        check_asset("hotspots", hotspots.default_overlay.as_ref());
        for mapping in &hotspots.mappings {
            check_asset(&mapping.region_id, mapping.overlay_asset.as_ref());
        }

        result
    }
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 序列化失败
    #[error("配置序列化失败: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    /// IO 错误
    #[error("配置 IO 错误: {0}")]
    IoError(#[from] std::io::Error),

    /// 验证失败
    #[error("配置验证失败: {0}")]
    ValidationFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.simulation.tick_rate, 60);
        assert_eq!(config.simulation.book_scene, "PopupBook");
        assert_eq!(config.hotspots.mappings.len(), 6);
        assert_eq!(config.intro.clip_name, "book");
        assert!(config.transition.looping);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_config_has_no_errors() {
        let result = AppConfig::default().diagnose();
        assert!(!result.has_errors(), "{:?}", result.diagnostics);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let json = r#"{
            "transition": { "min_display_secs": 3.0 },
            "simulation": { "tick_rate": 30 }
        }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.transition.min_display_secs, 3.0);
        assert!(config.transition.pause_game);
        // 节内缺省字段走 TransitionConfig 自身的默认值
        assert_eq!(config.transition.default_overlay, None);
        assert_eq!(config.simulation.tick_rate, 30);
        assert_eq!(config.simulation.scenes.len(), 7);
        assert_eq!(config.debug.log_level, LogLevel::Info);
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();

        let loaded: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.transition, config.transition);
        assert_eq!(loaded.hotspots.mappings, config.hotspots.mappings);
        assert_eq!(loaded.simulation.assets, config.simulation.assets);
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();

        config.simulation.tick_rate = 0;
        assert!(config.validate().is_err());
        config.simulation.tick_rate = 60;

        config.transition.min_display_secs = f64::NAN;
        assert!(config.validate().is_err());
        config.transition.min_display_secs = 2.0;

        config.simulation.scenes.push(SceneEntry::new("Gym", 1.0));
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::ValidationFailed(_)));
        assert!(err.to_string().contains("Gym"));
    }

    #[test]
    fn test_unregistered_book_scene() {
        let mut config = AppConfig::default();
        config.simulation.book_scene = "Atlas".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_diagnose_missing_assets_and_scenes() {
        let mut config = AppConfig::default();
        config.simulation.scenes.retain(|scene| scene.id != "Shop");
        config.hotspots.mappings[0].overlay_asset = Some(AssetHandle::new("chalk"));

        let result = config.diagnose();
        assert_eq!(result.error_count(), 1);
        assert_eq!(result.warn_count(), 1);
        assert_eq!(result.diagnostics[0].subject, "shop");
        assert_eq!(result.diagnostics[1].subject, "school");
    }

    #[test]
    fn test_log_level_mapping() {
        let level: LogLevel = serde_json::from_str(r#""debug""#).unwrap();
        assert_eq!(level.to_tracing(), tracing::Level::DEBUG);
    }
}
