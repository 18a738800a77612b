//! # 诊断模块
//!
//! 热区映射的静态检查，不依赖 IO 或引擎。
//!
//! ## 设计原则
//!
//! - 纯函数 API，可在无 IO 环境下运行（供 `xtask config-check` 与宿主启动时使用）
//! - 诊断分级：Error（必须修复）、Warn（建议修复）、Info（信息提示）

use std::collections::HashSet;

use crate::backend::AssetHandle;
use crate::request::HotspotMapping;

/// 诊断级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticLevel {
    /// 信息提示
    Info,
    /// 警告（建议修复）
    Warn,
    /// 错误（必须修复）
    Error,
}

impl std::fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// 诊断条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 诊断级别
    pub level: DiagnosticLevel,
    /// 诊断对象（热区标识，或 `hotspots` 表示整体）
    pub subject: String,
    /// 诊断消息
    pub message: String,
}

impl Diagnostic {
    pub fn error(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Error,
            subject: subject.into(),
            message: message.into(),
        }
    }

    pub fn warn(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Warn,
            subject: subject.into(),
            message: message.into(),
        }
    }

    pub fn info(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Info,
            subject: subject.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.level, self.subject, self.message)
    }
}

/// 诊断结果
#[derive(Debug, Clone, Default)]
pub struct DiagnosticResult {
    /// 诊断条目列表
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// 合并另一个结果
    pub fn merge(&mut self, other: DiagnosticResult) {
        self.diagnostics.extend(other.diagnostics);
    }

    pub fn error_count(&self) -> usize {
        self.count(DiagnosticLevel::Error)
    }

    pub fn warn_count(&self) -> usize {
        self.count(DiagnosticLevel::Warn)
    }

    fn count(&self, level: DiagnosticLevel) -> usize {
        self.diagnostics.iter().filter(|d| d.level == level).count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// 按级别过滤
    pub fn filter_by_level(&self, min_level: DiagnosticLevel) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.level >= min_level)
            .collect()
    }
}

const ALL_HOTSPOTS: &str = "hotspots";

/// 检查热区映射表
///
/// - 没有任何映射：警告
/// - 区域标识为空 / 目标场景为空：错误
/// - 区域标识重复：错误（后出现的映射永远不会被点击到）
/// - 热区与场景都没有过场动画：信息（点击后直接切换场景）
pub fn analyze_mappings(
    mappings: &[HotspotMapping],
    default_overlay: Option<&AssetHandle>,
) -> DiagnosticResult {
    let mut result = DiagnosticResult::new();

    if mappings.is_empty() {
        result.push(Diagnostic::warn(ALL_HOTSPOTS, "没有配置任何热区映射"));
        return result;
    }

    let mut seen = HashSet::new();
    for (index, mapping) in mappings.iter().enumerate() {
        let subject = if mapping.region_id.is_empty() {
            format!("#{}", index + 1)
        } else {
            mapping.region_id.clone()
        };

        if mapping.region_id.is_empty() {
            result.push(Diagnostic::error(&subject, "区域标识为空"));
        } else if !seen.insert(mapping.region_id.as_str()) {
            result.push(Diagnostic::error(&subject, "区域标识重复"));
        }

        if mapping.target_scene_id.trim().is_empty() {
            result.push(Diagnostic::error(&subject, "目标场景名称为空"));
        }

        if mapping.overlay_asset.is_none() && default_overlay.is_none() {
            result.push(Diagnostic::info(
                &subject,
                "未设置过场动画，将直接切换场景",
            ));
        }
    }

    if default_overlay.is_none() {
        result.push(Diagnostic::warn(ALL_HOTSPOTS, "未设置默认过场动画"));
    }

    result
}

/// 检查热区目标场景是否都已注册到场景加载器
pub fn check_scene_targets(mappings: &[HotspotMapping], known_scenes: &[String]) -> DiagnosticResult {
    let known: HashSet<&str> = known_scenes.iter().map(String::as_str).collect();
    let mut result = DiagnosticResult::new();

    for mapping in mappings {
        let target = mapping.target_scene_id.as_str();
        if !target.trim().is_empty() && !known.contains(target) {
            result.push(Diagnostic::error(
                &mapping.region_id,
                format!("目标场景 '{}' 未注册", target),
            ));
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::default_book_mappings;

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::error("gym", "目标场景名称为空");
        assert_eq!(diag.to_string(), "[ERROR] gym: 目标场景名称为空");
    }

    #[test]
    fn test_default_mappings_with_overlay_are_clean() {
        let result = analyze_mappings(&default_book_mappings(), Some(&AssetHandle::new("ink")));
        assert!(result.is_empty());
    }

    #[test]
    fn test_missing_default_overlay() {
        let result = analyze_mappings(&default_book_mappings(), None);
        assert!(!result.has_errors());
        assert_eq!(result.warn_count(), 1);
        assert_eq!(result.filter_by_level(DiagnosticLevel::Info).len(), 7);
    }

    #[test]
    fn test_empty_and_duplicate_entries() {
        let mappings = vec![
            HotspotMapping::new("gym", "Gym"),
            HotspotMapping::new("gym", "Gym2"),
            HotspotMapping::new("", "Shop"),
            HotspotMapping::new("library", ""),
        ];
        let result = analyze_mappings(&mappings, Some(&AssetHandle::new("ink")));

        assert_eq!(result.error_count(), 3);
        let subjects: Vec<&str> = result
            .diagnostics
            .iter()
            .map(|d| d.subject.as_str())
            .collect();
        assert_eq!(subjects, vec!["gym", "#3", "library"]);
    }

    #[test]
    fn test_no_mappings() {
        let result = analyze_mappings(&[], None);
        assert_eq!(result.warn_count(), 1);
        assert_eq!(result.diagnostics.len(), 1);
    }

    #[test]
    fn test_check_scene_targets() {
        let known = vec!["Library".to_string(), "Gym".to_string()];
        let result = check_scene_targets(&default_book_mappings(), &known);

        // School / Shop / Restaurant / Restroom 未注册
        assert_eq!(result.error_count(), 4);
    }
}
