//! # Error 模块
//!
//! 定义 book-runtime 中使用的错误类型。
//!
//! 这些错误都在检测到它们的层级被处理：`request_transition` 从不向调用方抛出错误，
//! 只会降级（无动画过场）或放弃本次请求。

use thiserror::Error;

use crate::backend::AssetHandle;

/// 过场请求级错误（配置错误）
///
/// 出现时本次请求失败，编排器回到 `Idle`，不影响后续请求。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransitionError {
    /// 目标场景为空
    #[error("目标场景名称为空")]
    EmptyTargetScene,

    /// 热区配置的目标场景为空
    #[error("热区 '{region}' 的目标场景名称为空")]
    EmptyHotspotTarget { region: String },

    /// 场景无法加载
    #[error("场景 '{scene}' 无法加载（未注册或不存在）")]
    UnknownScene { scene: String },
}

/// 过场动画错误
///
/// 只影响视觉效果，场景切换照常进行。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OverlayError {
    /// 资源加载失败
    #[error("过场动画资源 '{asset}' 加载失败")]
    AssetLoadFailed { asset: AssetHandle },

    /// 资源内没有任何动画
    #[error("过场动画资源 '{asset}' 不包含任何动画")]
    NoClips { asset: AssetHandle },

    /// 播放器拒绝播放该片段
    #[error("过场动画 '{clip}' 播放失败")]
    TrackRejected { clip: String },
}

impl OverlayError {
    /// 是否属于配置错误（资源本身不可用）
    ///
    /// 其余情况视为临时播放错误。
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::NoClips { .. })
    }
}

/// Result 类型别名
pub type TransitionResult<T> = Result<T, TransitionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = TransitionError::UnknownScene {
            scene: "Attic".to_string(),
        };
        assert_eq!(err.to_string(), "场景 'Attic' 无法加载（未注册或不存在）");

        let err = OverlayError::NoClips {
            asset: AssetHandle::new("empty"),
        };
        assert!(err.is_configuration());
        assert!(err.to_string().contains("empty"));
    }
}
