//! # Book Host
//!
//! 弹出书场景的无窗口宿主。
//!
//! ## 模块结构
//!
//! - [`config`]：`config.json` 配置
//! - [`sim`]：模拟时钟、骨骼动画引擎与场景加载器
//! - [`app`]：应用组合根，每个调度周期驱动一次运行时
//! - [`scenario`]：按计划执行点击并汇总结果

pub mod app;
pub mod config;
pub mod scenario;
pub mod sim;

pub use app::BookApp;
pub use config::{AppConfig, ConfigError, LogLevel};
pub use scenario::{
    ClickRecord, ClickResult, RETURN_REGION, ScenarioError, ScenarioReport, ScheduledClick,
    parse_max_seconds, run_scenario,
};
pub use sim::{SimAnimationEngine, SimClock, SimSceneLoader};
