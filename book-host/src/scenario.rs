//! # Scenario 模块
//!
//! 无窗口运行一组预先安排的点击，供命令行与集成测试使用。
//!
//! 点击格式为 `REGION[@SECS]`：
//!
//! - 带时间：到达该时刻（真实时间）时点击，不管当前状态
//! - 不带时间：等到可以点击时再点（热区已解锁且没有过场进行中）
//!
//! 区域名 [`RETURN_REGION`] 表示从其他场景返回弹出书。

use std::collections::VecDeque;
use std::str::FromStr;

use book_runtime::{ClickOutcome, RequestOutcome, TransitionEvent};
use thiserror::Error;
use tracing::{info, warn};

use crate::app::BookApp;

/// 返回弹出书的特殊区域名
pub const RETURN_REGION: &str = "back";

/// 点击参数解析错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScenarioError {
    #[error("点击区域为空: '{0}'")]
    EmptyRegion(String),

    #[error("无效的点击时间 '{0}'（应为非负秒数）")]
    InvalidTime(String),

    #[error("无效的最长运行时间 '{0}'（应为非负秒数）")]
    InvalidMaxSeconds(String),
}

fn parse_secs(s: &str) -> Option<f64> {
    s.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value >= 0.0)
}

/// 解析最长运行时间（命令行 `--max-seconds`）
pub fn parse_max_seconds(s: &str) -> Result<f64, ScenarioError> {
    parse_secs(s).ok_or_else(|| ScenarioError::InvalidMaxSeconds(s.to_string()))
}

/// 一次预先安排的点击
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledClick {
    pub region_id: String,
    pub at_secs: Option<f64>,
}

impl ScheduledClick {
    pub fn new(region_id: impl Into<String>) -> Self {
        Self {
            region_id: region_id.into(),
            at_secs: None,
        }
    }

    pub fn at(region_id: impl Into<String>, secs: f64) -> Self {
        Self {
            region_id: region_id.into(),
            at_secs: Some(secs),
        }
    }

    fn is_return(&self) -> bool {
        self.region_id == RETURN_REGION
    }

    fn is_due(&self, app: &BookApp) -> bool {
        match self.at_secs {
            // 累加误差不应让点击晚一个周期
            Some(secs) => app.now() + 1e-9 >= secs,
            None if app.orchestrator().is_active() => false,
            None if self.is_return() => !app.on_book_scene(),
            None => app.on_book_scene() && app.hotspots().is_ready(),
        }
    }
}

impl FromStr for ScheduledClick {
    type Err = ScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (region, secs) = match s.split_once('@') {
            Some((region, secs)) => (region.trim(), Some(secs.trim())),
            None => (s.trim(), None),
        };

        if region.is_empty() {
            return Err(ScenarioError::EmptyRegion(s.to_string()));
        }

        let at_secs = secs
            .map(|secs| {
                parse_secs(secs).ok_or_else(|| ScenarioError::InvalidTime(secs.to_string()))
            })
            .transpose()?;

        Ok(Self {
            region_id: region.to_string(),
            at_secs,
        })
    }
}

/// 点击的处理结果
#[derive(Debug, Clone, PartialEq)]
pub enum ClickResult {
    /// 热区点击
    Hotspot(ClickOutcome),
    /// 返回弹出书（已在弹出书时为 `None`）
    Return(Option<RequestOutcome>),
}

/// 已执行的点击
#[derive(Debug, Clone, PartialEq)]
pub struct ClickRecord {
    pub region_id: String,
    pub fired_at: f64,
    pub result: ClickResult,
}

/// 场景运行报告
#[derive(Debug, Clone)]
pub struct ScenarioReport {
    pub final_scene: String,
    pub transitions_completed: usize,
    pub elapsed_secs: f64,
    pub clicks: Vec<ClickRecord>,
    pub events: Vec<TransitionEvent>,
    /// 达到最长运行时间时仍未执行的点击数
    pub unfired_clicks: usize,
    pub timed_out: bool,
}

/// 运行点击场景
///
/// 所有点击执行完毕且没有过场进行中时结束，或在 `max_secs` 时强制结束。
/// `max_secs` 不是有限的非负数时按 0 处理。
pub fn run_scenario(app: &mut BookApp, clicks: &[ScheduledClick], max_secs: f64) -> ScenarioReport {
    let max_secs = if max_secs.is_finite() && max_secs >= 0.0 {
        max_secs
    } else {
        warn!(max_secs, "无效的最长运行时间，按 0 处理");
        0.0
    };
    let dt = app.config().tick_secs();
    let mut pending: VecDeque<ScheduledClick> = clicks.iter().cloned().collect();
    let mut records = Vec::new();
    let first_event = app.history().len();
    let mut timed_out = false;

    loop {
        while pending.front().is_some_and(|click| click.is_due(app)) {
            let Some(click) = pending.pop_front() else {
                break;
            };
            records.push(fire(app, click));
        }

        if pending.is_empty() && !app.orchestrator().is_active() {
            break;
        }
        if app.now() >= max_secs {
            warn!(max_secs, pending = pending.len(), "达到最长运行时间");
            timed_out = true;
            break;
        }
        app.tick(dt);
    }

    ScenarioReport {
        final_scene: app.active_scene(),
        transitions_completed: app.orchestrator().completed_transitions(),
        elapsed_secs: app.now(),
        clicks: records,
        events: app.history()[first_event..].to_vec(),
        unfired_clicks: pending.len(),
        timed_out,
    }
}

fn fire(app: &mut BookApp, click: ScheduledClick) -> ClickRecord {
    let fired_at = app.now();
    let result = if click.is_return() {
        ClickResult::Return(app.return_to_book())
    } else {
        ClickResult::Hotspot(app.click(&click.region_id))
    };
    info!(region = %click.region_id, at = fired_at, result = ?result, "执行点击");
    ClickRecord {
        region_id: click.region_id,
        fired_at,
        result,
    }
}
