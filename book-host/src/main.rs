//! # Book Host
//!
//! 无窗口运行弹出书场景：按配置构造模拟后端，执行命令行指定的点击，输出过场汇总。
//!
//! ## 用法
//!
//! ```bash
//! cargo run -p book-host
//! cargo run -p book-host -- --click library
//! cargo run -p book-host -- --click gym --click back --click shop@12
//! cargo run -p book-host -- --config config.json --max-seconds 60 --verbose
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use book_host::{
    AppConfig, BookApp, ScenarioReport, ScheduledClick, parse_max_seconds, run_scenario,
};
use clap::Parser;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "book-host")]
#[command(about = "弹出书场景模拟器 - 无窗口执行点击并输出过场汇总")]
#[command(version)]
struct Cli {
    /// 配置文件（默认：config.json）
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// 要执行的点击，格式 REGION[@SECS]，可重复；`back` 表示返回弹出书
    #[arg(long = "click", value_name = "REGION[@SECS]")]
    clicks: Vec<ScheduledClick>,

    /// 最长运行时间（秒）
    #[arg(long, default_value = "30", value_parser = parse_max_seconds)]
    max_seconds: f64,

    /// 输出调试日志（覆盖配置文件中的日志级别）
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // 日志级别来自配置文件，必须先读配置再初始化日志
    let (config, load_error) = if cli.config.exists() {
        match AppConfig::try_load(&cli.config) {
            Ok(config) => (config, None),
            Err(err) => (AppConfig::default(), Some(err.to_string())),
        }
    } else {
        (
            AppConfig::default(),
            Some(format!("配置文件不存在: {}", cli.config.display())),
        )
    };

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        config.debug.log_level.to_tracing()
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .init();

    match load_error {
        Some(reason) => warn!(reason = %reason, "使用默认配置"),
        None => info!(path = %cli.config.display(), "配置文件加载成功"),
    }

    if let Err(err) = config.validate() {
        error!(error = %err, "配置无效");
        return ExitCode::FAILURE;
    }

    let mut app = BookApp::new(config);
    app.start();

    let report = run_scenario(&mut app, &cli.clicks, cli.max_seconds);
    print_summary(&report);

    if report.unfired_clicks > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn print_summary(report: &ScenarioReport) {
    println!("\n📖 运行结束");
    println!("  运行时间: {:.2}s", report.elapsed_secs);
    println!("  当前场景: {}", report.final_scene);
    println!("  完成过场: {}", report.transitions_completed);
    println!("  过场事件: {}", report.events.len());
    for click in &report.clicks {
        println!(
            "  - {:>8.2}s  {}  → {:?}",
            click.fired_at, click.region_id, click.result
        );
    }
    if report.timed_out {
        println!("⚠️ 达到最长运行时间，{} 个点击未执行", report.unfired_clicks);
    }
}
