//! # xtask - 开发辅助工具
//!
//! 提供本地质量门禁与开发辅助命令。
//!
//! ## 命令
//!
//! - `check-all`: 运行 fmt、clippy、test
//! - `cov-runtime`: 运行 book-runtime 覆盖率
//! - `config-check`: 检查宿主配置文件（有效性、热区映射、资源与场景引用）

use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

use book_host::AppConfig;
use book_runtime::{DiagnosticLevel, DiagnosticResult};
use walkdir::WalkDir;

fn run(step: &str, cmd: &mut Command) -> anyhow::Result<()> {
    eprintln!("\n==> {step}");
    let status = cmd.status()?;
    if !status.success() {
        anyhow::bail!("{step} failed with {status}");
    }
    Ok(())
}

fn ensure_cargo_llvm_cov_available() -> anyhow::Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.args(["llvm-cov", "--version"]);
    match cmd.status() {
        Ok(s) if s.success() => Ok(()),
        _ => anyhow::bail!(
            "cargo llvm-cov 不可用。\n\
请先安装：\n\
  - cargo install cargo-llvm-cov\n\
  - rustup component add llvm-tools-preview\n\
然后重试。"
        ),
    }
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("xtask error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let sub = args.next().unwrap_or_else(|| "help".to_string());

    match sub.as_str() {
        "check-all" => {
            let mut fmt = Command::new("cargo");
            fmt.args(["fmt", "--all", "--", "--check"]);
            run("cargo fmt --all -- --check", &mut fmt)?;

            let mut clippy = Command::new("cargo");
            clippy.args(["clippy", "--workspace", "--all-targets"]);
            run("cargo clippy --workspace --all-targets", &mut clippy)?;

            let mut test = Command::new("cargo");
            test.args(["test", "--workspace"]);
            run("cargo test --workspace", &mut test)?;
        }
        "cov-runtime" => {
            ensure_cargo_llvm_cov_available()?;

            let mut cov = Command::new("cargo");
            cov.args(["llvm-cov", "-p", "book-runtime", "--html"]);
            run("cargo llvm-cov -p book-runtime --html", &mut cov)?;

            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        "config-check" => {
            let mut path = None;
            let mut json = false;
            for arg in args {
                match arg.as_str() {
                    "--json" => json = true,
                    _ => path = Some(arg),
                }
            }
            config_check(path.as_deref(), json)?;
        }
        "help" | "-h" | "--help" => {
            print_help();
        }
        other => anyhow::bail!("unknown xtask subcommand: {other}"),
    }

    Ok(())
}

fn print_help() {
    eprintln!(
        r#"xtask - 开发辅助工具

USAGE:
  cargo xtask <command>

COMMANDS:
  check-all       运行 fmt、clippy、test 门禁检查
  cov-runtime     运行 book-runtime 覆盖率报告
  config-check    检查宿主配置文件

CONFIG-CHECK:
  cargo xtask config-check [path] [--json]

  不带参数：检查当前目录下的 config.json
  带路径参数：检查指定文件，或目录下所有 .json 文件
  --json：以 JSON 输出诊断结果

  检查内容：
    - 配置有效性（调度频率、时长、场景注册）
    - 热区映射（空标识、重复区域、空目标场景）
    - 目标场景是否已注册
    - 过场动画资源是否存在
"#
    );
}

//=============================================================================
// config-check 命令实现
//=============================================================================

const DEFAULT_CONFIG_PATH: &str = "config.json";

/// 单个配置文件的检查结果
struct ConfigCheckResult {
    path: PathBuf,
    /// 无法读取/解析/验证时的错误
    fatal: Option<String>,
    diagnostics: DiagnosticResult,
}

impl ConfigCheckResult {
    fn error_count(&self) -> usize {
        usize::from(self.fatal.is_some()) + self.diagnostics.error_count()
    }
}

/// 执行配置检查
fn config_check(path: Option<&str>, json: bool) -> anyhow::Result<()> {
    let files = match path {
        Some(p) => {
            let path = PathBuf::from(p);
            if path.is_file() {
                vec![path]
            } else if path.is_dir() {
                collect_config_files(&path)
            } else {
                anyhow::bail!("路径不存在: {}", p);
            }
        }
        None => {
            let path = PathBuf::from(DEFAULT_CONFIG_PATH);
            if !path.exists() {
                anyhow::bail!(
                    "默认配置文件不存在: {}\n请在 workspace 根目录运行，或指定配置路径",
                    path.display()
                );
            }
            vec![path]
        }
    };

    if files.is_empty() {
        eprintln!("未找到配置文件（.json）");
        return Ok(());
    }

    let results: Vec<ConfigCheckResult> = files.iter().map(|file| check_config_file(file)).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&results_to_json(&results))?);
    } else {
        print_check_result(&results);
    }

    if results.iter().any(|result| result.error_count() > 0) {
        anyhow::bail!("配置检查发现错误");
    }

    Ok(())
}

/// 收集目录下的所有配置文件
fn collect_config_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    files
}

/// 检查单个配置文件
fn check_config_file(file: &Path) -> ConfigCheckResult {
    let mut result = ConfigCheckResult {
        path: file.to_path_buf(),
        fatal: None,
        diagnostics: DiagnosticResult::new(),
    };

    let config = match AppConfig::try_load(file) {
        Ok(config) => config,
        Err(e) => {
            result.fatal = Some(e.to_string());
            return result;
        }
    };

    if let Err(e) = config.validate() {
        result.fatal = Some(e.to_string());
    }
    result.diagnostics = config.diagnose();
    result
}

fn results_to_json(results: &[ConfigCheckResult]) -> serde_json::Value {
    let files: Vec<serde_json::Value> = results
        .iter()
        .map(|result| {
            let diagnostics: Vec<serde_json::Value> = result
                .diagnostics
                .filter_by_level(DiagnosticLevel::Info)
                .into_iter()
                .map(|diag| {
                    serde_json::json!({
                        "level": diag.level.to_string(),
                        "subject": diag.subject,
                        "message": diag.message,
                    })
                })
                .collect();
            serde_json::json!({
                "path": result.path.display().to_string(),
                "fatal": result.fatal,
                "diagnostics": diagnostics,
            })
        })
        .collect();
    serde_json::json!({ "files": files })
}

/// 输出检查结果
fn print_check_result(results: &[ConfigCheckResult]) {
    eprintln!("─────────────────────────────────────────────────────");
    eprintln!("检查完成: {} 个配置文件", results.len());
    eprintln!();

    for result in results {
        let path = result.path.display();
        if let Some(fatal) = &result.fatal {
            eprintln!("[ERROR] {}: {}", path, fatal);
        }
        for diag in &result.diagnostics.diagnostics {
            eprintln!("{} ({})", diag, path);
        }
    }

    let error_count: usize = results.iter().map(ConfigCheckResult::error_count).sum();
    let warn_count: usize = results
        .iter()
        .map(|result| result.diagnostics.warn_count())
        .sum();

    eprintln!();
    if error_count > 0 {
        eprintln!("❌ {} 个错误, {} 个警告", error_count, warn_count);
    } else if warn_count > 0 {
        eprintln!("⚠️  0 个错误, {} 个警告", warn_count);
    } else {
        eprintln!("✅ 检查通过，无错误");
    }
}
