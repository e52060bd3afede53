// apps/nova_cli/src/main.rs

//! NovaHydro 命令行界面
//!
//! 可压缩 Euler 求解器的命令行工具：运行模拟、查看重构信息、
//! 校验配置。

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// NovaHydro 可压缩 Euler 求解器命令行工具
#[derive(Parser)]
#[command(name = "nova")]
#[command(author = "NovaHydro developers")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "NovaHydro well-balanced Euler solver", long_about = None)]
struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 运行模拟
    Run(commands::run::RunArgs),
    /// 显示网格与重构信息
    Info(commands::info::InfoArgs),
    /// 校验配置文件
    Validate(commands::validate::ValidateArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 初始化日志
    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Run(args) => commands::run::execute(args),
        Commands::Info(args) => commands::info::execute(args),
        Commands::Validate(args) => commands::validate::execute(args),
    }
}
