//! # Roboarm CLI
//!
//! Command-line interface for USB robotic arm control.
//!
//! ## 双模式架构
//!
//! ### One-shot 模式（推荐用于脚本）
//!
//! ```bash
//! # 配置默认脉冲时长
//! roboarm-cli config set --pulse 0.5
//!
//! # 执行操作（内部：连接 -> 移动 -> 断开）
//! roboarm-cli move shoulder up --pulse 1.0
//! roboarm-cli play program.txt --reverse
//! ```
//!
//! ### REPL 模式（推荐用于录制）
//!
//! ```bash
//! $ roboarm-cli shell
//! roboarm> connect
//! roboarm> record
//! roboarm> shoulder up 1.0
//! roboarm> stop-record
//! roboarm> save program.txt
//! roboarm> reverse
//! roboarm> exit
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod modes;

use commands::{ConfigCommand, InfoCommand, LightCommand, MoveCommand, PlayCommand};
use modes::oneshot::OneShotMode;
use modes::repl::run_repl;

/// Roboarm CLI - USB 机械臂命令行工具
#[derive(Parser, Debug)]
#[command(name = "roboarm-cli")]
#[command(about = "Command-line interface for USB robotic arm control", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),

    /// 驱动一个关节
    Move {
        #[command(flatten)]
        args: MoveCommand,
    },

    /// 停止所有关节并关灯
    Stop,

    /// 开关灯
    Light {
        #[command(flatten)]
        args: LightCommand,
    },

    /// 回放程序文件
    Play {
        #[command(flatten)]
        args: PlayCommand,
    },

    /// 查看程序文件（不需要连接设备）
    Info {
        #[command(flatten)]
        args: InfoCommand,
    },

    /// 启动交互式 Shell（REPL 模式）
    Shell,
}

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(roboarm_sdk::DEFAULT_LOG_FILTER)),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config(cmd) => {
            // One-shot 模式：配置管理
            cmd.execute()
        },

        Commands::Move { args } => {
            let mode = OneShotMode::new()?;
            mode.move_joint(args).await
        },

        Commands::Stop => {
            let mode = OneShotMode::new()?;
            mode.stop()
        },

        Commands::Light { args } => {
            let mode = OneShotMode::new()?;
            mode.light(args)
        },

        Commands::Play { args } => {
            let mode = OneShotMode::new()?;
            mode.play(args).await
        },

        Commands::Info { args } => args.execute(),

        Commands::Shell => {
            // REPL 模式：交互式 Shell
            run_repl().await
        },
    }
}
