//! 回放命令
//!
//! 加载程序文件并正向或反向回放；Ctrl+C 急停

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

/// 回放命令参数
#[derive(Args, Debug)]
pub struct PlayCommand {
    /// 程序文件
    pub file: PathBuf,

    /// 反向回放（撤销录制的动作）
    #[arg(short, long)]
    pub reverse: bool,

    /// 跳过确认提示
    #[arg(short, long)]
    pub yes: bool,
}

impl PlayCommand {
    /// 回放前确认
    pub fn confirm(&self, steps: usize, runtime: &str) -> Result<bool> {
        if self.yes {
            return Ok(true);
        }

        let direction = if self.reverse { "反向" } else { "正向" };
        let confirmed = inquire::Confirm::new(&format!(
            "{}回放 {} 步（时长 {}），确定要继续吗？",
            direction, steps, runtime
        ))
        .with_default(false)
        .with_help_message("回放过程中按 Ctrl+C 急停")
        .prompt()?;

        Ok(confirmed)
    }
}
