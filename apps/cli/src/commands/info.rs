//! 程序文件信息
//!
//! 不连接设备，只解析文件并显示步数与时长

use anyhow::Result;
use clap::Args;
use roboarm_sdk::{ProgramLog, format_runtime};
use serde::Serialize;
use std::path::PathBuf;

/// 信息命令参数
#[derive(Args, Debug)]
pub struct InfoCommand {
    /// 程序文件
    pub file: PathBuf,

    /// JSON 输出
    #[arg(long)]
    pub json: bool,

    /// 列出每一步
    #[arg(long)]
    pub steps: bool,
}

/// JSON 输出格式
#[derive(Debug, Serialize)]
struct ProgramSummary {
    file: String,
    steps: usize,
    runtime_secs: f64,
    runtime: String,
}

impl ProgramSummary {
    fn new(file: &std::path::Path, program: &ProgramLog) -> Self {
        let runtime = program.runtime();
        Self {
            file: file.display().to_string(),
            steps: program.len(),
            runtime_secs: runtime.as_secs_f64(),
            runtime: format_runtime(runtime),
        }
    }
}

impl InfoCommand {
    pub fn execute(self) -> Result<()> {
        let program = ProgramLog::load(&self.file)?;
        let summary = ProgramSummary::new(&self.file, &program);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
            return Ok(());
        }

        println!("📄 {}", summary.file);
        println!("  步数: {}", summary.steps);
        println!("  时长: {}", summary.runtime);

        if self.steps {
            println!();
            println!("  {:>4}  {:>10}  {:<12}  {:<12}", "#", "elapsed", "forward", "reverse");
            for (i, entry) in program.iter().enumerate() {
                println!(
                    "  {:>4}  {:>10.3}  {:<12}  {:<12}",
                    i + 1,
                    entry.elapsed.as_secs_f64(),
                    entry.forward.to_string(),
                    entry.reverse.to_string()
                );
            }
        }

        Ok(())
    }
}
