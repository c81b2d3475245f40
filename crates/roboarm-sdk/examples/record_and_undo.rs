//! 录制并撤销
//!
//! 连接 USB 机械臂，以定时脉冲执行一段动作并录制，保存为程序文件，
//! 再反向回放把机械臂送回起点。Ctrl+C 随时急停。
//!
//! 使用方式：
//! ```bash
//! cargo run -p roboarm-sdk --example record_and_undo -- --pulse 0.5 --output demo.txt
//! ```

use clap::Parser;
use roboarm_sdk::driver::ChannelHook;
use roboarm_sdk::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "record_and_undo")]
#[command(about = "录制一段动作并反向回放")]
struct Args {
    /// 每个动作的脉冲时长（秒）
    #[arg(long, default_value = "0.5")]
    pulse: f64,

    /// 程序文件输出路径
    #[arg(long, default_value = "record_and_undo.txt")]
    output: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    roboarm_sdk::init_logger();
    let args = Args::parse();

    println!("正在连接到机械臂...");
    let arm = Arc::new(ArmBuilder::new().build()?);

    // Ctrl+C：急停（打断正在进行的脉冲或回放）
    let stopper = Arc::clone(&arm);
    ctrlc::set_handler(move || {
        println!("\n收到 Ctrl+C，急停");
        if let Err(err) = stopper.emergency_stop() {
            eprintln!("急停失败: {}", err);
        }
    })?;

    // 打印每条实际发出的指令
    let (hook, rx) = ChannelHook::new();
    arm.add_hook(Arc::new(hook));
    let printer = thread::spawn(move || {
        for sent in rx {
            println!("  -> {}", sent.command);
        }
    });

    arm.start_record()?;
    arm.drive(JointKind::Light, JointState::A, None)?;
    for (kind, state) in [
        (JointKind::Base, JointState::A),
        (JointKind::Shoulder, JointState::A),
        (JointKind::Elbow, JointState::B),
        (JointKind::Gripper, JointState::B),
    ] {
        println!("{} {}", kind, kind.label(state).unwrap_or("?"));
        arm.drive(kind, state, Some(args.pulse))?;
    }
    arm.stop_record()?;
    arm.save(&args.output)?;

    let status = arm.status();
    println!(
        "已录制 {} 步（{}），保存到 {}",
        status.num_steps,
        format_runtime(status.runtime),
        args.output.display()
    );

    println!("反向回放...");
    let outcome = arm.play_reverse()?;
    println!("回放结果: {:?}", outcome);

    arm.hooks().write().clear();
    drop(arm);
    printer.join().ok();
    Ok(())
}
