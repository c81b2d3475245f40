//! One-shot 模式
//!
//! 每个命令独立执行：
//! 1. 读取配置
//! 2. 连接机械臂
//! 3. 执行操作
//! 4. 断开连接

use anyhow::{Context, Result};
use roboarm_sdk::{
    ArmBuilder, ArmConfig, ArmTransport, JointKind, JointState, MoveOutcome, PlaybackOutcome,
    ProgramLog, RoboticArm, UsbArmDevice, format_runtime,
};
use std::sync::Arc;
use tracing::info;

use super::{ctrl_c, run_interruptible};
use crate::commands::config::load_config;
use crate::commands::{LightCommand, MoveCommand, PlayCommand};

/// One-shot 模式
pub struct OneShotMode {
    config: ArmConfig,
}

impl OneShotMode {
    /// 创建新的 One-shot 模式实例（读取用户配置）
    pub fn new() -> Result<Self> {
        Ok(Self {
            config: load_config()?,
        })
    }

    /// 连接机械臂
    fn connect(&self) -> Result<Arc<RoboticArm<UsbArmDevice>>> {
        self.connect_with(ArmBuilder::from_config(&self.config))
    }

    fn connect_with(&self, builder: ArmBuilder) -> Result<Arc<RoboticArm<UsbArmDevice>>> {
        println!("⏳ 连接到机械臂...");
        let arm = builder
            .build()
            .context("无法连接机械臂，请检查 USB 连接与 vendor_id/product_id 配置")?;
        println!("✅ 已连接");
        Ok(fresh(arm))
    }

    /// 移动命令
    pub async fn move_joint(&self, args: MoveCommand) -> Result<()> {
        let state = args.target()?;
        let pulse = args.pulse(self.config.motion.default_pulse_secs);
        let kind = args.joint;

        let arm = self.connect()?;
        info!(joint = %kind, ?state, ?pulse, "One-shot move");

        let outcome = run_interruptible(
            arm,
            move |arm| arm.drive(kind, state, pulse),
            ctrl_c(),
        )
        .await?;

        match outcome {
            MoveOutcome::Unchanged | MoveOutcome::Sent => {
                println!("✅ 指令已发送");
                if pulse.is_none() && !state.is_stopped() {
                    println!("💡 提示: 关节会持续运动，使用 'roboarm-cli stop' 停止");
                }
            },
            MoveOutcome::Pulsed => println!("✅ 脉冲完成，已停止"),
            MoveOutcome::Interrupted => println!("🛑 已急停"),
        }
        Ok(())
    }

    /// 停止所有关节（无条件发送全零指令）
    pub fn stop(&self) -> Result<()> {
        let arm = self.connect()?;
        arm.halt()?;
        println!("✅ 已停止");
        Ok(())
    }

    /// 灯光
    pub fn light(&self, args: LightCommand) -> Result<()> {
        let arm = self.connect()?;
        switch_light(&arm, args.target())?;
        println!("✅ 灯光: {}", JointKind::Light.label(args.target()).unwrap_or("?"));
        Ok(())
    }

    /// 回放程序文件
    pub async fn play(&self, args: PlayCommand) -> Result<()> {
        let program = ProgramLog::load(&args.file)
            .with_context(|| format!("无法读取程序文件 {}", args.file.display()))?;
        let runtime = format_runtime(program.runtime());

        println!("📄 {}: {} 步，时长 {}", args.file.display(), program.len(), runtime);
        if !args.confirm(program.len(), &runtime)? {
            println!("❌ 操作已取消");
            return Ok(());
        }

        // 回放依赖录制器，不受配置中 recorder.enabled 影响
        let arm = self.connect_with(ArmBuilder::from_config(&self.config).recorder(true))?;
        arm.with(|controller| {
            if let Some(recorder) = controller.recorder_mut() {
                recorder.load_program(program);
            }
        });

        let reverse = args.reverse;
        let outcome = run_interruptible(
            arm,
            move |arm| if reverse { arm.play_reverse() } else { arm.play() },
            ctrl_c(),
        )
        .await?;

        match outcome {
            PlaybackOutcome::Completed { steps_sent } => {
                println!("✅ 回放完成（{} 条指令）", steps_sent)
            },
            PlaybackOutcome::Cancelled { steps_sent } => {
                println!("🛑 回放已中止（已发送 {} 条指令）", steps_sent)
            },
            PlaybackOutcome::Skipped => println!("⚠️  录制中，回放被忽略"),
        }
        Ok(())
    }
}

/// 新连接：设备可能停在上一个进程留下的状态，第一条指令不去重
fn fresh<T: ArmTransport>(arm: RoboticArm<T>) -> Arc<RoboticArm<T>> {
    arm.resync();
    Arc::new(arm)
}

fn switch_light<T: ArmTransport>(arm: &RoboticArm<T>, state: JointState) -> Result<MoveOutcome> {
    Ok(arm.drive(JointKind::Light, state, None)?)
}
