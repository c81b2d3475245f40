//! 运行模式
//!
//! 支持两种模式：
//! - One-shot 模式：每次命令独立连接
//! - REPL 模式：交互式 Shell

pub mod oneshot;
pub mod repl;

use anyhow::Result;
use roboarm_sdk::{ArmTransport, DriverError, RoboticArm};
use std::future::Future;
use std::sync::Arc;

/// 在阻塞线程中执行机械臂操作，`interrupt` 先完成时触发急停
///
/// 急停会取消正在进行的脉冲或回放，等操作自行收尾（发送全零指令）后再返回其结果。
/// 操作返回之前令牌一直处于取消状态，急停早于操作拿到锁时操作同样立即结束。
pub async fn run_interruptible<T, R, F, I>(
    arm: Arc<RoboticArm<T>>,
    op: F,
    interrupt: I,
) -> Result<R>
where
    T: ArmTransport + Send + 'static,
    R: Send + 'static,
    F: FnOnce(&RoboticArm<T>) -> Result<R, DriverError> + Send + 'static,
    I: Future<Output = ()>,
{
    let worker = Arc::clone(&arm);
    let mut handle = tokio::task::spawn_blocking(move || op(&worker));

    tokio::select! {
        joined = &mut handle => Ok(joined??),
        _ = interrupt => {
            eprintln!("\n🛑 急停...");
            let stopper = Arc::clone(&arm);
            let stopped = tokio::task::spawn_blocking(move || stopper.interrupt()).await?;
            let joined = handle.await;
            arm.cancel_token().reset();
            let result = joined?;
            stopped?;
            Ok(result?)
        }
    }
}

/// Ctrl+C 信号（安装失败时永不触发）
pub async fn ctrl_c() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roboarm_sdk::usb::MockTransport;
    use roboarm_sdk::{ArmBuilder, Command, JointKind, JointState, MoveOutcome};
    use std::time::Duration;

    #[tokio::test]
    async fn test_completes_without_interrupt() {
        let mock = MockTransport::new();
        let arm = Arc::new(ArmBuilder::new().build_with(mock.clone()));

        let outcome = run_interruptible(
            arm,
            |arm| arm.drive(JointKind::Elbow, JointState::A, None),
            std::future::pending(),
        )
        .await
        .unwrap();

        assert_eq!(outcome, MoveOutcome::Sent);
        assert_eq!(mock.written(), vec![Command::new(16, 0, 0)]);
    }

    #[tokio::test]
    async fn test_interrupt_cuts_pulse_short() {
        let mock = MockTransport::new();
        let arm = Arc::new(ArmBuilder::new().build_with(mock.clone()));

        let outcome = run_interruptible(
            Arc::clone(&arm),
            |arm| arm.drive(JointKind::Shoulder, JointState::A, Some(60.0)),
            tokio::time::sleep(Duration::from_millis(50)),
        )
        .await
        .unwrap();

        assert_eq!(outcome, MoveOutcome::Interrupted);
        assert_eq!(mock.written(), vec![Command::new(64, 0, 0), Command::ZERO]);
        assert!(arm.status().joints.is_stopped());
        assert!(!arm.cancel_token().is_cancelled());
    }

    #[tokio::test]
    async fn test_interrupt_before_operation_takes_lock() {
        let mock = MockTransport::new();
        let arm = Arc::new(ArmBuilder::new().build_with(mock.clone()));

        let start = std::time::Instant::now();
        let outcome = run_interruptible(
            Arc::clone(&arm),
            |arm| {
                // 急停在操作开始前就已完成
                std::thread::sleep(Duration::from_millis(200));
                arm.drive(JointKind::Shoulder, JointState::A, Some(60.0))
            },
            tokio::time::sleep(Duration::from_millis(10)),
        )
        .await
        .unwrap();

        assert_eq!(outcome, MoveOutcome::Interrupted);
        assert!(start.elapsed() < Duration::from_secs(5));
        assert_eq!(mock.written(), vec![Command::new(64, 0, 0), Command::ZERO]);
        assert!(!arm.cancel_token().is_cancelled());
    }

    #[tokio::test]
    async fn test_driver_error_is_returned() {
        let mock = MockTransport::new();
        mock.fail_next_write();
        let arm = Arc::new(ArmBuilder::new().build_with(mock));

        let result = run_interruptible(
            arm,
            |arm| arm.drive(JointKind::Base, JointState::B, None),
            std::future::pending(),
        )
        .await;

        assert!(result.is_err());
    }
}
