//! 线程安全的机械臂句柄
//!
//! 关节、传输、去重基准和录制器作为一个整体放在一把锁后面，
//! 每次 `move_arm`/`play`/`play_reverse` 在整个执行期间持有锁，并发调用方按到达顺序串行化。
//!
//! 锁之外有两样东西：
//! - 取消令牌：`emergency_stop()` 先取消再加锁，正在等待的脉冲或回放会被立即唤醒
//! - 状态快照（ArcSwap）：每次操作后发布，显示层无锁读取，不会被回放阻塞

use crate::cancel::CancelToken;
use crate::controller::{ArmController, MoveOutcome};
use crate::error::DriverError;
use crate::hooks::{HookManager, TransmitHook};
use crate::recorder::{PlaybackOutcome, Recorder, RecorderMode};
use arc_swap::ArcSwap;
use parking_lot::{Mutex, RwLock};
use roboarm_protocol::{Command, JointKind, JointSet, JointState, JointStatus};
use roboarm_usb::ArmTransport;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// 机械臂状态快照
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArmSnapshot {
    /// 关节状态
    pub joints: JointSet,
    /// 去重基准（最后发送的指令）
    pub last_command: Command,
    /// 录制器状态，未挂载时为 None
    pub recorder_mode: Option<RecorderMode>,
    /// 程序步数
    pub num_steps: usize,
    /// 程序总时长
    pub runtime: Duration,
}

impl ArmSnapshot {
    pub(crate) fn capture<T: ArmTransport>(controller: &ArmController<T>) -> Self {
        let recorder = controller.recorder();
        Self {
            joints: controller.joints().clone(),
            last_command: controller.last_command(),
            recorder_mode: recorder.map(Recorder::mode),
            num_steps: recorder.map_or(0, Recorder::num_steps),
            runtime: recorder.map_or(Duration::ZERO, Recorder::runtime),
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recorder_mode.is_some_and(RecorderMode::is_recording)
    }

    pub fn joint_status(&self, kind: JointKind) -> JointStatus {
        self.joints.get(kind).status()
    }
}

/// 机械臂句柄
///
/// 通常用 `Arc<RoboticArm<_>>` 在线程间共享。
pub struct RoboticArm<T: ArmTransport> {
    controller: Mutex<ArmController<T>>,
    cancel: CancelToken,
    hooks: Arc<RwLock<HookManager>>,
    snapshot: ArcSwap<ArmSnapshot>,
}

impl<T: ArmTransport> RoboticArm<T> {
    /// 创建带录制器的机械臂
    pub fn new(transport: T) -> Self {
        Self::from_controller(ArmController::new(transport).with_recorder(Recorder::new()))
    }

    pub fn from_controller(controller: ArmController<T>) -> Self {
        let cancel = controller.cancel_token().clone();
        let hooks = controller.hooks().clone();
        let snapshot = ArcSwap::from_pointee(controller.snapshot());
        Self {
            controller: Mutex::new(controller),
            cancel,
            hooks,
            snapshot,
        }
    }

    /// 在锁内执行任意操作，结束后发布新快照
    pub fn with<R>(&self, f: impl FnOnce(&mut ArmController<T>) -> R) -> R {
        let mut controller = self.controller.lock();
        let result = f(&mut controller);
        self.publish(&controller);
        result
    }

    fn publish(&self, controller: &ArmController<T>) {
        self.snapshot.store(Arc::new(controller.snapshot()));
    }

    /// 最近一次操作后的状态（无锁）
    pub fn status(&self) -> Arc<ArmSnapshot> {
        self.snapshot.load_full()
    }

    /// 设置一个关节并驱动机械臂（同一把锁内完成）
    pub fn drive(
        &self,
        kind: JointKind,
        state: JointState,
        pulse: Option<f64>,
    ) -> Result<MoveOutcome, DriverError> {
        self.with(|arm| {
            arm.set_joint(kind, state);
            arm.move_arm(pulse)
        })
    }

    /// 按状态码（0 停止，1/2 两个方向）设置关节并驱动
    ///
    /// 状态码超出该关节范围时不修改关节，仍按当前状态驱动。
    pub fn drive_status(
        &self,
        kind: JointKind,
        status: u8,
        pulse: Option<f64>,
    ) -> Result<MoveOutcome, DriverError> {
        self.with(|arm| {
            arm.joint_mut(kind).apply_status(status);
            arm.move_arm(pulse)
        })
    }

    pub fn move_arm(&self, pulse: Option<f64>) -> Result<MoveOutcome, DriverError> {
        self.with(|arm| arm.move_arm(pulse))
    }

    pub fn stop(&self) -> Result<MoveOutcome, DriverError> {
        self.with(|arm| arm.stop())
    }

    /// 见 [`ArmController::resync`]
    pub fn resync(&self) {
        self.with(|arm| arm.resync())
    }

    /// 无条件发送全零指令，见 [`ArmController::halt`]
    pub fn halt(&self) -> Result<MoveOutcome, DriverError> {
        self.with(|arm| arm.halt())
    }

    /// 紧急停止
    ///
    /// 先取消正在进行的脉冲或回放（它们会自行发送全零指令并释放锁），
    /// 再加锁停止所有关节。完成后令牌重新布防。
    ///
    /// 重新布防后才拿到锁的操作不受影响；需要保证某个操作一定被打断时，
    /// 用 [`interrupt`](Self::interrupt) 并在该操作返回后再 [`CancelToken::reset`]。
    pub fn emergency_stop(&self) -> Result<MoveOutcome, DriverError> {
        let result = self.interrupt();
        self.cancel.reset();
        result
    }

    /// 取消并停止，令牌保持取消状态
    ///
    /// 之后排队的脉冲和回放都会立即结束，直到调用方重置令牌。
    pub fn interrupt(&self) -> Result<MoveOutcome, DriverError> {
        warn!("Emergency stop requested");
        self.cancel.cancel();
        self.stop()
    }

    pub fn start_record(&self) -> Result<(), DriverError> {
        self.with(|arm| arm.start_record())
    }

    pub fn stop_record(&self) -> Result<(), DriverError> {
        self.with(|arm| arm.stop_record())
    }

    pub fn clear_record(&self) -> Result<(), DriverError> {
        self.with(|arm| arm.clear_record())
    }

    pub fn play(&self) -> Result<PlaybackOutcome, DriverError> {
        self.with(|arm| arm.play())
    }

    pub fn play_reverse(&self) -> Result<PlaybackOutcome, DriverError> {
        self.with(|arm| arm.play_reverse())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), DriverError> {
        self.with(|arm| arm.save(path))
    }

    pub fn open<P: AsRef<Path>>(&self, path: P) -> Result<(), DriverError> {
        self.with(|arm| arm.open(path))
    }

    /// 取消令牌（锁外可用）
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// 注册发送回调（不需要机械臂锁）
    pub fn add_hook(&self, hook: Arc<dyn TransmitHook>) {
        self.hooks.write().add_hook(hook);
    }

    pub fn hooks(&self) -> Arc<RwLock<HookManager>> {
        self.hooks.clone()
    }
}
