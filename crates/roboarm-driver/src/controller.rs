//! 机械臂控制器
//!
//! 持有六个关节、传输、最后发送的指令和可选的录制器，决定何时真正写设备。
//! 控制器本身不做同步；多线程访问通过 [`RoboticArm`](crate::RoboticArm) 的锁串行化。

use crate::cancel::{CancelToken, Cancelled};
use crate::error::DriverError;
use crate::hooks::{HookManager, HookedTransport};
use crate::recorder::{PlaybackOutcome, Recorder};
use parking_lot::RwLock;
use roboarm_protocol::{Command, Joint, JointKind, JointSet, JointState, encode, encode_reverse};
use roboarm_usb::ArmTransport;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// 一次 `move_arm` 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// 指令与上次相同，未发送
    Unchanged,
    /// 已发送
    Sent,
    /// 已发送，定时脉冲结束后已停止
    Pulsed,
    /// 已发送，定时脉冲被取消，已提前停止
    Interrupted,
}

impl MoveOutcome {
    /// 是否写了设备
    pub fn transmitted(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// 把脉冲参数转换为等待时长
///
/// 缺省、非正数、NaN、无穷大都表示不做定时脉冲。
pub fn pulse_duration(pulse: Option<f64>) -> Option<Duration> {
    pulse
        .filter(|secs| secs.is_finite() && *secs > 0.0)
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
}

/// 从文本解析脉冲时长（秒）
///
/// 无法解析或不是正的有限数时返回 `None`，与省略等价。
pub fn parse_pulse(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite() && *secs > 0.0)
}

/// 机械臂控制器
pub struct ArmController<T: ArmTransport> {
    joints: JointSet,
    link: HookedTransport<T>,
    /// 去重用：最后一次由 `move_arm` 决定发送的指令
    last_command: Command,
    /// 为 false 时下一次 `move_arm` 不做去重
    synced: bool,
    recorder: Option<Recorder>,
    cancel: CancelToken,
}

impl<T: ArmTransport> ArmController<T> {
    /// 创建控制器（不挂载录制器）
    pub fn new(transport: T) -> Self {
        Self::with_parts(
            transport,
            None,
            CancelToken::new(),
            Arc::new(RwLock::new(HookManager::new())),
        )
    }

    pub(crate) fn with_parts(
        transport: T,
        recorder: Option<Recorder>,
        cancel: CancelToken,
        hooks: Arc<RwLock<HookManager>>,
    ) -> Self {
        Self {
            joints: JointSet::new(),
            link: HookedTransport::new(transport, hooks),
            last_command: Command::ZERO,
            synced: true,
            recorder,
            cancel,
        }
    }

    /// 挂载录制器
    pub fn with_recorder(mut self, recorder: Recorder) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn joints(&self) -> &JointSet {
        &self.joints
    }

    pub fn joints_mut(&mut self) -> &mut JointSet {
        &mut self.joints
    }

    pub fn joint(&self, kind: JointKind) -> &Joint {
        self.joints.get(kind)
    }

    pub fn joint_mut(&mut self, kind: JointKind) -> &mut Joint {
        self.joints.get_mut(kind)
    }

    /// 设置单个关节状态（不发送）
    pub fn set_joint(&mut self, kind: JointKind, state: JointState) {
        self.joints.get_mut(kind).set_state(state);
    }

    /// 去重基准
    pub fn last_command(&self) -> Command {
        self.last_command
    }

    /// 让下一次 `move_arm` 无论去重基准如何都发送
    ///
    /// 用于刚建立的连接：设备可能还停在上一个进程留下的状态，全零基准不可信。
    /// 发送成功后恢复正常去重。
    pub fn resync(&mut self) {
        self.synced = false;
    }

    /// 去重基准是否与设备一致
    pub fn is_synced(&self) -> bool {
        self.synced
    }

    /// 设备上最后一条成功写入的指令（包含回放写入）
    pub fn last_written(&self) -> Command {
        self.link.last_written()
    }

    /// 当前关节状态对应的指令
    pub fn current_command(&self) -> Result<Command, DriverError> {
        Ok(encode(&self.joints)?)
    }

    pub fn transport(&self) -> &T {
        self.link.inner()
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn hooks(&self) -> &Arc<RwLock<HookManager>> {
        self.link.hooks()
    }

    pub fn recorder(&self) -> Option<&Recorder> {
        self.recorder.as_ref()
    }

    pub fn recorder_mut(&mut self) -> Option<&mut Recorder> {
        self.recorder.as_mut()
    }

    fn attached_recorder(&mut self) -> Result<&mut Recorder, DriverError> {
        self.recorder.as_mut().ok_or(DriverError::RecorderDetached)
    }

    /// 按当前关节状态驱动机械臂
    ///
    /// 1. 编码指令；与上次相同则直接返回（不发送、不录制）
    /// 2. 发送并更新去重基准
    /// 3. 录制中时追加正向/反向指令
    /// 4. `pulse` 为正的有限秒数时：等待后停止所有关节，无条件发送全零指令，
    ///    录制中时追加全零记录
    ///
    /// 等待可以被 [`CancelToken::cancel`] 打断，打断后仍然执行第 4 步的停止。
    /// 令牌处于取消状态时脉冲立即结束，直到调用方 [`CancelToken::reset`]。
    pub fn move_arm(&mut self, pulse: Option<f64>) -> Result<MoveOutcome, DriverError> {
        let command = encode(&self.joints)?;
        if self.synced && command == self.last_command {
            trace!("Command {} unchanged, skipping", command);
            return Ok(MoveOutcome::Unchanged);
        }

        self.link.write_command(&command)?;
        self.last_command = command;
        self.synced = true;
        debug!("Sent {}", command);

        if let Some(recorder) = self.recorder.as_mut().filter(|r| r.is_recording()) {
            let reverse = encode_reverse(&self.joints)?;
            recorder.append(command, reverse);
        }

        let Some(duration) = pulse_duration(pulse) else {
            return Ok(MoveOutcome::Sent);
        };

        let interrupted = matches!(self.cancel.sleep(duration), Err(Cancelled));
        if interrupted {
            warn!("Pulse of {:.3}s interrupted, stopping", duration.as_secs_f64());
        }

        self.joints.stop_all();
        self.link.write_command(&Command::ZERO)?;
        self.last_command = Command::ZERO;

        if let Some(recorder) = self.recorder.as_mut() {
            recorder.append(Command::ZERO, Command::ZERO);
        }

        Ok(if interrupted {
            MoveOutcome::Interrupted
        } else {
            MoveOutcome::Pulsed
        })
    }

    /// 停止所有关节并关灯（受去重约束：已停止时不发送）
    pub fn stop(&mut self) -> Result<MoveOutcome, DriverError> {
        self.joints.stop_all();
        self.move_arm(None)
    }

    /// 无条件停止：不论去重基准如何都发送全零指令
    ///
    /// 用于刚建立的连接，此时设备上的实际状态未知。录制中且指令有变化时照常录制。
    pub fn halt(&mut self) -> Result<MoveOutcome, DriverError> {
        self.joints.stop_all();
        let changed = !self.last_command.is_zero();

        self.link.write_command(&Command::ZERO)?;
        self.last_command = Command::ZERO;
        self.synced = true;

        if changed && let Some(recorder) = self.recorder.as_mut().filter(|r| r.is_recording()) {
            recorder.append(Command::ZERO, Command::ZERO);
        }
        Ok(MoveOutcome::Sent)
    }

    pub fn start_record(&mut self) -> Result<(), DriverError> {
        self.attached_recorder()?.start_record();
        Ok(())
    }

    pub fn stop_record(&mut self) -> Result<(), DriverError> {
        self.attached_recorder()?.stop_record();
        Ok(())
    }

    pub fn clear_record(&mut self) -> Result<(), DriverError> {
        self.attached_recorder()?.clear_record();
        Ok(())
    }

    /// 正向回放录制的程序
    pub fn play(&mut self) -> Result<PlaybackOutcome, DriverError> {
        self.replay(false)
    }

    /// 反向回放录制的程序
    pub fn play_reverse(&mut self) -> Result<PlaybackOutcome, DriverError> {
        self.replay(true)
    }

    fn replay(&mut self, reverse: bool) -> Result<PlaybackOutcome, DriverError> {
        let recorder = self.recorder.as_ref().ok_or(DriverError::RecorderDetached)?;

        let result = if reverse {
            recorder.play_reverse(&mut self.link, &self.cancel)
        } else {
            recorder.play(&mut self.link, &self.cancel)
        };

        // 回放绕过去重直接写设备，去重基准跟随设备上的实际指令
        self.last_command = self.link.last_written();
        let outcome = result?;
        if outcome.steps_sent() > 0 || outcome.is_cancelled() {
            self.synced = true;
        }

        if outcome.is_cancelled() {
            self.joints.stop_all();
        }
        Ok(outcome)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), DriverError> {
        let recorder = self.recorder.as_ref().ok_or(DriverError::RecorderDetached)?;
        recorder.save(path)?;
        Ok(())
    }

    pub fn open<P: AsRef<Path>>(&mut self, path: P) -> Result<(), DriverError> {
        self.attached_recorder()?.open(path)?;
        Ok(())
    }

    /// 状态快照
    pub fn snapshot(&self) -> crate::arm::ArmSnapshot {
        crate::arm::ArmSnapshot::capture(self)
    }
}
