//! 录制器
//!
//! 两个状态：`Idle` 和 `Recording`。
//!
//! - 录制期间由控制器在每次实际发送指令后调用 [`Recorder::append`]，
//!   每条记录的时长在下一条追加时回填
//! - `play`/`play_reverse`/`save`/`open` 只在 `Idle` 下执行；录制中调用是静默空操作，不是错误
//! - 回放直接写设备，不经过控制器的去重

use crate::cancel::{CancelToken, Cancelled};
use roboarm_protocol::Command;
use roboarm_tools::{MoveLogEntry, ProgramError, ProgramLog};
use roboarm_usb::{ArmTransport, TransportError};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// 录制器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecorderMode {
    #[default]
    Idle,
    Recording,
}

impl RecorderMode {
    pub fn is_recording(self) -> bool {
        self == Self::Recording
    }
}

/// 回放结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// 全部步骤执行完毕
    Completed { steps_sent: usize },
    /// 被取消；返回前已发送全零指令
    Cancelled { steps_sent: usize },
    /// 录制中，未执行
    Skipped,
}

impl PlaybackOutcome {
    /// 已发送的步数（不含收尾的全零指令）
    pub fn steps_sent(&self) -> usize {
        match self {
            Self::Completed { steps_sent } | Self::Cancelled { steps_sent } => *steps_sent,
            Self::Skipped => 0,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// 回放方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Reverse,
}

/// 录制器
#[derive(Debug, Clone)]
pub struct Recorder {
    mode: RecorderMode,
    program: ProgramLog,
    /// 计算相邻指令间隔的基准时刻
    baseline: Instant,
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}

impl Recorder {
    pub fn new() -> Self {
        Self {
            mode: RecorderMode::Idle,
            program: ProgramLog::new(),
            baseline: Instant::now(),
        }
    }

    pub fn mode(&self) -> RecorderMode {
        self.mode
    }

    pub fn is_recording(&self) -> bool {
        self.mode.is_recording()
    }

    pub fn program(&self) -> &ProgramLog {
        &self.program
    }

    /// 步数
    pub fn num_steps(&self) -> usize {
        self.program.len()
    }

    /// 正向回放总时长
    pub fn runtime(&self) -> Duration {
        self.program.runtime()
    }

    /// 开始录制（重置计时基准）
    ///
    /// 已有程序保留，新记录接在后面。
    pub fn start_record(&mut self) {
        self.baseline = Instant::now();
        self.mode = RecorderMode::Recording;
        info!("Recording started ({} existing steps)", self.program.len());
    }

    /// 停止录制，追加结束哨兵
    ///
    /// 哨兵无条件追加，保证任何回放都以停止指令结束。
    pub fn stop_record(&mut self) {
        self.baseline = Instant::now();
        self.mode = RecorderMode::Idle;
        self.program.push(MoveLogEntry::SENTINEL);
        info!(
            "Recording stopped: {} steps, runtime {:.3}s",
            self.program.len(),
            self.program.runtime().as_secs_f64()
        );
    }

    /// 丢弃全部程序，回到 `Idle`
    pub fn clear_record(&mut self) {
        self.baseline = Instant::now();
        self.mode = RecorderMode::Idle;
        self.program.clear();
        info!("Recording cleared");
    }

    /// 追加一条记录（仅录制中有效）
    pub fn append(&mut self, forward: Command, reverse: Command) {
        self.append_at(forward, reverse, Instant::now());
    }

    fn append_at(&mut self, forward: Command, reverse: Command, now: Instant) {
        if !self.is_recording() {
            return;
        }

        let elapsed = now.saturating_duration_since(self.baseline);
        self.baseline = now;
        self.program.backfill_last(elapsed);
        self.program
            .push(MoveLogEntry::new(Duration::ZERO, forward, reverse));

        debug!(
            "Recorded step {}: forward {} reverse {} (previous held {:.3}s)",
            self.program.len(),
            forward,
            reverse,
            elapsed.as_secs_f64()
        );
    }

    /// 正向回放：依次发送正向指令并等待对应时长
    pub fn play<T: ArmTransport + ?Sized>(
        &self,
        transport: &mut T,
        cancel: &CancelToken,
    ) -> Result<PlaybackOutcome, TransportError> {
        self.replay(transport, cancel, Direction::Forward)
    }

    /// 反向回放：倒序发送反向指令，最后无条件发送全零指令
    pub fn play_reverse<T: ArmTransport + ?Sized>(
        &self,
        transport: &mut T,
        cancel: &CancelToken,
    ) -> Result<PlaybackOutcome, TransportError> {
        self.replay(transport, cancel, Direction::Reverse)
    }

    fn replay<T: ArmTransport + ?Sized>(
        &self,
        transport: &mut T,
        cancel: &CancelToken,
        direction: Direction,
    ) -> Result<PlaybackOutcome, TransportError> {
        if self.is_recording() {
            debug!("Playback ignored while recording");
            return Ok(PlaybackOutcome::Skipped);
        }

        info!(
            "Playing {} steps {:?} (runtime {:.3}s)",
            self.program.len(),
            direction,
            self.program.runtime().as_secs_f64()
        );

        let steps: Box<dyn Iterator<Item = &MoveLogEntry>> = match direction {
            Direction::Forward => Box::new(self.program.iter()),
            Direction::Reverse => Box::new(self.program.iter().rev()),
        };

        let mut steps_sent = 0;
        for entry in steps {
            let command = match direction {
                Direction::Forward => entry.forward,
                Direction::Reverse => entry.reverse,
            };

            if cancel.is_cancelled() {
                return Self::abort(transport, steps_sent);
            }
            transport.write_command(&command)?;
            steps_sent += 1;

            if let Err(Cancelled) = cancel.sleep(entry.elapsed) {
                return Self::abort(transport, steps_sent);
            }
        }

        if direction == Direction::Reverse {
            transport.write_command(&Command::ZERO)?;
        }

        info!("Playback finished after {} steps", steps_sent);
        Ok(PlaybackOutcome::Completed { steps_sent })
    }

    fn abort<T: ArmTransport + ?Sized>(
        transport: &mut T,
        steps_sent: usize,
    ) -> Result<PlaybackOutcome, TransportError> {
        warn!("Playback cancelled after {} steps, stopping arm", steps_sent);
        transport.write_command(&Command::ZERO)?;
        Ok(PlaybackOutcome::Cancelled { steps_sent })
    }

    /// 保存程序（录制中为空操作）
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ProgramError> {
        if self.is_recording() {
            debug!("Save ignored while recording");
            return Ok(());
        }
        let path = path.as_ref();
        self.program.save(path)?;
        info!("Saved {} steps to {}", self.program.len(), path.display());
        Ok(())
    }

    /// 加载程序，整体替换当前程序（录制中为空操作）
    ///
    /// 任一行格式错误都会使加载失败，当前程序保持不变。
    pub fn open<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ProgramError> {
        if self.is_recording() {
            debug!("Open ignored while recording");
            return Ok(());
        }
        let path = path.as_ref();
        let program = ProgramLog::load(path)?;
        self.program = program;
        self.baseline = Instant::now();
        info!("Loaded {} steps from {}", self.program.len(), path.display());
        Ok(())
    }

    /// 直接替换程序（录制中为空操作）
    pub fn load_program(&mut self, program: ProgramLog) {
        if self.is_recording() {
            debug!("Program replacement ignored while recording");
            return;
        }
        self.program = program;
        self.baseline = Instant::now();
    }
}
