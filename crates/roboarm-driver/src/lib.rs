//! 驱动层模块
//!
//! 本模块提供 USB 机械臂的控制功能，包括：
//! - 指令去重与定时脉冲（`ArmController`）
//! - 录制、正向/反向回放、程序文件读写（`Recorder`）
//! - 单写者串行化与无锁状态读取（`RoboticArm`，ArcSwap 快照）
//! - 可取消的等待（`CancelToken`）
//! - 钩子系统：观察每条实际发出的指令
//!
//! 大多数用户应该通过 `roboarm-sdk` 使用这些类型。

mod arm;
mod builder;
pub mod cancel;
mod controller;
mod error;
pub mod hooks;
pub mod recorder;

pub use arm::{ArmSnapshot, RoboticArm};
pub use builder::ArmBuilder;
pub use cancel::{CancelToken, Cancelled};
pub use controller::{ArmController, MoveOutcome, parse_pulse, pulse_duration};
pub use error::DriverError;
pub use hooks::{ChannelHook, HookManager, SentCommand, TransmitHook};
pub use recorder::{PlaybackOutcome, Recorder, RecorderMode};
