//! Roboarm SDK - USB 机械臂 Rust SDK
//!
//! 把关节指令编码为 3 字节 USB 控制传输，并支持带时间信息的录制与正向/反向回放。
//!
//! # 架构设计
//!
//! 本 SDK 采用分层架构，从底层到高层：
//!
//! - **协议层** (`protocol`): 关节模型与 3 字节指令编码
//! - **传输层** (`usb`): 传输 Trait、rusb 控制传输设备、Mock
//! - **工具层** (`tools`): 程序文件格式、配置、运行时长显示
//! - **驱动层** (`driver`): 控制器、录制器、单写者串行化
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use roboarm_sdk::prelude::*;
//!
//! roboarm_sdk::init_logger();
//! let arm = ArmBuilder::new().build()?;
//!
//! // 肩部向上运动 0.5 秒后自动停止
//! arm.drive(JointKind::Shoulder, JointState::A, Some(0.5))?;
//! # Ok::<(), DriverError>(())
//! ```

pub use roboarm_driver as driver;
pub use roboarm_protocol as protocol;
pub use roboarm_tools as tools;
pub use roboarm_usb as usb;

pub mod prelude;

// 协议层
pub use protocol::{Command, Joint, JointKind, JointSet, JointState, JointStatus, ProtocolError};

// 传输层
pub use usb::{ArmTransport, TransportError};
#[cfg(feature = "usb")]
pub use usb::UsbArmDevice;

// 驱动层
pub use driver::{
    ArmBuilder, ArmController, ArmSnapshot, CancelToken, DriverError, MoveOutcome,
    PlaybackOutcome, Recorder, RecorderMode, RoboticArm,
};

// 工具层
pub use tools::{ArmConfig, MoveLogEntry, ProgramError, ProgramLog, format_runtime};

/// 默认日志过滤：其他 crate 只输出警告，本 SDK 输出 info
pub const DEFAULT_LOG_FILTER: &str = "warn,roboarm=info";

/// 初始化日志
///
/// 安装 `tracing-subscriber` 的 fmt 输出，过滤规则取自 `RUST_LOG`，
/// 未设置时使用 [`DEFAULT_LOG_FILTER`]；同时把 `log` crate 的记录转发到 tracing。
/// 重复调用是安全的，只有第一次生效。
pub fn init_logger() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();

    if tracing::subscriber::set_global_default(subscriber).is_ok() {
        let _ = tracing_log::LogTracer::init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logger_is_idempotent() {
        init_logger();
        init_logger();
        tracing::info!("logger initialised");
    }
}
