//! 驱动层错误类型定义

use roboarm_protocol::ProtocolError;
use roboarm_tools::ProgramError;
use roboarm_usb::TransportError;
use thiserror::Error;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 传输层错误（设备拒绝指令、超时、断开）
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// 编码错误（关节状态超出范围）
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 程序文件读写错误
    #[error("Program error: {0}")]
    Program(#[from] ProgramError),

    /// 未挂载录制器
    #[error("No recorder attached to this arm")]
    RecorderDetached,
}

impl DriverError {
    /// 是否为致命错误（设备不可用）
    pub fn is_fatal(&self) -> bool {
        matches!(self, DriverError::Transport(e) if e.is_fatal())
    }
}
