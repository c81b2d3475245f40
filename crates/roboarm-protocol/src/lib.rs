//! # Roboarm Protocol
//!
//! 机械臂关节模型与 3 字节传输指令编码（无硬件依赖）
//!
//! ## 模块
//!
//! - `joint`: 关节状态、关节种类与关节集合
//! - `command`: 3 字节指令、打包字节与编码器
//!
//! ## 指令格式
//!
//! ```text
//! [packed_joint_byte, base_byte, light_byte]
//!
//! packed_joint_byte = gripper*1 + wrist*4 + elbow*16 + shoulder*64
//! ```
//!
//! 每个关节在打包字节中占用一个 4 进制位（2 bit），由于状态值永远不超过 2，
//! 各关节之间不会发生进位，打包是无损且可逆的。

pub mod command;
pub mod joint;

// 重新导出常用类型
pub use command::{Command, PackedJoints, encode, encode_reverse};
pub use joint::{Joint, JointKind, JointSet, JointState, JointStatus};

use thiserror::Error;

/// 协议层错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// 关节状态值非法（只允许 0/1/2）
    #[error("Invalid joint state: {0} (expected 0, 1 or 2)")]
    InvalidJointState(u8),

    /// 关节状态超出该关节允许的范围（例如灯光状态为 2）
    #[error("Joint {kind} cannot be encoded in state {state}")]
    StateOutOfRange { kind: JointKind, state: u8 },

    /// 打包字节中存在值为 3 的 4 进制位
    #[error("Invalid packed joint byte: 0x{0:02X}")]
    InvalidPackedByte(u8),

    /// 指令字段非法
    #[error("Invalid command field {field}: {value}")]
    InvalidCommand { field: &'static str, value: u8 },

    /// 未知的关节名称
    #[error("Unknown joint: {0}")]
    UnknownJoint(String),
}

impl From<num_enum::TryFromPrimitiveError<JointState>> for ProtocolError {
    fn from(err: num_enum::TryFromPrimitiveError<JointState>) -> Self {
        ProtocolError::InvalidJointState(err.number)
    }
}
