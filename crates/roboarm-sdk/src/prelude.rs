//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use roboarm_sdk::prelude::*;
//! ```

pub use crate::driver::{
    ArmBuilder, ArmSnapshot, CancelToken, MoveOutcome, PlaybackOutcome, RecorderMode, RoboticArm,
};
pub use crate::protocol::{Command, JointKind, JointState};
pub use crate::tools::{ArmConfig, format_runtime};
pub use crate::usb::ArmTransport;

// 错误类型
pub use crate::driver::DriverError;
pub use crate::protocol::ProtocolError;
pub use crate::usb::TransportError;
