//! # Roboarm Tools - 共享数据结构和工具
//!
//! **依赖原则**: 只依赖 `roboarm-protocol`，避免依赖 `roboarm-driver`
//!
//! ## 包含模块
//!
//! - `program` - 录制程序格式（纯数据结构 + 文本持久化）
//! - `config` - 机械臂配置（TOML）
//! - `runtime` - 运行时长显示

pub mod config;
pub mod program;
pub mod runtime;

// 重新导出常用类型
pub use config::{ArmConfig, DeviceSettings, MotionSettings, RecorderSettings};
pub use program::{MoveLogEntry, ProgramError, ProgramLog};
pub use runtime::format_runtime;
