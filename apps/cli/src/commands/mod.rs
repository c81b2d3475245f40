//! 命令定义和实现

pub mod config;
pub mod info;
pub mod light;
pub mod r#move;
pub mod play;

pub use config::ConfigCommand;
pub use info::InfoCommand;
pub use light::LightCommand;
pub use r#move::MoveCommand;
pub use play::PlayCommand;

use anyhow::{Result, bail};
use roboarm_sdk::{JointKind, JointState};

/// 解析方向文本
///
/// 接受关节自己的标签（`up`、`clockwise`、`open`、`on` 等）、`stop`，
/// 或数字状态码 0/1/2（不超过该关节的最大状态）。
pub fn parse_direction(kind: JointKind, text: &str) -> Result<JointState> {
    if let Some(state) = kind.state_for_label(text) {
        return Ok(state);
    }

    if let Ok(value) = text.trim().parse::<u8>() {
        if value <= kind.max_state().as_u8()
            && let Ok(state) = JointState::from_u8(value)
        {
            return Ok(state);
        }
        bail!("{} 不支持状态码 {}", kind, value);
    }

    bail!("{} 不支持方向 '{}'（可用: {}）", kind, text, direction_labels(kind).join(", "))
}

/// 某关节可用的方向标签
pub fn direction_labels(kind: JointKind) -> Vec<String> {
    [JointState::Stopped, JointState::A, JointState::B]
        .into_iter()
        .filter(|state| state.as_u8() <= kind.max_state().as_u8())
        .filter_map(|state| kind.label(state))
        .map(str::to_ascii_lowercase)
        .collect()
}
