//! 移动命令
//!
//! 驱动单个关节，可选定时脉冲（到时自动停止全部关节）

use anyhow::Result;
use clap::Args;
use roboarm_sdk::driver::parse_pulse;
use roboarm_sdk::{JointKind, JointState};

use super::parse_direction;

/// 移动命令参数
#[derive(Args, Debug)]
pub struct MoveCommand {
    /// 关节：base, shoulder, elbow, wrist, gripper, light
    pub joint: JointKind,

    /// 方向：up/down、clockwise/anticlockwise、close/open、on/off、stop，或状态码 0/1/2
    pub direction: String,

    /// 脉冲时长（秒），到时自动停止；0 或负数表示持续运动
    #[arg(short, long)]
    pub pulse: Option<String>,
}

impl MoveCommand {
    /// 目标状态
    pub fn target(&self) -> Result<JointState> {
        parse_direction(self.joint, &self.direction)
    }

    /// 实际使用的脉冲时长（命令行优先，其次是配置默认值）
    pub fn pulse(&self, default: Option<f64>) -> Option<f64> {
        resolve_pulse(self.pulse.as_deref(), default)
    }
}

/// 解析脉冲参数：显式给出时按文本解析（无效值表示不脉冲），否则使用默认值
pub fn resolve_pulse(explicit: Option<&str>, default: Option<f64>) -> Option<f64> {
    match explicit {
        Some(text) => parse_pulse(text),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(joint: JointKind, direction: &str, pulse: Option<&str>) -> MoveCommand {
        MoveCommand {
            joint,
            direction: direction.to_string(),
            pulse: pulse.map(str::to_string),
        }
    }

    #[test]
    fn test_target() {
        assert_eq!(command(JointKind::Wrist, "down", None).target().unwrap(), JointState::B);
        assert!(command(JointKind::Light, "2", None).target().is_err());
    }

    #[test]
    fn test_pulse_resolution() {
        assert_eq!(command(JointKind::Base, "stop", None).pulse(Some(0.5)), Some(0.5));
        assert_eq!(command(JointKind::Base, "stop", Some("1.25")).pulse(Some(0.5)), Some(1.25));
        assert_eq!(command(JointKind::Base, "stop", Some("0")).pulse(Some(0.5)), None);
        assert_eq!(command(JointKind::Base, "stop", Some("-2")).pulse(None), None);
        assert_eq!(command(JointKind::Base, "stop", Some("soon")).pulse(Some(0.5)), None);
    }
}
