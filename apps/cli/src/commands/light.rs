//! 灯光命令

use clap::{Args, ValueEnum};
use roboarm_sdk::JointState;

/// 灯光开关
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightSwitch {
    On,
    Off,
}

/// 灯光命令参数
#[derive(Args, Debug)]
pub struct LightCommand {
    #[arg(value_enum)]
    pub state: LightSwitch,
}

impl LightCommand {
    pub fn target(&self) -> JointState {
        match self.state {
            LightSwitch::On => JointState::A,
            LightSwitch::Off => JointState::Stopped,
        }
    }
}
