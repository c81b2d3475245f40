//! 传输指令与编码器
//!
//! 编码器是纯函数：输入关节集合，输出 3 字节指令，无隐藏状态，无副作用。

use crate::ProtocolError;
use crate::joint::{JointKind, JointSet, JointState};
use std::fmt;

/// 3 字节传输指令 `[packed_joint_byte, base_byte, light_byte]`
///
/// 这是 ArmController 做变化检测、Recorder 做存储的基本单位。
/// 反向指令使用同样的类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Command([u8; 3]);

impl Command {
    /// 全停指令
    pub const ZERO: Command = Command([0, 0, 0]);

    /// 指令长度（字节）
    pub const LEN: usize = 3;

    /// 直接由字段构造（不做校验）
    pub const fn new(packed: u8, base: u8, light: u8) -> Self {
        Self([packed, base, light])
    }

    /// 由原始字节构造并校验
    pub fn try_from_bytes(bytes: [u8; 3]) -> Result<Self, ProtocolError> {
        let command = Self(bytes);
        command.validate()?;
        Ok(command)
    }

    pub const fn packed(&self) -> u8 {
        self.0[0]
    }

    pub const fn base(&self) -> u8 {
        self.0[1]
    }

    pub const fn light(&self) -> u8 {
        self.0[2]
    }

    pub const fn as_bytes(&self) -> &[u8; 3] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// 校验指令是否可以由某个合法关节集合编码得到
    ///
    /// - 打包字节的每个 4 进制位 ≤ 2
    /// - base 字节 ≤ 2
    /// - light 字节 ≤ 1
    pub fn validate(&self) -> Result<(), ProtocolError> {
        PackedJoints::unpack(self.packed())?;
        if self.base() > JointKind::Base.max_state().as_u8() {
            return Err(ProtocolError::InvalidCommand {
                field: "base",
                value: self.base(),
            });
        }
        if self.light() > JointKind::Light.max_state().as_u8() {
            return Err(ProtocolError::InvalidCommand {
                field: "light",
                value: self.light(),
            });
        }
        Ok(())
    }
}

impl From<Command> for [u8; 3] {
    fn from(command: Command) -> Self {
        command.0
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.0[0], self.0[1], self.0[2])
    }
}

/// 打包进共享字节的四个关节状态
///
/// `byte = gripper*1 + wrist*4 + elbow*16 + shoulder*64`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PackedJoints {
    pub gripper: JointState,
    pub wrist: JointState,
    pub elbow: JointState,
    pub shoulder: JointState,
}

impl PackedJoints {
    /// 从关节集合中提取
    pub fn from_joints(joints: &JointSet) -> Self {
        Self {
            gripper: joints.gripper().state(),
            wrist: joints.wrist().state(),
            elbow: joints.elbow().state(),
            shoulder: joints.shoulder().state(),
        }
    }

    /// 打包为单字节
    pub const fn pack(&self) -> u8 {
        self.gripper.as_u8() * JointKind::Gripper.weight()
            + self.wrist.as_u8() * JointKind::Wrist.weight()
            + self.elbow.as_u8() * JointKind::Elbow.weight()
            + self.shoulder.as_u8() * JointKind::Shoulder.weight()
    }

    /// 从单字节解包
    ///
    /// 任何一个 4 进制位为 3 都是非法字节。
    pub fn unpack(byte: u8) -> Result<Self, ProtocolError> {
        let digit = |weight: u8| {
            JointState::from_u8((byte / weight) % 4)
                .map_err(|_| ProtocolError::InvalidPackedByte(byte))
        };
        Ok(Self {
            gripper: digit(JointKind::Gripper.weight())?,
            wrist: digit(JointKind::Wrist.weight())?,
            elbow: digit(JointKind::Elbow.weight())?,
            shoulder: digit(JointKind::Shoulder.weight())?,
        })
    }
}

/// 检查全部关节都处于可编码状态
fn check_joints(joints: &JointSet) -> Result<(), ProtocolError> {
    joints.iter().try_for_each(|joint| joint.check_encodable())
}

/// 计算正向指令
///
/// # 错误
///
/// 任何关节处于其种类不允许的状态（例如灯光为 B）时返回
/// [`ProtocolError::StateOutOfRange`]，不会截断或回绕。
pub fn encode(joints: &JointSet) -> Result<Command, ProtocolError> {
    check_joints(joints)?;
    let packed = joints.packed().iter().map(|joint| joint.current_value()).sum();
    Ok(Command::new(
        packed,
        joints.base().current_value(),
        joints.light().current_value(),
    ))
}

/// 计算反向指令
///
/// 可逆关节（四个打包关节与 base）交换 1↔2；灯光保持正向状态不变。
pub fn encode_reverse(joints: &JointSet) -> Result<Command, ProtocolError> {
    check_joints(joints)?;
    let packed = joints
        .packed()
        .iter()
        .map(|joint| joint.current_value_reversed())
        .sum();
    Ok(Command::new(
        packed,
        joints.base().current_value_reversed(),
        joints.light().current_value(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;

    fn joints_from(states: [u8; 6]) -> JointSet {
        let mut joints = JointSet::new();
        let kinds = [
            JointKind::Gripper,
            JointKind::Wrist,
            JointKind::Elbow,
            JointKind::Shoulder,
            JointKind::Base,
            JointKind::Light,
        ];
        for (kind, state) in kinds.into_iter().zip(states) {
            joints
                .get_mut(kind)
                .set_state(JointState::from_u8(state).unwrap());
        }
        joints
    }

    #[test]
    fn test_encode_all_stopped() {
        let joints = JointSet::new();
        assert_eq!(encode(&joints).unwrap(), Command::ZERO);
        assert_eq!(encode_reverse(&joints).unwrap(), Command::ZERO);
    }

    #[test]
    fn test_encode_shoulder_down() {
        let mut joints = JointSet::new();
        joints.shoulder_mut().set_down();
        let command = encode(&joints).unwrap();
        assert_eq!(command, Command::new(128, 0, 0));
        assert_eq!(command.as_bytes(), &[128, 0, 0]);
    }

    #[test]
    fn test_encode_gripper_and_wrist() {
        let mut joints = JointSet::new();
        joints.gripper_mut().set_open();
        joints.wrist_mut().set_down();
        assert_eq!(encode(&joints).unwrap().packed(), 10);
    }

    #[test]
    fn test_encode_reverse_shoulder_up() {
        let mut joints = JointSet::new();
        joints.shoulder_mut().set_up();
        assert_eq!(encode(&joints).unwrap().packed(), 64);
        assert_eq!(encode_reverse(&joints).unwrap().packed(), 128);
    }

    #[test]
    fn test_encode_reverse_base() {
        let mut joints = JointSet::new();
        joints.base_mut().set_clockwise();
        assert_eq!(encode(&joints).unwrap(), Command::new(0, 1, 0));
        assert_eq!(encode_reverse(&joints).unwrap(), Command::new(0, 2, 0));
    }

    #[test]
    fn test_encode_reverse_keeps_light() {
        let mut joints = JointSet::new();
        joints.light_mut().set_on();
        joints.elbow_mut().set_down();
        let forward = encode(&joints).unwrap();
        let reverse = encode_reverse(&joints).unwrap();
        assert_eq!(forward, Command::new(32, 0, 1));
        assert_eq!(reverse, Command::new(16, 0, 1));
    }

    #[test]
    fn test_encode_rejects_light_in_state_b() {
        let mut joints = JointSet::new();
        joints.light_mut().set_down();
        assert_eq!(
            encode(&joints),
            Err(ProtocolError::StateOutOfRange {
                kind: JointKind::Light,
                state: 2
            })
        );
        assert!(encode_reverse(&joints).is_err());
    }

    /// 所有合法状态组合的编码两两不同
    #[test]
    fn test_encode_is_injective() {
        let mut seen: HashMap<Command, [u8; 6]> = HashMap::new();
        for g in 0..3 {
            for w in 0..3 {
                for e in 0..3 {
                    for s in 0..3 {
                        for b in 0..3 {
                            for l in 0..2 {
                                let states = [g, w, e, s, b, l];
                                let command = encode(&joints_from(states)).unwrap();
                                if let Some(previous) = seen.insert(command, states) {
                                    panic!(
                                        "{:?} and {:?} both encode to {}",
                                        previous, states, command
                                    );
                                }
                            }
                        }
                    }
                }
            }
        }
        assert_eq!(seen.len(), 3 * 3 * 3 * 3 * 3 * 2);
    }

    #[test]
    fn test_unpack_rejects_digit_three() {
        assert_eq!(
            PackedJoints::unpack(3),
            Err(ProtocolError::InvalidPackedByte(3))
        );
        assert_eq!(
            PackedJoints::unpack(0xC0),
            Err(ProtocolError::InvalidPackedByte(0xC0))
        );
        assert!(PackedJoints::unpack(0xAA).is_ok());
    }

    #[test]
    fn test_command_validate() {
        assert!(Command::ZERO.validate().is_ok());
        assert!(Command::new(170, 2, 1).validate().is_ok());
        assert_eq!(
            Command::new(0, 3, 0).validate(),
            Err(ProtocolError::InvalidCommand {
                field: "base",
                value: 3
            })
        );
        assert_eq!(
            Command::new(0, 0, 2).validate(),
            Err(ProtocolError::InvalidCommand {
                field: "light",
                value: 2
            })
        );
        assert!(Command::try_from_bytes([255, 0, 0]).is_err());
    }

    #[test]
    fn test_command_display() {
        assert_eq!(Command::new(128, 1, 0).to_string(), "[128, 1, 0]");
        let bytes: [u8; 3] = Command::new(1, 2, 1).into();
        assert_eq!(bytes, [1, 2, 1]);
    }

    fn state_strategy() -> impl Strategy<Value = u8> {
        0u8..3
    }

    proptest! {
        /// 解包总能还原打包前的四个关节状态
        #[test]
        fn packed_byte_is_invertible(
            g in state_strategy(),
            w in state_strategy(),
            e in state_strategy(),
            s in state_strategy(),
        ) {
            let joints = joints_from([g, w, e, s, 0, 0]);
            let packed = PackedJoints::from_joints(&joints);
            let command = encode(&joints).unwrap();
            prop_assert_eq!(command.packed(), packed.pack());
            prop_assert_eq!(PackedJoints::unpack(command.packed()).unwrap(), packed);
        }

        /// 反向指令再取反等于正向指令（灯光不参与反转）
        #[test]
        fn reverse_is_an_involution(
            g in state_strategy(),
            w in state_strategy(),
            e in state_strategy(),
            s in state_strategy(),
            b in state_strategy(),
            l in 0u8..2,
        ) {
            let joints = joints_from([g, w, e, s, b, l]);
            let mut flipped = joints.clone();
            for kind in JointKind::ALL {
                if kind.is_reversible() {
                    let state = flipped.get(kind).state().reversed();
                    flipped.get_mut(kind).set_state(state);
                }
            }
            prop_assert_eq!(encode_reverse(&joints).unwrap(), encode(&flipped).unwrap());
            prop_assert_eq!(encode_reverse(&joints).unwrap().light(), l);
        }
    }
}
