//! 关节模型
//!
//! 各关节之间的差异只有数据（权重、可逆性、状态文本），没有算法差异，
//! 因此用一个值类型 [`Joint`] 加上一个封闭枚举 [`JointKind`] 表达全部关节。

use crate::ProtocolError;
use std::fmt;
use std::str::FromStr;

/// 关节离散状态
///
/// A/B 的物理含义由关节种类决定（Up/Down、Clockwise/AntiClockwise、
/// Close/Open、On/Off），编码只使用数值标签。
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    num_enum::TryFromPrimitive,
    num_enum::IntoPrimitive,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum JointState {
    /// 停止（默认状态）
    #[default]
    Stopped = 0,
    /// 方向 A
    A = 1,
    /// 方向 B
    B = 2,
}

impl JointState {
    /// 从原始数值转换，非法值返回 [`ProtocolError::InvalidJointState`]
    pub fn from_u8(value: u8) -> Result<Self, ProtocolError> {
        Ok(Self::try_from(value)?)
    }

    /// 数值标签
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// 方向反转：1↔2，0 保持不变
    pub const fn reversed(self) -> Self {
        match self {
            JointState::Stopped => JointState::Stopped,
            JointState::A => JointState::B,
            JointState::B => JointState::A,
        }
    }

    /// 是否停止
    pub const fn is_stopped(self) -> bool {
        matches!(self, JointState::Stopped)
    }
}

/// 关节种类
///
/// | 种类     | 权重 | 可逆 | A            | B               |
/// |----------|------|------|--------------|-----------------|
/// | Base     | 1    | 是   | Clockwise    | AntiClockwise   |
/// | Shoulder | 64   | 是   | Up           | Down            |
/// | Elbow    | 16   | 是   | Up           | Down            |
/// | Wrist    | 4    | 是   | Up           | Down            |
/// | Gripper  | 1    | 是   | Close        | Open            |
/// | Light    | 1    | 否   | On           | -               |
///
/// Base 与 Light 各占一个独立的传输字节，其余四个关节打包进同一个字节。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum JointKind {
    Base,
    Shoulder,
    Elbow,
    Wrist,
    Gripper,
    Light,
}

impl JointKind {
    /// 全部关节种类（按控制面板顺序）
    pub const ALL: [JointKind; 6] = [
        JointKind::Base,
        JointKind::Shoulder,
        JointKind::Elbow,
        JointKind::Wrist,
        JointKind::Gripper,
        JointKind::Light,
    ];

    /// 在打包字节中的权重（4 的幂）
    pub const fn weight(self) -> u8 {
        match self {
            JointKind::Shoulder => 64,
            JointKind::Elbow => 16,
            JointKind::Wrist => 4,
            JointKind::Gripper | JointKind::Base | JointKind::Light => 1,
        }
    }

    /// 是否具有方向（灯光没有方向）
    pub const fn is_reversible(self) -> bool {
        !matches!(self, JointKind::Light)
    }

    /// 是否打包进共享字节
    pub const fn is_packed(self) -> bool {
        matches!(
            self,
            JointKind::Shoulder | JointKind::Elbow | JointKind::Wrist | JointKind::Gripper
        )
    }

    /// 该关节允许编码的最大状态
    pub const fn max_state(self) -> JointState {
        match self {
            JointKind::Light => JointState::A,
            _ => JointState::B,
        }
    }

    /// 关节名称（小写）
    pub const fn name(self) -> &'static str {
        match self {
            JointKind::Base => "base",
            JointKind::Shoulder => "shoulder",
            JointKind::Elbow => "elbow",
            JointKind::Wrist => "wrist",
            JointKind::Gripper => "gripper",
            JointKind::Light => "light",
        }
    }

    /// 状态对应的显示文本
    ///
    /// 灯光的 B 状态没有含义，返回 `None`。
    pub const fn label(self, state: JointState) -> Option<&'static str> {
        match (self, state) {
            (JointKind::Light, JointState::Stopped) => Some("Off"),
            (JointKind::Light, JointState::A) => Some("On"),
            (JointKind::Light, JointState::B) => None,
            (_, JointState::Stopped) => Some("Stopped"),
            (JointKind::Base, JointState::A) => Some("Clockwise"),
            (JointKind::Base, JointState::B) => Some("AntiClockwise"),
            (JointKind::Gripper, JointState::A) => Some("Close"),
            (JointKind::Gripper, JointState::B) => Some("Open"),
            (_, JointState::A) => Some("Up"),
            (_, JointState::B) => Some("Down"),
        }
    }

    /// 从方向文本解析目标状态（大小写不敏感）
    ///
    /// 除各关节自己的标签外，所有关节都接受 `stop`。
    pub fn state_for_label(self, label: &str) -> Option<JointState> {
        let label = label.trim().to_ascii_lowercase();
        if label == "stop" || label == "stopped" {
            return Some(JointState::Stopped);
        }
        [JointState::Stopped, JointState::A, JointState::B]
            .into_iter()
            .find(|state| {
                self.label(*state)
                    .is_some_and(|text| text.eq_ignore_ascii_case(&label))
            })
    }
}

impl fmt::Display for JointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for JointKind {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JointKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ProtocolError::UnknownJoint(s.to_string()))
    }
}

/// 关节状态（供 Web/GUI 等外部调用方渲染）
///
/// 字段名与 Web 接口的 JSON 响应保持一致。
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JointStatus {
    /// 状态数值
    pub result: u8,
    /// 状态文本
    pub result_text: String,
}

/// 单个关节控制器
///
/// 纯状态容器，所有 setter 都是幂等且不会失败的。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Joint {
    kind: JointKind,
    state: JointState,
}

impl Joint {
    /// 创建停止状态的关节
    pub const fn new(kind: JointKind) -> Self {
        Self {
            kind,
            state: JointState::Stopped,
        }
    }

    pub const fn kind(&self) -> JointKind {
        self.kind
    }

    pub const fn state(&self) -> JointState {
        self.state
    }

    pub const fn weight(&self) -> u8 {
        self.kind.weight()
    }

    pub const fn is_reversible(&self) -> bool {
        self.kind.is_reversible()
    }

    /// 设置任意状态（封闭枚举，无需校验）
    pub fn set_state(&mut self, state: JointState) {
        self.state = state;
    }

    pub fn set_stop(&mut self) {
        self.state = JointState::Stopped;
    }

    pub fn set_up(&mut self) {
        self.state = JointState::A;
    }

    pub fn set_down(&mut self) {
        self.state = JointState::B;
    }

    pub fn set_clockwise(&mut self) {
        self.state = JointState::A;
    }

    pub fn set_anticlockwise(&mut self) {
        self.state = JointState::B;
    }

    pub fn set_close(&mut self) {
        self.state = JointState::A;
    }

    pub fn set_open(&mut self) {
        self.state = JointState::B;
    }

    pub fn set_on(&mut self) {
        self.state = JointState::A;
    }

    /// 关灯即停止状态（灯光没有 B 状态）
    pub fn set_off(&mut self) {
        self.state = JointState::Stopped;
    }

    /// 按外部状态码设置（Web 接口的 `status` 参数）
    ///
    /// - 0: 停止/关
    /// - 1: 方向 A/开
    /// - 2: 方向 B（灯光忽略）
    ///
    /// 其他值被忽略。返回是否发生了设置。
    pub fn apply_status(&mut self, status: u8) -> bool {
        match JointState::from_u8(status) {
            Ok(state) if state <= self.kind.max_state() => {
                self.state = state;
                true
            },
            _ => false,
        }
    }

    /// 打包贡献值：`state * weight`
    pub const fn current_value(&self) -> u8 {
        self.state.as_u8() * self.kind.weight()
    }

    /// 反向打包贡献值
    ///
    /// 可逆关节交换 1↔2 后再乘权重；不可逆关节（灯光）返回原值。
    pub const fn current_value_reversed(&self) -> u8 {
        if self.kind.is_reversible() {
            self.state.reversed().as_u8() * self.kind.weight()
        } else {
            self.current_value()
        }
    }

    /// 检查状态是否可以被编码
    pub fn check_encodable(&self) -> Result<(), ProtocolError> {
        if self.state > self.kind.max_state() {
            return Err(ProtocolError::StateOutOfRange {
                kind: self.kind,
                state: self.state.as_u8(),
            });
        }
        Ok(())
    }

    /// 状态显示文本
    pub fn state_text(&self) -> &'static str {
        self.kind.label(self.state).unwrap_or("Unknown")
    }

    /// 外部调用方使用的状态快照
    pub fn status(&self) -> JointStatus {
        JointStatus {
            result: self.state.as_u8(),
            result_text: self.state_text().to_string(),
        }
    }
}

/// 机械臂的全部关节
///
/// 字段私有，保证每个位置上的关节种类固定。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JointSet {
    base: Joint,
    shoulder: Joint,
    elbow: Joint,
    wrist: Joint,
    gripper: Joint,
    light: Joint,
}

impl Default for JointSet {
    fn default() -> Self {
        Self::new()
    }
}

impl JointSet {
    pub const fn new() -> Self {
        Self {
            base: Joint::new(JointKind::Base),
            shoulder: Joint::new(JointKind::Shoulder),
            elbow: Joint::new(JointKind::Elbow),
            wrist: Joint::new(JointKind::Wrist),
            gripper: Joint::new(JointKind::Gripper),
            light: Joint::new(JointKind::Light),
        }
    }

    pub fn base(&self) -> &Joint {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut Joint {
        &mut self.base
    }

    pub fn shoulder(&self) -> &Joint {
        &self.shoulder
    }

    pub fn shoulder_mut(&mut self) -> &mut Joint {
        &mut self.shoulder
    }

    pub fn elbow(&self) -> &Joint {
        &self.elbow
    }

    pub fn elbow_mut(&mut self) -> &mut Joint {
        &mut self.elbow
    }

    pub fn wrist(&self) -> &Joint {
        &self.wrist
    }

    pub fn wrist_mut(&mut self) -> &mut Joint {
        &mut self.wrist
    }

    pub fn gripper(&self) -> &Joint {
        &self.gripper
    }

    pub fn gripper_mut(&mut self) -> &mut Joint {
        &mut self.gripper
    }

    pub fn light(&self) -> &Joint {
        &self.light
    }

    pub fn light_mut(&mut self) -> &mut Joint {
        &mut self.light
    }

    /// 按种类获取关节
    pub fn get(&self, kind: JointKind) -> &Joint {
        match kind {
            JointKind::Base => &self.base,
            JointKind::Shoulder => &self.shoulder,
            JointKind::Elbow => &self.elbow,
            JointKind::Wrist => &self.wrist,
            JointKind::Gripper => &self.gripper,
            JointKind::Light => &self.light,
        }
    }

    /// 按种类获取可变关节
    pub fn get_mut(&mut self, kind: JointKind) -> &mut Joint {
        match kind {
            JointKind::Base => &mut self.base,
            JointKind::Shoulder => &mut self.shoulder,
            JointKind::Elbow => &mut self.elbow,
            JointKind::Wrist => &mut self.wrist,
            JointKind::Gripper => &mut self.gripper,
            JointKind::Light => &mut self.light,
        }
    }

    /// 打包进共享字节的四个关节（gripper, wrist, elbow, shoulder）
    pub fn packed(&self) -> [&Joint; 4] {
        [&self.gripper, &self.wrist, &self.elbow, &self.shoulder]
    }

    /// 遍历全部关节
    pub fn iter(&self) -> impl Iterator<Item = &Joint> {
        [
            &self.base,
            &self.shoulder,
            &self.elbow,
            &self.wrist,
            &self.gripper,
            &self.light,
        ]
        .into_iter()
    }

    /// 所有关节停止，灯光关闭
    pub fn stop_all(&mut self) {
        self.base.set_stop();
        self.shoulder.set_stop();
        self.elbow.set_stop();
        self.wrist.set_stop();
        self.gripper.set_stop();
        self.light.set_off();
    }

    /// 是否全部停止
    pub fn is_stopped(&self) -> bool {
        self.iter().all(|joint| joint.state().is_stopped())
    }
}
