//! # 机械臂配置
//!
//! TOML 格式，缺省字段取默认值：
//!
//! ```toml
//! [device]
//! vendor_id = 0x1267
//! product_id = 0x0000
//! timeout_ms = 1000
//!
//! [motion]
//! default_pulse_secs = 0.5
//!
//! [recorder]
//! enabled = true
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// 机械臂配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmConfig {
    /// USB 设备设置
    pub device: DeviceSettings,

    /// 运动设置
    pub motion: MotionSettings,

    /// 录制设置
    pub recorder: RecorderSettings,
}

impl ArmConfig {
    /// 从 TOML 字符串解析
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse arm configuration")
    }

    /// 序列化为 TOML 字符串
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize arm configuration")
    }

    /// 从文件加载，文件不存在时返回默认配置
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// 保存到文件（自动创建父目录）
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
        }

        let content = self.to_toml_string()?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file {}", path.display()))
    }
}

/// USB 设备设置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceSettings {
    pub vendor_id: u16,
    pub product_id: u16,
    /// 控制传输超时（毫秒）
    pub timeout_ms: u64,
}

impl DeviceSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            vendor_id: 0x1267,
            product_id: 0x0000,
            timeout_ms: 1000,
        }
    }
}

/// 运动设置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionSettings {
    /// 未显式给出脉冲时长时使用的默认值（秒）；None 表示持续运动
    pub default_pulse_secs: Option<f64>,
}

/// 录制设置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderSettings {
    /// 是否挂载录制器
    pub enabled: bool,
}

impl Default for RecorderSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}
