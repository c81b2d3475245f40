//! 配置管理命令
//!
//! 用于管理 CLI 配置（USB 设备、默认脉冲时长、录制器）

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use roboarm_sdk::ArmConfig;
use std::path::PathBuf;

/// 配置文件路径
pub fn config_file() -> Result<PathBuf> {
    let mut path = dirs::config_dir().ok_or_else(|| anyhow::anyhow!("无法确定配置目录"))?;

    path.push("roboarm");
    path.push("config.toml");
    Ok(path)
}

/// 加载用户配置（不存在时返回默认配置）
pub fn load_config() -> Result<ArmConfig> {
    ArmConfig::load(config_file()?)
}

/// 解析 USB ID，支持十进制与 `0x` 前缀的十六进制
fn parse_usb_id(text: &str) -> Result<u16, String> {
    let text = text.trim();
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => text.parse::<u16>(),
    };
    parsed.map_err(|e| format!("invalid USB id '{}': {}", text, e))
}

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 设置配置项
    Set {
        /// USB Vendor ID（如 0x1267）
        #[arg(long, value_parser = parse_usb_id)]
        vendor_id: Option<u16>,

        /// USB Product ID（如 0x0000）
        #[arg(long, value_parser = parse_usb_id)]
        product_id: Option<u16>,

        /// 控制传输超时（毫秒）
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// 默认脉冲时长（秒）
        #[arg(long, conflicts_with = "no_pulse")]
        pulse: Option<f64>,

        /// 清除默认脉冲时长（持续运动）
        #[arg(long)]
        no_pulse: bool,

        /// 是否挂载录制器
        #[arg(long)]
        recorder: Option<bool>,
    },

    /// 获取配置项
    Get {
        /// 配置项名称
        #[arg(default_value = "all")]
        key: String,
    },

    /// 检查配置
    Check,
}

impl ConfigCommand {
    pub fn execute(self) -> Result<()> {
        let path = config_file()?;
        let mut config = ArmConfig::load(&path)?;

        match self {
            ConfigCommand::Set {
                vendor_id,
                product_id,
                timeout_ms,
                pulse,
                no_pulse,
                recorder,
            } => {
                let changed = apply_set(
                    &mut config,
                    SetArgs {
                        vendor_id,
                        product_id,
                        timeout_ms,
                        pulse,
                        no_pulse,
                        recorder,
                    },
                )?;
                if changed.is_empty() {
                    println!("⚠️  没有需要修改的配置项");
                    return Ok(());
                }
                config.save(&path)?;
                for line in changed {
                    println!("✅ {}", line);
                }
                Ok(())
            },

            ConfigCommand::Get { key } => {
                println!("{}", get_value(&config, &key)?);
                Ok(())
            },

            ConfigCommand::Check => {
                println!("📄 配置文件: {}", path.display());
                if path.exists() {
                    println!("✅ 配置有效");
                } else {
                    println!("⚠️  配置文件不存在，使用默认配置");
                }
                println!();
                print!("{}", config.to_toml_string()?);
                Ok(())
            },
        }
    }
}

/// `config set` 的参数集合
#[derive(Debug, Default)]
struct SetArgs {
    vendor_id: Option<u16>,
    product_id: Option<u16>,
    timeout_ms: Option<u64>,
    pulse: Option<f64>,
    no_pulse: bool,
    recorder: Option<bool>,
}

/// 修改配置，返回修改说明
fn apply_set(config: &mut ArmConfig, args: SetArgs) -> Result<Vec<String>> {
    let mut changed = Vec::new();

    if let Some(id) = args.vendor_id {
        config.device.vendor_id = id;
        changed.push(format!("设置 Vendor ID: 0x{:04x}", id));
    }
    if let Some(id) = args.product_id {
        config.device.product_id = id;
        changed.push(format!("设置 Product ID: 0x{:04x}", id));
    }
    if let Some(ms) = args.timeout_ms {
        if ms == 0 {
            bail!("超时必须大于 0 毫秒");
        }
        config.device.timeout_ms = ms;
        changed.push(format!("设置超时: {} ms", ms));
    }
    if let Some(secs) = args.pulse {
        if roboarm_sdk::driver::pulse_duration(Some(secs)).is_none() {
            bail!("脉冲时长必须是正数: {}", secs);
        }
        config.motion.default_pulse_secs = Some(secs);
        changed.push(format!("设置默认脉冲: {} 秒", secs));
    }
    if args.no_pulse {
        config.motion.default_pulse_secs = None;
        changed.push("清除默认脉冲（持续运动）".to_string());
    }
    if let Some(enabled) = args.recorder {
        config.recorder.enabled = enabled;
        changed.push(format!("录制器: {}", if enabled { "启用" } else { "禁用" }));
    }

    Ok(changed)
}

/// 读取单个配置项
fn get_value(config: &ArmConfig, key: &str) -> Result<String> {
    let value = match key {
        "vendor_id" => format!("0x{:04x}", config.device.vendor_id),
        "product_id" => format!("0x{:04x}", config.device.product_id),
        "timeout_ms" => config.device.timeout_ms.to_string(),
        "pulse" => config
            .motion
            .default_pulse_secs
            .map(|secs| secs.to_string())
            .unwrap_or_else(|| "none".to_string()),
        "recorder" => config.recorder.enabled.to_string(),
        "all" => config
            .to_toml_string()
            .context("Failed to render configuration")?
            .trim_end()
            .to_string(),
        other => bail!(
            "未知配置项: {}（可用: vendor_id, product_id, timeout_ms, pulse, recorder, all）",
            other
        ),
    };
    Ok(value)
}
