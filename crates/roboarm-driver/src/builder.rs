//! Builder 模式实现
//!
//! 提供链式构造 `RoboticArm` 实例的便捷方式。

use crate::arm::RoboticArm;
use crate::controller::ArmController;
#[cfg(feature = "usb")]
use crate::error::DriverError;
use crate::recorder::Recorder;
use roboarm_tools::ArmConfig;
use roboarm_usb::ArmTransport;
#[cfg(feature = "usb")]
use roboarm_usb::UsbArmDevice;
use std::time::Duration;
#[cfg(feature = "usb")]
use tracing::info;

/// RoboticArm Builder（链式构造）
///
/// # Example
///
/// ```no_run
/// use roboarm_driver::ArmBuilder;
///
/// // 默认设备（0x1267:0x0000），挂载录制器
/// let arm = ArmBuilder::new().build().unwrap();
///
/// // 指定产品 ID，不挂载录制器
/// let arm = ArmBuilder::new()
///     .product_id(0x0001)
///     .recorder(false)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ArmBuilder {
    vendor_id: u16,
    product_id: u16,
    /// 控制传输超时
    timeout: Duration,
    /// 是否挂载录制器
    recorder: bool,
}

impl Default for ArmBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ArmBuilder {
    pub fn new() -> Self {
        Self::from_config(&ArmConfig::default())
    }

    /// 从配置文件内容创建
    pub fn from_config(config: &ArmConfig) -> Self {
        Self {
            vendor_id: config.device.vendor_id,
            product_id: config.device.product_id,
            timeout: config.device.timeout(),
            recorder: config.recorder.enabled,
        }
    }

    pub fn vendor_id(mut self, vendor_id: u16) -> Self {
        self.vendor_id = vendor_id;
        self
    }

    pub fn product_id(mut self, product_id: u16) -> Self {
        self.product_id = product_id;
        self
    }

    /// 设置控制传输超时（可选，默认 1s）
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// 是否挂载录制器（可选，默认挂载）
    pub fn recorder(mut self, enabled: bool) -> Self {
        self.recorder = enabled;
        self
    }

    /// 打开 USB 设备并构建
    ///
    /// # Errors
    /// - `DriverError::Transport`: 设备不存在或无法打开
    #[cfg(feature = "usb")]
    pub fn build(self) -> Result<RoboticArm<UsbArmDevice>, DriverError> {
        let device = UsbArmDevice::open_with_timeout(self.vendor_id, self.product_id, self.timeout)?;
        info!(
            "Connected to arm 0x{:04X}:0x{:04X}",
            self.vendor_id, self.product_id
        );
        Ok(self.build_with(device))
    }

    /// 使用已打开的传输构建（测试、自定义后端）
    pub fn build_with<T: ArmTransport>(self, transport: T) -> RoboticArm<T> {
        let mut controller = ArmController::new(transport);
        if self.recorder {
            controller = controller.with_recorder(Recorder::new());
        }
        RoboticArm::from_controller(controller)
    }
}
