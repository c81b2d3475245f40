//! USB 机械臂设备
//!
//! 通过 vendor 控制传输发送 3 字节指令。

use crate::{ArmTransport, DEFAULT_PRODUCT_ID, DEFAULT_VENDOR_ID, TransportError};
use roboarm_protocol::Command;
use rusb::{DeviceHandle, GlobalContext};
use std::time::Duration;
use tracing::{debug, trace};

// ============================================================================
// Control Transfer Parameters
// ============================================================================

/// USB Control Transfer: Host to Device | Vendor | Device
pub const ARM_REQ_OUT: u8 = 0x40;
/// 指令请求码
pub const ARM_BREQ_COMMAND: u8 = 6;
/// wValue
pub const ARM_COMMAND_VALUE: u16 = 0x100;
/// wIndex
pub const ARM_COMMAND_INDEX: u16 = 0;

/// 默认控制传输超时
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

/// USB 机械臂设备句柄
pub struct UsbArmDevice {
    handle: DeviceHandle<GlobalContext>,
    vendor_id: u16,
    product_id: u16,
    timeout: Duration,
}

impl UsbArmDevice {
    /// 按默认 VID/PID 打开
    pub fn open_default() -> Result<Self, TransportError> {
        Self::open(DEFAULT_VENDOR_ID, DEFAULT_PRODUCT_ID)
    }

    /// 按 VID/PID 打开
    pub fn open(vendor_id: u16, product_id: u16) -> Result<Self, TransportError> {
        Self::open_with_timeout(vendor_id, product_id, DEFAULT_TIMEOUT)
    }

    /// 按 VID/PID 打开，并指定控制传输超时
    ///
    /// 找不到设备时返回 [`TransportError::DeviceNotFound`]，调用方无法在没有设备的情况下继续。
    pub fn open_with_timeout(
        vendor_id: u16,
        product_id: u16,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let handle = rusb::open_device_with_vid_pid(vendor_id, product_id).ok_or(
            TransportError::DeviceNotFound {
                vendor_id,
                product_id,
            },
        )?;

        debug!(
            "Opened arm device 0x{:04X}:0x{:04X} (timeout {:?})",
            vendor_id, product_id, timeout
        );

        Ok(Self {
            handle,
            vendor_id,
            product_id,
            timeout,
        })
    }

    pub fn vendor_id(&self) -> u16 {
        self.vendor_id
    }

    pub fn product_id(&self) -> u16 {
        self.product_id
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl ArmTransport for UsbArmDevice {
    fn write_command(&mut self, command: &Command) -> Result<(), TransportError> {
        let written = self.handle.write_control(
            ARM_REQ_OUT,
            ARM_BREQ_COMMAND,
            ARM_COMMAND_VALUE,
            ARM_COMMAND_INDEX,
            command.as_bytes(),
            self.timeout,
        )?;

        trace!("USB control transfer {} ({} bytes)", command, written);

        if written != Command::LEN {
            return Err(TransportError::ShortWrite {
                expected: Command::LEN,
                actual: written,
            });
        }
        Ok(())
    }
}
