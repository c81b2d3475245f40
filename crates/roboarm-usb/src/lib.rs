//! # Roboarm USB Transport Layer
//!
//! 传输层抽象：把 3 字节指令写到机械臂。
//!
//! 核心层只需要一个语义："立即发送这 3 个字节，设备拒绝时明确失败"。
//! 设备枚举不属于核心层，这里只提供按 VID/PID 打开设备的适配器。

use roboarm_protocol::Command;
use thiserror::Error;

#[cfg(feature = "usb")]
pub mod device;

#[cfg(feature = "usb")]
pub use device::UsbArmDevice;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[cfg(any(test, feature = "mock"))]
pub use mock::MockTransport;

/// 默认厂商 ID
pub const DEFAULT_VENDOR_ID: u16 = 0x1267;

/// 默认产品 ID
pub const DEFAULT_PRODUCT_ID: u16 = 0x0000;

/// 传输层统一错误类型
#[derive(Error, Debug)]
pub enum TransportError {
    /// USB 错误（来自 rusb）
    #[cfg(feature = "usb")]
    #[error("USB error: {0}")]
    Usb(#[from] rusb::Error),

    /// 设备未找到
    #[error("Arm not found (vendor 0x{vendor_id:04X}, product 0x{product_id:04X})")]
    DeviceNotFound { vendor_id: u16, product_id: u16 },

    /// 设备只接收了部分字节
    #[error("Short write: expected {expected} bytes, device accepted {actual}")]
    ShortWrite { expected: usize, actual: usize },

    /// IO 错误
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    /// Mock 传输注入的错误
    #[error("Mock transport failure: {0}")]
    Mock(String),
}

impl TransportError {
    /// 是否为致命错误（设备已断开或不存在）
    pub fn is_fatal(&self) -> bool {
        match self {
            TransportError::DeviceNotFound { .. } => true,
            #[cfg(feature = "usb")]
            TransportError::Usb(rusb::Error::NoDevice | rusb::Error::NotFound) => true,
            _ => false,
        }
    }
}

/// 指令传输 Trait
///
/// 同步写入，带隐式超时。实现者不得吞掉错误：
/// 一条发送失败的物理指令不能被当作已送达。
pub trait ArmTransport {
    /// 发送一条 3 字节指令
    fn write_command(&mut self, command: &Command) -> Result<(), TransportError>;
}

impl<T: ArmTransport + ?Sized> ArmTransport for Box<T> {
    fn write_command(&mut self, command: &Command) -> Result<(), TransportError> {
        (**self).write_command(command)
    }
}

impl<T: ArmTransport + ?Sized> ArmTransport for &mut T {
    fn write_command(&mut self, command: &Command) -> Result<(), TransportError> {
        (**self).write_command(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::DeviceNotFound {
            vendor_id: 0x1267,
            product_id: 0x0000,
        };
        let msg = err.to_string();
        assert!(msg.contains("Arm not found"), "msg: {}", msg);
        assert!(msg.contains("0x1267") && msg.contains("0x0000"), "msg: {}", msg);

        let err = TransportError::ShortWrite {
            expected: 3,
            actual: 1,
        };
        assert!(err.to_string().contains("expected 3"));
    }

    #[test]
    fn test_is_fatal() {
        let err = TransportError::DeviceNotFound {
            vendor_id: 1,
            product_id: 2,
        };
        assert!(err.is_fatal());
        assert!(!TransportError::Mock("boom".to_string()).is_fatal());
        assert!(
            !TransportError::ShortWrite {
                expected: 3,
                actual: 0
            }
            .is_fatal()
        );
    }

    #[cfg(feature = "usb")]
    #[test]
    fn test_from_rusb_error() {
        let err: TransportError = rusb::Error::NoDevice.into();
        assert!(matches!(err, TransportError::Usb(rusb::Error::NoDevice)));
        assert!(err.is_fatal());

        let err: TransportError = rusb::Error::Timeout.into();
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_boxed_transport_forwards() {
        let mock = MockTransport::new();
        let mut boxed: Box<dyn ArmTransport> = Box::new(mock.clone());
        boxed.write_command(&Command::new(1, 0, 0)).unwrap();
        assert_eq!(mock.written(), vec![Command::new(1, 0, 0)]);
    }
}
