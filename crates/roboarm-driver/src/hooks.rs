//! 钩子系统（Hook System）
//!
//! 在每条指令成功写入设备后触发回调，供 GUI、Web 层或日志观察实际发出的指令。
//!
//! # 设计原则
//!
//! - **非阻塞**: 回调在持有机械臂锁的线程中执行，必须立即返回，推荐使用 Channel 异步处理
//! - **只记录已送达的指令**: 写入失败的指令不会触发回调
//!
//! # 使用示例
//!
//! ```rust
//! use roboarm_driver::hooks::{ChannelHook, HookManager, TransmitHook};
//! use roboarm_protocol::Command;
//! use std::sync::Arc;
//!
//! let mut hooks = HookManager::new();
//! let (hook, rx) = ChannelHook::new();
//! hooks.add_hook(Arc::new(hook) as Arc<dyn TransmitHook>);
//!
//! hooks.trigger_all_sent(&Command::new(64, 0, 0));
//! assert_eq!(rx.try_recv().unwrap().command, Command::new(64, 0, 0));
//! ```

use crossbeam_channel::{Receiver, Sender, bounded};
use parking_lot::RwLock;
use roboarm_protocol::Command;
use roboarm_usb::{ArmTransport, TransportError};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// 指令回调 Trait
pub trait TransmitHook: Send + Sync {
    /// 指令成功写入设备后调用
    ///
    /// 必须非阻塞：禁止 I/O 和长时间加锁，推荐 `try_send`。
    fn on_command_sent(&self, command: &Command);
}

/// 钩子管理器
///
/// 回调列表本身不是线程安全的，需要外部同步（机械臂内部使用 `RwLock<HookManager>`）。
#[derive(Default)]
pub struct HookManager {
    hooks: Vec<Arc<dyn TransmitHook>>,
}

impl HookManager {
    #[must_use]
    pub const fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    pub fn add_hook(&mut self, hook: Arc<dyn TransmitHook>) {
        self.hooks.push(hook);
    }

    /// 移除所有回调
    pub fn clear(&mut self) {
        self.hooks.clear();
    }

    /// 触发所有回调（写入成功后调用）
    pub fn trigger_all_sent(&self, command: &Command) {
        for hook in self.hooks.iter() {
            hook.on_command_sent(command);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

/// 带时间戳的已发送指令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentCommand {
    pub command: Command,
    /// 写入完成的时刻
    pub at: Instant,
}

/// 基于有界通道的回调
///
/// 队列满时丢弃新指令并计数，而不是阻塞写入线程。
pub struct ChannelHook {
    tx: Sender<SentCommand>,
    dropped: Arc<AtomicU64>,
    sent: Arc<AtomicU64>,
}

impl ChannelHook {
    /// 默认队列容量
    pub const DEFAULT_CAPACITY: usize = 1024;

    #[must_use]
    pub fn new() -> (Self, Receiver<SentCommand>) {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> (Self, Receiver<SentCommand>) {
        let (tx, rx) = bounded(capacity);
        let hook = Self {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
            sent: Arc::new(AtomicU64::new(0)),
        };
        (hook, rx)
    }

    /// 丢弃计数器（可在注册前 clone 持有）
    #[must_use]
    pub fn dropped_commands(&self) -> &Arc<AtomicU64> {
        &self.dropped
    }

    #[must_use]
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// 成功转发的指令数
    #[must_use]
    pub fn sent_count(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }
}

impl TransmitHook for ChannelHook {
    #[inline]
    fn on_command_sent(&self, command: &Command) {
        let sent = SentCommand {
            command: *command,
            at: Instant::now(),
        };
        if self.tx.try_send(sent).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        } else {
            self.sent.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// 带钩子的传输
///
/// 包装底层传输：写入成功后记录最后一条指令并触发回调。
/// 控制器和回放都通过它写设备，因此回调能看到所有实际发出的指令。
pub(crate) struct HookedTransport<T> {
    inner: T,
    hooks: Arc<RwLock<HookManager>>,
    last_written: Command,
}

impl<T: ArmTransport> HookedTransport<T> {
    pub(crate) fn new(inner: T, hooks: Arc<RwLock<HookManager>>) -> Self {
        Self {
            inner,
            hooks,
            last_written: Command::ZERO,
        }
    }

    /// 最后一条成功写入的指令（初始为全零）
    pub(crate) fn last_written(&self) -> Command {
        self.last_written
    }

    pub(crate) fn hooks(&self) -> &Arc<RwLock<HookManager>> {
        &self.hooks
    }

    pub(crate) fn inner(&self) -> &T {
        &self.inner
    }
}

impl<T: ArmTransport> ArmTransport for HookedTransport<T> {
    fn write_command(&mut self, command: &Command) -> Result<(), TransportError> {
        self.inner.write_command(command)?;
        self.last_written = *command;
        self.hooks.read().trigger_all_sent(command);
        Ok(())
    }
}
