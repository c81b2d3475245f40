//! Mock 传输
//!
//! 记录所有写入的指令，支持注入写入失败。克隆共享同一份内部状态，
//! 测试可以把一个克隆交给机械臂，另一个留在手里检查写入历史。

use crate::{ArmTransport, TransportError};
use roboarm_protocol::Command;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// 已写入的指令（带写入时间）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockWrite {
    pub command: Command,
    pub at: Instant,
}

#[derive(Debug, Default)]
struct MockState {
    writes: Vec<MockWrite>,
    /// 剩余多少次成功写入后开始失败（None 表示不注入）
    fail_after: Option<usize>,
}

/// Mock 传输
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 所有已写入的指令
    pub fn written(&self) -> Vec<Command> {
        self.lock().writes.iter().map(|w| w.command).collect()
    }

    /// 所有已写入的指令及其时间
    pub fn writes(&self) -> Vec<MockWrite> {
        self.lock().writes.clone()
    }

    /// 最后一条写入的指令
    pub fn last(&self) -> Option<Command> {
        self.lock().writes.last().map(|w| w.command)
    }

    /// 写入次数
    pub fn write_count(&self) -> usize {
        self.lock().writes.len()
    }

    /// 清空写入历史
    pub fn clear(&self) {
        self.lock().writes.clear();
    }

    /// 下一次写入失败
    pub fn fail_next_write(&self) {
        self.fail_after(0);
    }

    /// 再成功 `n` 次后，之后的写入全部失败
    pub fn fail_after(&self, n: usize) {
        self.lock().fail_after = Some(n);
    }

    /// 取消失败注入
    pub fn recover(&self) {
        self.lock().fail_after = None;
    }
}

impl ArmTransport for MockTransport {
    fn write_command(&mut self, command: &Command) -> Result<(), TransportError> {
        let mut state = self.lock();
        match state.fail_after {
            Some(0) => {
                return Err(TransportError::Mock(format!("write of {} rejected", command)));
            },
            Some(n) => state.fail_after = Some(n - 1),
            None => {},
        }
        state.writes.push(MockWrite {
            command: *command,
            at: Instant::now(),
        });
        Ok(())
    }
}
