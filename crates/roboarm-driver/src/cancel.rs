//! 可取消的等待
//!
//! 定时脉冲和回放中的每一次等待都通过 [`CancelToken::sleep`] 完成。
//! 令牌位于机械臂锁之外，另一个线程调用 [`CancelToken::cancel`] 会立即唤醒正在等待的线程，
//! 而不需要等它把剩余时长睡完。

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// 等待被取消
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

#[derive(Debug, Default)]
struct Inner {
    cancelled: Mutex<bool>,
    condvar: Condvar,
}

/// 取消令牌
///
/// 克隆共享同一个标志。
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// 请求取消，唤醒所有等待者
    pub fn cancel(&self) {
        let mut cancelled = self.inner.cancelled.lock();
        *cancelled = true;
        self.inner.condvar.notify_all();
    }

    /// 重新布防（清除取消标志）
    pub fn reset(&self) {
        *self.inner.cancelled.lock() = false;
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.cancelled.lock()
    }

    /// 等待 `duration`，期间被取消则提前返回 `Err(Cancelled)`
    ///
    /// 已处于取消状态时立即返回。
    pub fn sleep(&self, duration: Duration) -> Result<(), Cancelled> {
        let mut cancelled = self.inner.cancelled.lock();
        if *cancelled {
            return Err(Cancelled);
        }
        if duration.is_zero() {
            return Ok(());
        }

        match Instant::now().checked_add(duration) {
            Some(deadline) => {
                while !*cancelled {
                    if self
                        .inner
                        .condvar
                        .wait_until(&mut cancelled, deadline)
                        .timed_out()
                    {
                        break;
                    }
                }
            },
            // 超出 Instant 表示范围，只能等待取消
            None => {
                while !*cancelled {
                    self.inner.condvar.wait(&mut cancelled);
                }
            },
        }

        if *cancelled { Err(Cancelled) } else { Ok(()) }
    }
}
