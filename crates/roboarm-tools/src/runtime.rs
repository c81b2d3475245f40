//! 运行时长显示

use std::time::Duration;

/// 格式化为 `MM:SS`
///
/// 不足一秒的部分截断；超过 99 分钟时分钟位自然变宽。
pub fn format_runtime(runtime: Duration) -> String {
    let secs = runtime.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
