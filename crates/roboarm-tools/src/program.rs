//! # 录制程序格式
//!
//! 录制程序是带时间间隔的指令序列，持久化为 UTF-8 文本，每条记录一行：
//!
//! ```text
//! <elapsed:%f> <fwd0> <fwd1> <fwd2> <rev0> <rev1> <rev2>\n
//! ```
//!
//! `elapsed` 保留 6 位小数（秒），其余 6 个字段为十进制整数。
//! 该格式需要与已有程序文件保持逐位兼容。

use roboarm_protocol::Command;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// 每行字段数
const FIELD_COUNT: usize = 7;

/// 程序文件错误
#[derive(Error, Debug)]
pub enum ProgramError {
    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 某一行格式错误（行号从 1 开始）
    #[error("Malformed program line {line}: {reason}")]
    Parse { line: usize, reason: String },
}

/// 单条录制记录
///
/// `elapsed` 是**上一条**记录所描述状态持续的时长，而不是绝对时间戳。
/// 因此最后一条记录的 `elapsed` 在追加时未知，会在下一条追加或停止录制时回填。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveLogEntry {
    /// 在该指令状态下停留的时长
    pub elapsed: Duration,
    /// 正向指令
    pub forward: Command,
    /// 反向指令
    pub reverse: Command,
}

impl MoveLogEntry {
    /// 程序结束哨兵：全零指令
    pub const SENTINEL: MoveLogEntry = MoveLogEntry {
        elapsed: Duration::ZERO,
        forward: Command::ZERO,
        reverse: Command::ZERO,
    };

    pub fn new(elapsed: Duration, forward: Command, reverse: Command) -> Self {
        Self {
            elapsed,
            forward,
            reverse,
        }
    }

    /// 格式化为一行（不含换行符）
    pub fn to_line(&self) -> String {
        format!(
            "{:.6} {} {} {} {} {} {}",
            self.elapsed.as_secs_f64(),
            self.forward.packed(),
            self.forward.base(),
            self.forward.light(),
            self.reverse.packed(),
            self.reverse.base(),
            self.reverse.light(),
        )
    }

    /// 解析一行
    pub fn parse_line(line: &str) -> Result<Self, String> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != FIELD_COUNT {
            return Err(format!(
                "expected {} fields, found {}",
                FIELD_COUNT,
                fields.len()
            ));
        }

        let seconds: f64 = fields[0]
            .parse()
            .map_err(|_| format!("elapsed is not a number: {:?}", fields[0]))?;
        let elapsed = Duration::try_from_secs_f64(seconds)
            .map_err(|_| format!("elapsed out of range: {}", fields[0]))?;

        let mut bytes = [0u8; 6];
        for (slot, field) in bytes.iter_mut().zip(&fields[1..]) {
            *slot = field
                .parse()
                .map_err(|_| format!("command byte is not an integer in 0..=255: {:?}", field))?;
        }

        let forward = Command::try_from_bytes([bytes[0], bytes[1], bytes[2]])
            .map_err(|e| format!("forward command: {}", e))?;
        let reverse = Command::try_from_bytes([bytes[3], bytes[4], bytes[5]])
            .map_err(|e| format!("reverse command: {}", e))?;

        Ok(Self::new(elapsed, forward, reverse))
    }
}

/// 录制程序
///
/// 录制期间只追加；加载/清空时整体替换。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramLog {
    entries: Vec<MoveLogEntry>,
}

impl ProgramLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<MoveLogEntry>) -> Self {
        Self { entries }
    }

    /// 步数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[MoveLogEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MoveLogEntry> {
        self.entries.iter()
    }

    pub fn push(&mut self, entry: MoveLogEntry) {
        self.entries.push(entry);
    }

    /// 回填最后一条记录的时长，程序为空时返回 false
    pub fn backfill_last(&mut self, elapsed: Duration) -> bool {
        match self.entries.last_mut() {
            Some(last) => {
                last.elapsed = elapsed;
                true
            },
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// 总时长：所有 `elapsed` 之和（即正向回放的总耗时）
    pub fn runtime(&self) -> Duration {
        self.entries.iter().map(|entry| entry.elapsed).sum()
    }

    /// 写出文本格式
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<(), ProgramError> {
        for entry in &self.entries {
            writeln!(writer, "{}", entry.to_line())?;
        }
        writer.flush()?;
        Ok(())
    }

    /// 读取文本格式
    ///
    /// 空行被跳过；任何一行格式错误都会使整个读取失败。
    pub fn read_from<R: BufRead>(reader: R) -> Result<Self, ProgramError> {
        let mut entries = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let entry = MoveLogEntry::parse_line(&line).map_err(|reason| ProgramError::Parse {
                line: index + 1,
                reason,
            })?;
            entries.push(entry);
        }
        Ok(Self { entries })
    }

    /// 保存到文件
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ProgramError> {
        let file = File::create(path.as_ref())?;
        self.write_to(BufWriter::new(file))
    }

    /// 从文件加载
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ProgramError> {
        let file = File::open(path.as_ref())?;
        Self::read_from(BufReader::new(file))
    }
}

impl<'a> IntoIterator for &'a ProgramLog {
    type Item = &'a MoveLogEntry;
    type IntoIter = std::slice::Iter<'a, MoveLogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ProgramLog {
        ProgramLog::from_entries(vec![
            MoveLogEntry::new(
                Duration::from_millis(1500),
                Command::new(128, 0, 0),
                Command::new(64, 0, 0),
            ),
            MoveLogEntry::new(
                Duration::from_micros(250_125),
                Command::new(10, 1, 1),
                Command::new(5, 2, 1),
            ),
            MoveLogEntry::SENTINEL,
        ])
    }

    #[test]
    fn test_entry_to_line() {
        let entry = MoveLogEntry::new(
            Duration::from_millis(1500),
            Command::new(128, 0, 0),
            Command::new(64, 0, 0),
        );
        assert_eq!(entry.to_line(), "1.500000 128 0 0 64 0 0");
        assert_eq!(MoveLogEntry::SENTINEL.to_line(), "0.000000 0 0 0 0 0 0");
    }

    #[test]
    fn test_parse_line() {
        let entry = MoveLogEntry::parse_line("2.250000 16 2 1 32 1 1").unwrap();
        assert_eq!(entry.elapsed, Duration::from_millis(2250));
        assert_eq!(entry.forward, Command::new(16, 2, 1));
        assert_eq!(entry.reverse, Command::new(32, 1, 1));
    }

    #[test]
    fn test_parse_line_rejects_malformed() {
        assert!(MoveLogEntry::parse_line("1.0 0 0 0 0 0").is_err());
        assert!(MoveLogEntry::parse_line("1.0 0 0 0 0 0 0 0").is_err());
        assert!(MoveLogEntry::parse_line("abc 0 0 0 0 0 0").is_err());
        assert!(MoveLogEntry::parse_line("1.0 x 0 0 0 0 0").is_err());
        assert!(MoveLogEntry::parse_line("1.0 256 0 0 0 0 0").is_err());
        assert!(MoveLogEntry::parse_line("-1.0 0 0 0 0 0 0").is_err());
        assert!(MoveLogEntry::parse_line("nan 0 0 0 0 0 0").is_err());
        // 打包字节中存在值为 3 的位
        assert!(MoveLogEntry::parse_line("1.0 3 0 0 0 0 0").is_err());
        // 灯光字节只能是 0 或 1
        assert!(MoveLogEntry::parse_line("1.0 0 0 2 0 0 0").is_err());
    }

    #[test]
    fn test_runtime() {
        let program = sample();
        assert_eq!(program.runtime(), Duration::from_micros(1_750_125));
        assert_eq!(ProgramLog::new().runtime(), Duration::ZERO);
    }

    #[test]
    fn test_backfill_last() {
        let mut program = ProgramLog::new();
        assert!(!program.backfill_last(Duration::from_secs(1)));

        program.push(MoveLogEntry::new(
            Duration::ZERO,
            Command::new(1, 0, 0),
            Command::new(2, 0, 0),
        ));
        assert!(program.backfill_last(Duration::from_secs(3)));
        assert_eq!(program.entries()[0].elapsed, Duration::from_secs(3));
    }

    #[test]
    fn test_write_format() {
        let mut buffer = Vec::new();
        sample().write_to(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(
            text,
            "1.500000 128 0 0 64 0 0\n0.250125 10 1 1 5 2 1\n0.000000 0 0 0 0 0 0\n"
        );
    }

    #[test]
    fn test_read_skips_blank_lines() {
        let text = "1.000000 64 0 0 128 0 0\n\n0.000000 0 0 0 0 0 0\n";
        let program = ProgramLog::read_from(text.as_bytes()).unwrap();
        assert_eq!(program.len(), 2);
        assert_eq!(program.entries()[1], MoveLogEntry::SENTINEL);
    }

    #[test]
    fn test_read_reports_line_number() {
        let text = "1.000000 64 0 0 128 0 0\n0.5 1 2\n";
        match ProgramLog::read_from(text.as_bytes()) {
            Err(ProgramError::Parse { line, reason }) => {
                assert_eq!(line, 2);
                assert!(reason.contains("expected 7 fields"), "reason: {}", reason);
            },
            other => panic!("Expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("program.txt");

        let program = sample();
        program.save(&path).unwrap();
        let loaded = ProgramLog::load(&path).unwrap();

        assert_eq!(loaded, program);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ProgramLog::load(dir.path().join("missing.txt")).unwrap_err();
        assert!(matches!(err, ProgramError::Io(_)));
    }
}
