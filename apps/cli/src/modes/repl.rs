//! REPL 模式（交互式 Shell）
//!
//! 专用输入线程 + crossbeam 通道：保留历史记录，不阻塞 tokio。
//! 脉冲与回放在阻塞线程中执行，期间 Ctrl+C 触发急停。

use anyhow::{Result, bail};
use crossbeam_channel::{Receiver, bounded};
use roboarm_sdk::{
    ArmBuilder, ArmConfig, ArmTransport, JointKind, JointState, MoveOutcome, PlaybackOutcome,
    RoboticArm, UsbArmDevice, format_runtime,
};
use rustyline::Editor;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use tokio::task::JoinHandle;

use super::{ctrl_c, run_interruptible};
use crate::commands::config::load_config;
use crate::commands::r#move::resolve_pulse;
use crate::commands::{direction_labels, parse_direction};

/// 输入线程发出的 Ctrl+C 标记
const SIGINT: &str = "SIGINT";

/// REPL 命令
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Connect,
    Disconnect,
    /// `<joint> <direction> [pulse]`
    Joint {
        kind: JointKind,
        state: JointState,
        pulse: Option<String>,
    },
    Stop,
    Record,
    StopRecord,
    Clear,
    Save(PathBuf),
    Open(PathBuf),
    Play,
    Reverse,
    Status,
    Help,
    Exit,
}

/// 解析一行输入
pub fn parse_line(line: &str) -> Result<ReplCommand> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let Some((&head, args)) = parts.split_first() else {
        bail!("空命令");
    };

    let command = match head.to_ascii_lowercase().as_str() {
        "connect" => ReplCommand::Connect,
        "disconnect" => ReplCommand::Disconnect,
        "stop" => ReplCommand::Stop,
        "record" => ReplCommand::Record,
        "stop-record" => ReplCommand::StopRecord,
        "clear" => ReplCommand::Clear,
        "save" => ReplCommand::Save(path_arg(head, args)?),
        "open" => ReplCommand::Open(path_arg(head, args)?),
        "play" => ReplCommand::Play,
        "reverse" => ReplCommand::Reverse,
        "status" => ReplCommand::Status,
        "help" => ReplCommand::Help,
        "exit" | "quit" => ReplCommand::Exit,
        other => {
            let kind: JointKind = other
                .parse()
                .map_err(|_| anyhow::anyhow!("未知命令: {}", head))?;
            let direction = args
                .first()
                .ok_or_else(|| anyhow::anyhow!("缺少方向参数"))?;
            if args.len() > 2 {
                bail!("参数过多: {}", line.trim());
            }
            ReplCommand::Joint {
                kind,
                state: parse_direction(kind, direction)?,
                pulse: args.get(1).map(|s| s.to_string()),
            }
        },
    };
    Ok(command)
}

fn path_arg(command: &str, args: &[&str]) -> Result<PathBuf> {
    match args {
        [path] => Ok(PathBuf::from(path)),
        [] => bail!("{} 需要文件名", command),
        _ => bail!("{} 只接受一个文件名", command),
    }
}

/// REPL 会话（保持机械臂连接）
pub struct ReplSession<T: ArmTransport> {
    arm: Option<Arc<RoboticArm<T>>>,
    config: ArmConfig,
}

impl<T: ArmTransport + Send + 'static> ReplSession<T> {
    /// 创建未连接的会话
    pub fn new(config: ArmConfig) -> Self {
        Self { arm: None, config }
    }

    /// 使用已连接的机械臂创建会话
    pub fn with_arm(config: ArmConfig, arm: RoboticArm<T>) -> Self {
        Self {
            arm: Some(Arc::new(arm)),
            config,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.arm.is_some()
    }

    fn arm(&self) -> Result<Arc<RoboticArm<T>>> {
        match &self.arm {
            Some(arm) => Ok(Arc::clone(arm)),
            None => bail!("未连接，请先使用 connect 命令"),
        }
    }

    /// 断开连接（断开前停止机械臂）
    pub fn disconnect(&mut self) -> Result<()> {
        let Some(arm) = self.arm.take() else {
            println!("⚠️  未连接");
            return Ok(());
        };
        arm.stop()?;
        println!("✅ 已断开");
        Ok(())
    }

    /// 急停（空闲时 Ctrl+C）
    pub fn emergency_stop(&self) -> Result<()> {
        if let Some(arm) = &self.arm {
            arm.emergency_stop()?;
            eprintln!("🛑 已急停");
        }
        Ok(())
    }

    /// 状态描述
    pub fn status(&self) -> String {
        let Some(arm) = &self.arm else {
            return "未连接".to_string();
        };

        let snapshot = arm.status();
        let mut lines = vec![format!("已连接，最后指令: {}", snapshot.last_command)];
        for kind in JointKind::ALL {
            let status = snapshot.joint_status(kind);
            lines.push(format!("  {:<9} {}", kind.name(), status.result_text));
        }
        match snapshot.recorder_mode {
            Some(mode) => lines.push(format!(
                "录制器: {}，{} 步，时长 {}",
                if mode.is_recording() { "录制中" } else { "空闲" },
                snapshot.num_steps,
                format_runtime(snapshot.runtime)
            )),
            None => lines.push("录制器: 未挂载".to_string()),
        }
        lines.join("\n")
    }

    /// 执行命令，`interrupt` 只在脉冲与回放期间等待
    ///
    /// 返回 `false` 表示退出 REPL。
    pub async fn execute<I>(&mut self, command: ReplCommand, interrupt: I) -> Result<bool>
    where
        I: std::future::Future<Output = ()>,
    {
        match command {
            ReplCommand::Exit => {
                if self.is_connected() {
                    self.disconnect()?;
                }
                return Ok(false);
            },
            ReplCommand::Help => print_help(),
            ReplCommand::Status => println!("📊 {}", self.status()),
            ReplCommand::Disconnect => self.disconnect()?,
            ReplCommand::Connect => bail!("当前会话不支持 connect"),

            ReplCommand::Joint { kind, state, pulse } => {
                let pulse = resolve_pulse(pulse.as_deref(), self.config.motion.default_pulse_secs);
                let outcome = run_interruptible(
                    self.arm()?,
                    move |arm| arm.drive(kind, state, pulse),
                    interrupt,
                )
                .await?;
                match outcome {
                    MoveOutcome::Unchanged => println!("💤 指令未变化"),
                    MoveOutcome::Sent => println!("✅ {} -> {}", kind, state_label(kind, state)),
                    MoveOutcome::Pulsed => println!("✅ 脉冲完成，已停止"),
                    MoveOutcome::Interrupted => println!("🛑 脉冲已中止"),
                }
            },

            ReplCommand::Stop => {
                self.arm()?.stop()?;
                println!("✅ 已停止");
            },

            ReplCommand::Record => {
                self.arm()?.start_record()?;
                println!("⏺  开始录制");
            },
            ReplCommand::StopRecord => {
                let arm = self.arm()?;
                arm.stop_record()?;
                let snapshot = arm.status();
                println!(
                    "⏹  录制结束：{} 步，时长 {}",
                    snapshot.num_steps,
                    format_runtime(snapshot.runtime)
                );
            },
            ReplCommand::Clear => {
                self.arm()?.clear_record()?;
                println!("✅ 已清空录制");
            },

            ReplCommand::Save(path) => {
                let arm = self.arm()?;
                if arm.status().is_recording() {
                    println!("⚠️  录制中，请先 stop-record");
                } else {
                    arm.save(&path)?;
                    println!("💾 已保存到 {}", path.display());
                }
            },
            ReplCommand::Open(path) => {
                let arm = self.arm()?;
                if arm.status().is_recording() {
                    println!("⚠️  录制中，请先 stop-record");
                } else {
                    arm.open(&path)?;
                    let snapshot = arm.status();
                    println!(
                        "📂 已加载 {}：{} 步，时长 {}",
                        path.display(),
                        snapshot.num_steps,
                        format_runtime(snapshot.runtime)
                    );
                }
            },

            ReplCommand::Play => self.playback(false, interrupt).await?,
            ReplCommand::Reverse => self.playback(true, interrupt).await?,
        }
        Ok(true)
    }

    async fn playback<I>(&self, reverse: bool, interrupt: I) -> Result<()>
    where
        I: std::future::Future<Output = ()>,
    {
        let outcome = run_interruptible(
            self.arm()?,
            move |arm| if reverse { arm.play_reverse() } else { arm.play() },
            interrupt,
        )
        .await?;

        match outcome {
            PlaybackOutcome::Completed { steps_sent } => {
                println!("✅ 回放完成（{} 条指令）", steps_sent)
            },
            PlaybackOutcome::Cancelled { steps_sent } => {
                println!("🛑 回放已中止（已发送 {} 条指令）", steps_sent)
            },
            PlaybackOutcome::Skipped => println!("⚠️  录制中，请先 stop-record"),
        }
        Ok(())
    }
}

impl ReplSession<UsbArmDevice> {
    /// 连接到机械臂
    pub fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            println!("⚠️  已经连接");
            return Ok(());
        }

        println!("⏳ 连接到机械臂...");
        let arm = ArmBuilder::from_config(&self.config).recorder(true).build()?;
        // 设备状态未知，第一条指令不去重
        arm.resync();
        self.arm = Some(Arc::new(arm));
        println!("✅ 已连接");
        Ok(())
    }
}

fn state_label(kind: JointKind, state: JointState) -> &'static str {
    kind.label(state).unwrap_or("?")
}

/// REPL 输入（专用输入线程）
pub struct ReplInput {
    command_rx: Receiver<String>,
    pending: Option<JoinHandle<Option<String>>>,
    _input_thread: thread::JoinHandle<Result<()>>,
}

impl ReplInput {
    /// 创建专用输入线程（保留历史记录）
    pub fn new() -> Self {
        let (command_tx, command_rx) = bounded::<String>(10);

        let input_thread = thread::spawn(move || {
            use rustyline::history::DefaultHistory;

            let mut rl = Editor::<(), DefaultHistory>::new()
                .map_err(|e| anyhow::anyhow!("Failed to initialize readline: {}", e))?;

            let history_path = ".roboarm_history";
            rl.load_history(history_path).ok();

            println!("Roboarm CLI v{} - 交互式 Shell", env!("CARGO_PKG_VERSION"));
            println!("输入 'help' 查看帮助，'exit' 退出");
            println!();

            loop {
                match rl.readline("roboarm> ") {
                    Ok(line) => {
                        let line = line.trim().to_string();
                        if line.is_empty() {
                            continue;
                        }

                        let _ = rl.add_history_entry(line.clone());
                        let exiting = line == "exit" || line == "quit";
                        if command_tx.send(line).is_err() || exiting {
                            break;
                        }
                    },

                    Err(rustyline::error::ReadlineError::Interrupted) => {
                        println!("^C");
                        let _ = command_tx.send(SIGINT.to_string());
                    },

                    Err(rustyline::error::ReadlineError::Eof) => {
                        let _ = command_tx.send("exit".to_string());
                        break;
                    },

                    Err(err) => {
                        eprintln!("Error: {:?}", err);
                        break;
                    },
                }
            }

            rl.save_history(history_path).ok();
            Ok(())
        });

        Self {
            command_rx,
            pending: None,
            _input_thread: input_thread,
        }
    }

    /// 等待下一行输入；输入线程结束时返回 `None`
    ///
    /// 可以安全地在 `select!` 中取消：未取走的输入留给下一次调用。
    pub async fn recv_command(&mut self) -> Option<String> {
        let rx = self.command_rx.clone();
        let pending = self
            .pending
            .get_or_insert_with(|| tokio::task::spawn_blocking(move || rx.recv().ok()));
        let line = pending.await.ok().flatten();
        self.pending = None;
        line
    }

    /// 等待 Ctrl+C（来自输入线程或进程信号），期间的其他输入被丢弃
    pub async fn interrupted(&mut self) {
        loop {
            tokio::select! {
                line = self.recv_command() => match line.as_deref() {
                    Some(SIGINT) => return,
                    Some(other) => eprintln!("⚠️  操作进行中，已忽略: {}", other),
                    None => {
                        ctrl_c().await;
                        return;
                    },
                },
                _ = ctrl_c() => return,
            }
        }
    }
}

/// 运行 REPL 模式
pub async fn run_repl() -> Result<()> {
    let mut session = ReplSession::<UsbArmDevice>::new(load_config()?);
    let mut input = ReplInput::new();

    println!();
    println!("💡 提示: 使用 'connect' 连接到机械臂，'record' 开始录制");
    println!();

    while let Some(line) = input.recv_command().await {
        if line == SIGINT {
            if let Err(err) = session.emergency_stop() {
                eprintln!("❌ Error: {}", err);
            }
            continue;
        }

        let command = match parse_line(&line) {
            Ok(command) => command,
            Err(err) => {
                eprintln!("❌ Error: {}", err);
                print_help_hint(&line);
                continue;
            },
        };

        let result = match command {
            ReplCommand::Connect => session.connect().map(|_| true),
            command => session.execute(command, input.interrupted()).await,
        };

        match result {
            Ok(true) => {},
            Ok(false) => break,
            Err(err) => {
                eprintln!("❌ Error: {:#}", err);
                print_help_hint(&line);
            },
        }
    }

    if session.is_connected() {
        session.disconnect()?;
    }
    println!("👋 再见！");
    Ok(())
}

/// 打印帮助信息
fn print_help() {
    println!("可用命令:");
    println!("  connect                       连接到机械臂");
    println!("  disconnect                    停止并断开连接");
    println!("  <joint> <direction> [pulse]   驱动关节，可选脉冲时长（秒）");
    println!("  stop                          停止所有关节并关灯");
    println!("  record / stop-record          开始/结束录制");
    println!("  clear                         清空录制");
    println!("  save <file> / open <file>     保存/加载程序文件");
    println!("  play / reverse                正向/反向回放");
    println!("  status                        显示状态");
    println!("  help                          显示帮助");
    println!("  exit / quit                   退出");
    println!();
    println!("关节与方向:");
    for kind in JointKind::ALL {
        println!("  {:<9} {}", kind.name(), direction_labels(kind).join(" | "));
    }
    println!();
    println!("快捷键:");
    println!("  Ctrl+C                        急停（中止脉冲与回放）");
    println!("  Ctrl+D                        退出");
    println!();
}

/// 提供基于错误的帮助提示
fn print_help_hint(command: &str) {
    let head = command.split_whitespace().next().unwrap_or_default();
    if let Ok(kind) = head.parse::<JointKind>() {
        eprintln!(
            "💡 提示: 使用 '{} <{}> [秒]' 驱动关节",
            kind,
            direction_labels(kind).join("|")
        );
    } else if head == "save" || head == "open" {
        eprintln!("💡 提示: 使用 '{} program.txt'", head);
    } else {
        eprintln!("💡 提示: 输入 'help' 查看所有命令");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roboarm_sdk::Command;
    use roboarm_sdk::usb::MockTransport;
    use std::future::pending;

    fn session() -> (ReplSession<MockTransport>, MockTransport) {
        let mock = MockTransport::new();
        let arm = ArmBuilder::new().build_with(mock.clone());
        (ReplSession::with_arm(ArmConfig::default(), arm), mock)
    }

    async fn run(session: &mut ReplSession<MockTransport>, line: &str) -> bool {
        session.execute(parse_line(line).unwrap(), pending()).await.unwrap()
    }

    #[test]
    fn test_parse_line() {
        assert_eq!(parse_line("record").unwrap(), ReplCommand::Record);
        assert_eq!(parse_line("  QUIT ").unwrap(), ReplCommand::Exit);
        assert_eq!(
            parse_line("save prog.txt").unwrap(),
            ReplCommand::Save(PathBuf::from("prog.txt"))
        );
        assert_eq!(
            parse_line("shoulder up 0.5").unwrap(),
            ReplCommand::Joint {
                kind: JointKind::Shoulder,
                state: JointState::A,
                pulse: Some("0.5".to_string()),
            }
        );
        assert_eq!(
            parse_line("light on").unwrap(),
            ReplCommand::Joint {
                kind: JointKind::Light,
                state: JointState::A,
                pulse: None,
            }
        );
    }

    #[test]
    fn test_parse_line_errors() {
        assert!(parse_line("").is_err());
        assert!(parse_line("dance").is_err());
        assert!(parse_line("save").is_err());
        assert!(parse_line("open a b").is_err());
        assert!(parse_line("elbow").is_err());
        assert!(parse_line("elbow sideways").is_err());
        assert!(parse_line("elbow up 1 2").is_err());
    }

    #[tokio::test]
    async fn test_record_save_and_reverse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repl.txt");
        let (mut session, mock) = session();

        for line in ["record", "base clockwise", "wrist down", "stop", "stop-record"] {
            assert!(run(&mut session, line).await);
        }
        run(&mut session, &format!("save {}", path.display())).await;
        assert!(path.exists());

        mock.clear();
        run(&mut session, "reverse").await;
        assert_eq!(
            mock.written(),
            vec![
                Command::ZERO,
                Command::ZERO,
                Command::new(4, 2, 0),
                Command::new(0, 2, 0),
                Command::ZERO,
            ]
        );
    }

    #[tokio::test]
    async fn test_pulse_and_status() {
        let (mut session, mock) = session();

        run(&mut session, "gripper open 0.02").await;
        assert_eq!(mock.written(), vec![Command::new(2, 0, 0), Command::ZERO]);
        assert!(session.status().contains("gripper"));
    }

    #[tokio::test]
    async fn test_default_pulse_from_config() {
        let mock = MockTransport::new();
        let mut config = ArmConfig::default();
        config.motion.default_pulse_secs = Some(0.02);
        let mut session =
            ReplSession::with_arm(config, ArmBuilder::new().build_with(mock.clone()));

        run(&mut session, "elbow up").await;
        assert_eq!(mock.written(), vec![Command::new(16, 0, 0), Command::ZERO]);
    }

    #[tokio::test]
    async fn test_interrupt_stops_playback() {
        let (mut session, mock) = session();
        let arm = session.arm().unwrap();
        arm.with(|controller| {
            controller.recorder_mut().unwrap().load_program(roboarm_sdk::ProgramLog::from_entries(
                vec![
                    roboarm_sdk::MoveLogEntry::new(
                        std::time::Duration::from_secs(60),
                        Command::new(64, 0, 0),
                        Command::new(128, 0, 0),
                    ),
                    roboarm_sdk::MoveLogEntry::SENTINEL,
                ],
            ))
        });

        let keep_going = session
            .execute(
                ReplCommand::Play,
                tokio::time::sleep(std::time::Duration::from_millis(50)),
            )
            .await
            .unwrap();

        assert!(keep_going);
        assert_eq!(mock.written(), vec![Command::new(64, 0, 0), Command::ZERO]);
    }

    #[tokio::test]
    async fn test_exit_stops_arm() {
        let (mut session, mock) = session();
        run(&mut session, "base anticlockwise").await;
        assert!(!run(&mut session, "exit").await);
        assert!(!session.is_connected());
        assert_eq!(mock.last(), Some(Command::ZERO));
    }

    #[tokio::test]
    async fn test_commands_need_connection() {
        let mut session = ReplSession::<MockTransport>::new(ArmConfig::default());
        assert!(session.execute(ReplCommand::Play, pending()).await.is_err());
        assert!(session.status().contains("未连接"));
        assert!(session.execute(ReplCommand::Exit, pending()).await.is_ok());
    }
}
