//! 平台动作：写剪贴板、在浏览器中打开 URL。
//! 面板只依赖 trait，测试中替换为记录调用的实现。

use std::io::Write;
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{PanelError, Result};

pub trait Clipboard {
    fn write_text(&mut self, text: &str) -> Result<()>;
}

pub trait UrlOpener {
    fn open_url(&mut self, url: &str) -> Result<()>;
}

/// 系统剪贴板：依次尝试平台命令，全部失败时退回 OSC 52 终端转义序列
#[derive(Debug, Default)]
pub struct SystemClipboard;

#[cfg(target_os = "macos")]
const CLIPBOARD_COMMANDS: &[(&str, &[&str])] = &[("pbcopy", &[])];

#[cfg(target_os = "windows")]
const CLIPBOARD_COMMANDS: &[(&str, &[&str])] = &[("clip", &[])];

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const CLIPBOARD_COMMANDS: &[(&str, &[&str])] = &[
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
];

impl SystemClipboard {
    fn pipe_to(program: &str, args: &[&str], text: &str) -> std::io::Result<bool> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(text.as_bytes()) {
                drop(stdin);
                let _ = child.wait();
                return Err(e);
            }
        }
        Ok(child.wait()?.success())
    }
}

impl Clipboard for SystemClipboard {
    fn write_text(&mut self, text: &str) -> Result<()> {
        for (program, args) in CLIPBOARD_COMMANDS {
            match Self::pipe_to(program, args, text) {
                Ok(true) => return Ok(()),
                Ok(false) => tracing::debug!("{} exited with failure", program),
                Err(e) => tracing::debug!("{} unavailable: {}", program, e),
            }
        }

        // 退回到终端剪贴板（OSC 52），大多数现代终端支持
        tracing::warn!("no clipboard command available, falling back to OSC 52");
        let mut stdout = std::io::stdout();
        stdout
            .write_all(osc52(text).as_bytes())
            .and_then(|_| stdout.flush())
            .map_err(|e| PanelError::Clipboard(e.to_string()))
    }
}

/// `ESC ] 52 ; c ; <base64> BEL`
pub fn osc52(text: &str) -> String {
    format!("\x1b]52;c;{}\x07", STANDARD.encode(text.as_bytes()))
}

/// 用系统默认程序打开 URL，不等待结果
#[derive(Debug, Default)]
pub struct SystemOpener;

impl UrlOpener for SystemOpener {
    fn open_url(&mut self, url: &str) -> Result<()> {
        let mut command = if cfg!(target_os = "macos") {
            let mut c = Command::new("open");
            c.arg(url);
            c
        } else if cfg!(target_os = "windows") {
            let mut c = Command::new("cmd");
            c.args(["/C", "start", "", url]);
            c
        } else {
            let mut c = Command::new("xdg-open");
            c.arg(url);
            c
        };

        command.stdout(Stdio::null()).stderr(Stdio::null());
        spawn_detached(&mut command)
            .map(|_| ())
            .map_err(|e| PanelError::Open(format!("{}: {}", url, e)))
    }
}

/// 启动子进程后不等待结果，由后台线程回收，避免留下僵尸进程
fn spawn_detached(command: &mut Command) -> std::io::Result<JoinHandle<Option<ExitStatus>>> {
    let mut child = command.spawn()?;
    Ok(thread::spawn(move || child.wait().ok()))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_osc52() {
        assert_eq!(osc52("hi"), "\x1b]52;c;aGk=\x07");
    }

    #[cfg(unix)]
    #[test]
    fn test_spawn_detached_reaps_child() {
        let handle = spawn_detached(&mut Command::new("true")).unwrap();
        let status = handle.join().unwrap();
        assert!(status.is_some_and(|s| s.success()));
    }

    #[cfg(unix)]
    #[test]
    fn test_pipe_to_waits_for_child() {
        assert!(SystemClipboard::pipe_to("cat", &[], "hello").unwrap());
        assert!(!SystemClipboard::pipe_to("false", &[], "").unwrap());
        assert!(SystemClipboard::pipe_to("envpicker-no-such-program", &[], "x").is_err());
    }
}
