//! 配置文件变更通知。
//!
//! 监听配置文件所在目录（编辑器通常是"写临时文件再重命名"，直接监听文件会丢事件），
//! 只对目标文件名的创建/修改/删除事件触发回调。
//! 去抖在尾沿触发：事件停止 `debounce` 之后才回调一次，保存过程中的截断不会被单独通知。

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::error::Result;

const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// 持有底层 watcher，drop 即停止监听
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    dir: PathBuf,
}

impl ConfigWatcher {
    pub fn spawn<F>(file_path: &Path, on_change: F) -> Result<Self>
    where
        F: Fn() + Send + 'static,
    {
        Self::spawn_with_debounce(file_path, DEFAULT_DEBOUNCE, on_change)
    }

    pub fn spawn_with_debounce<F>(
        file_path: &Path,
        debounce: Duration,
        on_change: F,
    ) -> Result<Self>
    where
        F: Fn() + Send + 'static,
    {
        let dir = match file_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name = file_path.file_name().map(|n| n.to_os_string());

        let (tx, rx) = mpsc::channel::<EventKind>();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!("config watch error: {}", e);
                    return;
                }
            };
            if is_relevant(&event, file_name.as_ref()) {
                let _ = tx.send(event.kind);
            }
        })?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        tracing::debug!("watching {:?} for config changes", dir);

        // watcher 被 drop 时发送端随之释放，线程自行退出
        thread::Builder::new()
            .name("config-watch".to_string())
            .spawn(move || debounce_loop(&rx, debounce, on_change))?;

        Ok(Self {
            _watcher: watcher,
            dir,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// 收到第一个事件后，等到连续 `debounce` 内没有新事件再回调
fn debounce_loop<F: Fn()>(events: &Receiver<EventKind>, debounce: Duration, on_change: F) {
    while let Ok(mut last) = events.recv() {
        loop {
            match events.recv_timeout(debounce) {
                Ok(kind) => last = kind,
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => return,
            }
        }
        tracing::debug!("config change detected: {:?}", last);
        on_change();
    }
}

fn is_relevant(event: &Event, file_name: Option<&OsString>) -> bool {
    let kind_matches = matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    );
    let Some(file_name) = file_name else {
        return kind_matches;
    };
    kind_matches
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(file_name.as_os_str()))
}
