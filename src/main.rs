pub mod api;
pub mod core;
pub mod error;
pub mod models;
pub mod platform;
pub mod storage;
pub mod tui;

use std::collections::HashMap;
use std::fs::File;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::api::RenderResponse;
use crate::core::{render_with, Panel, Preview};
use crate::error::PanelError;
use crate::storage::Storage;

/// 按环境选择值，渲染 URL / 字符串模板
#[derive(Parser, Debug)]
#[command(name = "envpicker", version)]
struct Cli {
    /// 配置文件路径
    #[arg(long, global = true, env = "ENVPICKER_CONFIG", default_value = "envpicker.yaml")]
    config: PathBuf,

    /// 日志写入文件（TUI 模式下不输出到终端）
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 终端面板（默认）
    Tui,
    /// 只读 HTTP 接口
    Serve {
        #[arg(long, default_value = "127.0.0.1:3000")]
        addr: SocketAddr,
    },
    /// 写入示例配置
    Init {
        /// 覆盖已存在的文件
        #[arg(long)]
        force: bool,
    },
    /// 渲染一个项目的所有模板并输出
    Render {
        /// 项目名，重名时取第一个
        #[arg(required_unless_present = "index")]
        project: Option<String>,
        /// 按序号（从 0 开始）选择项目
        #[arg(long, conflicts_with = "project")]
        index: Option<usize>,
        /// 覆盖某个环境的值，例如 --set host=example.com
        #[arg(long = "set", value_parser = parse_assignment)]
        sets: Vec<(String, String)>,
        /// 以 JSON 输出（与 HTTP 接口格式相同）
        #[arg(long)]
        json: bool,
    },
}

fn parse_assignment(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected name=value, got '{}'", s)),
    }
}

fn init_tracing(log_file: Option<&Path>, to_stderr: bool) -> std::io::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if let Some(path) = log_file {
        let file = File::options().create(true).append(true).open(path)?;
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false),
            )
            .with(filter)
            .init();
    } else if to_stderr {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init();
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Tui);

    // TUI 占用终端，只有指定 --log-file 时才记录日志
    let to_stderr = !matches!(command, Command::Tui);
    if let Err(e) = init_tracing(cli.log_file.as_deref(), to_stderr) {
        eprintln!("Failed to open log file: {}", e);
        return ExitCode::FAILURE;
    }

    match command {
        Command::Tui => {
            let mut app = tui::App::new(&cli.config);
            if let Err(e) = app.run() {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        }
        Command::Serve { addr } => {
            let panel = Panel::new(&cli.config);
            if let Some(err) = panel.load_error() {
                tracing::warn!("starting with a broken config: {}", err);
            }
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    eprintln!("Failed to start runtime: {}", e);
                    return ExitCode::FAILURE;
                }
            };
            if let Err(e) = runtime.block_on(api::serve(panel, addr)) {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        }
        Command::Init { force } => match Storage::write_default(&cli.config, force) {
            Ok(()) => println!("Wrote example config to {}", cli.config.display()),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        },
        Command::Render {
            project,
            index,
            sets,
            json,
        } => {
            let target = match (index, project) {
                (Some(i), _) => ProjectRef::Index(i),
                (None, Some(name)) => ProjectRef::Name(name),
                (None, None) => {
                    eprintln!("Error: a project name or --index is required");
                    return ExitCode::FAILURE;
                }
            };
            if let Err(e) = render(&cli.config, target, sets, json) {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }
    ExitCode::SUCCESS
}

enum ProjectRef {
    Name(String),
    Index(usize),
}

fn render(
    config: &Path,
    target: ProjectRef,
    sets: Vec<(String, String)>,
    json: bool,
) -> error::Result<()> {
    let panel = Panel::new(config);
    if let Some(err) = panel.load_error() {
        return Err(PanelError::NotLoaded(err.to_string()));
    }
    let index = match target {
        ProjectRef::Name(name) => panel.find_project(&name)?,
        ProjectRef::Index(i) => i,
    };
    let project = panel.project(index)?;
    let overrides: HashMap<String, String> = sets.into_iter().collect();
    let (selection, previews) = render_with(project, &overrides)?;

    if json {
        let response = RenderResponse {
            project: project.name.clone(),
            selection,
            previews,
        };
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    for line in format_previews(&previews) {
        println!("{}", line);
    }
    Ok(())
}

/// 每个预览一行：`name<TAB>text`，未填充的行以 `*` 开头，没有名字时用序号
fn format_previews(previews: &[Preview]) -> Vec<String> {
    previews
        .iter()
        .enumerate()
        .map(|(i, preview)| {
            let name = preview
                .name
                .clone()
                .unwrap_or_else(|| format!("pattern #{}", i + 1));
            let marker = if preview.unfilled { "*" } else { "" };
            format!("{}{}\t{}", marker, name, preview.text)
        })
        .collect()
}
