use std::io;
use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph, Wrap};
use ratatui::Terminal;

use crate::core::template::{tokenize, Segment};
use crate::core::{Panel, Preview};
use crate::models::{NormalizedValue, TemplateKind};
use crate::platform::{Clipboard, SystemClipboard, SystemOpener, UrlOpener};
use crate::storage::watch::ConfigWatcher;

const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// 焦点区域
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Projects,
    Environments,
    Patterns,
}

impl Focus {
    const ALL: [Focus; 3] = [Focus::Projects, Focus::Environments, Focus::Patterns];

    fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// 环境一行的展示数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvRow {
    pub name: String,
    pub description: Option<String>,
    pub value: Option<NormalizedValue>,
    pub position: Option<usize>,
    pub count: usize,
}

/// TUI 应用状态
pub struct App {
    panel: Panel,
    clipboard: Box<dyn Clipboard>,
    opener: Box<dyn UrlOpener>,
    focus: Focus,
    status_message: String,
    running: bool,
    selected_project: usize,
    selected_env: usize,
    selected_pattern: usize,
    /// 当前项目的环境和模板预览，选择变化时重新计算
    env_rows: Vec<EnvRow>,
    previews: Vec<Preview>,
}

impl App {
    /// 创建 App 实例，使用系统剪贴板和浏览器
    pub fn new(config_path: &Path) -> Self {
        Self::with_parts(
            Panel::new(config_path),
            Box::new(SystemClipboard),
            Box::new(SystemOpener),
        )
    }

    pub fn with_parts(
        panel: Panel,
        clipboard: Box<dyn Clipboard>,
        opener: Box<dyn UrlOpener>,
    ) -> Self {
        let mut app = Self {
            panel,
            clipboard,
            opener,
            focus: Focus::Projects,
            status_message: "Ready".to_string(),
            running: true,
            selected_project: 0,
            selected_env: 0,
            selected_pattern: 0,
            env_rows: Vec::new(),
            previews: Vec::new(),
        };
        app.refresh_content();
        app
    }

    pub fn panel(&self) -> &Panel {
        &self.panel
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn selected_project(&self) -> usize {
        self.selected_project
    }

    pub fn selected_env(&self) -> usize {
        self.selected_env
    }

    pub fn selected_pattern(&self) -> usize {
        self.selected_pattern
    }

    pub fn env_rows(&self) -> &[EnvRow] {
        &self.env_rows
    }

    pub fn previews(&self) -> &[Preview] {
        &self.previews
    }

    /// 配置文件变化：整体重新加载，选择重新初始化
    pub fn reload(&mut self) {
        self.panel.reload();
        self.refresh_content();
        match self.panel.load_error() {
            Some(err) => self.set_status(format!("Error: {}", err)),
            None => self.set_status("Config reloaded"),
        }
    }

    /// 根据当前项目和选择重新计算环境行和模板预览
    pub fn refresh_content(&mut self) {
        self.env_rows.clear();
        self.previews.clear();

        let project_count = self.panel.projects().len();
        if project_count == 0 {
            self.selected_project = 0;
            self.selected_env = 0;
            self.selected_pattern = 0;
            return;
        }
        if self.selected_project >= project_count {
            self.selected_project = project_count - 1;
        }

        let pi = self.selected_project;
        let envs: Vec<(String, Option<String>)> = match self.panel.project(pi) {
            Ok(p) => p
                .envs
                .iter()
                .map(|e| (e.name.clone(), e.description.clone()))
                .collect(),
            Err(_) => Vec::new(),
        };

        let selection = self.panel.selection(pi).cloned().unwrap_or_default();
        for (name, description) in envs {
            let values = self.panel.environment_values(pi, &name).unwrap_or_default();
            let position = selection
                .get(&name)
                .and_then(|c| values.iter().position(|v| &v.value == c));
            let value = position.and_then(|i| values.get(i).cloned());
            self.env_rows.push(EnvRow {
                name,
                description,
                value,
                position,
                count: values.len(),
            });
        }

        self.previews = match self.panel.render_project(pi) {
            Ok(previews) => previews,
            Err(e) => {
                tracing::warn!("failed to render project #{}: {}", pi, e);
                Vec::new()
            }
        };

        // 修正选中索引
        self.selected_env = clamp_index(self.selected_env, self.env_rows.len());
        self.selected_pattern = clamp_index(self.selected_pattern, self.previews.len());
    }

    /// 启动 TUI 事件循环
    pub fn run(&mut self) -> io::Result<()> {
        let (tx, rx) = mpsc::channel();
        let _watcher = match ConfigWatcher::spawn(self.panel.config_path(), move || {
            let _ = tx.send(());
        }) {
            Ok(w) => Some(w),
            Err(e) => {
                tracing::warn!("config watching disabled: {}", e);
                self.set_status(format!("Watch disabled: {}", e));
                None
            }
        };

        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.event_loop(&mut terminal, &rx);

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        changes: &mpsc::Receiver<()>,
    ) -> io::Result<()> {
        while self.running {
            terminal.draw(|frame| self.render(frame))?;

            if event::poll(POLL_INTERVAL)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }

            // 合并连续的变更通知
            if changes.try_recv().is_ok() {
                while changes.try_recv().is_ok() {}
                self.reload();
            }
        }
        Ok(())
    }

    /// 处理键盘输入
    fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') => self.running = false,
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::BackTab => self.focus = self.focus.prev(),
            KeyCode::Char('r') => self.reload(),
            KeyCode::Char('c') => self.copy_selected(),
            KeyCode::Char('o') => self.open_selected(),
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::Left if self.focus == Focus::Environments => self.cycle_env_value(-1),
            KeyCode::Right if self.focus == Focus::Environments => self.cycle_env_value(1),
            KeyCode::Enter => match self.focus {
                Focus::Projects => self.focus = Focus::Environments,
                Focus::Environments => self.cycle_env_value(1),
                Focus::Patterns => self.copy_selected(),
            },
            _ => {}
        }
    }

    fn move_selection(&mut self, step: isize) {
        match self.focus {
            Focus::Projects => {
                let count = self.panel.projects().len();
                let next = step_index(self.selected_project, count, step);
                if next != self.selected_project {
                    self.selected_project = next;
                    self.selected_env = 0;
                    self.selected_pattern = 0;
                    self.refresh_content();
                }
            }
            Focus::Environments => {
                self.selected_env = step_index(self.selected_env, self.env_rows.len(), step);
            }
            Focus::Patterns => {
                self.selected_pattern =
                    step_index(self.selected_pattern, self.previews.len(), step);
            }
        }
    }

    /// 切换当前环境的值（代替下拉框），并重新渲染所有模板
    fn cycle_env_value(&mut self, step: isize) {
        let Some(row) = self.env_rows.get(self.selected_env) else {
            return;
        };
        let name = row.name.clone();
        match self.panel.cycle_value(self.selected_project, &name, step) {
            Ok(value) => {
                self.refresh_content();
                self.set_status(format!("{} = {}", name, value));
            }
            Err(e) => self.set_status(format!("Error: {}", e)),
        }
    }

    fn copy_selected(&mut self) {
        let Some(text) = self.previews.get(self.selected_pattern).map(|p| p.text.clone()) else {
            self.set_status("Nothing to copy");
            return;
        };
        match self.clipboard.write_text(&text) {
            Ok(()) => self.set_status("Copied!"),
            Err(e) => {
                tracing::warn!("copy failed: {}", e);
                self.set_status(format!("Error: {}", e));
            }
        }
    }

    fn open_selected(&mut self) {
        let Some(preview) = self.previews.get(self.selected_pattern) else {
            self.set_status("Nothing to open");
            return;
        };
        if preview.kind != TemplateKind::Url {
            self.set_status("Only url patterns can be opened");
            return;
        }
        let url = preview.text.clone();
        match self.opener.open_url(&url) {
            Ok(()) => self.set_status(format!("Opened: {}", url)),
            Err(e) => self.set_status(format!("Error: {}", e)),
        }
    }

    /// 渲染整个界面
    fn render(&self, frame: &mut ratatui::Frame) {
        let area = frame.area();

        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(1),
                Constraint::Length(3),
            ])
            .split(area);

        self.render_title(frame, outer[0]);
        self.render_body(frame, outer[1]);
        self.render_status(frame, outer[2]);
    }

    fn render_title(&self, frame: &mut ratatui::Frame, area: Rect) {
        let mut title = format!("envpicker - {}", self.panel.config_path().display());
        if self.panel.storage().is_some_and(|s| s.is_default()) {
            title.push_str(" (built-in example)");
        }
        let title = Paragraph::new(title)
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(title, area);
    }

    fn render_body(&self, frame: &mut ratatui::Frame, area: Rect) {
        if let Some(err) = self.panel.load_error() {
            let content = Paragraph::new(format!("Config parse error: {}", err))
                .style(Style::default().fg(Color::Red))
                .wrap(Wrap { trim: false })
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(content, area);
            return;
        }

        if self.panel.projects().is_empty() {
            let hint = format!(
                "No projects configured.\nEdit {} to add projects.",
                self.panel.config_path().display()
            );
            let content = Paragraph::new(hint).block(Block::default().borders(Borders::ALL));
            frame.render_widget(content, area);
            return;
        }

        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(24), Constraint::Min(1)])
            .split(area);
        self.render_projects(frame, cols[0]);

        let env_height = u16::try_from(self.env_rows.len() + 2).unwrap_or(u16::MAX);
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(env_height), Constraint::Min(1)])
            .split(cols[1]);
        self.render_envs(frame, rows[0]);
        self.render_patterns(frame, rows[1]);
    }

    fn border_style(&self, focus: Focus) -> Style {
        if self.focus == focus {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        }
    }

    fn render_projects(&self, frame: &mut ratatui::Frame, area: Rect) {
        let items: Vec<ListItem> = self
            .panel
            .projects()
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let selected = i == self.selected_project;
                let style = if selected {
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                let prefix = if selected { "> " } else { "  " };
                let mut lines = vec![Line::from(Span::styled(
                    format!("{}{}", prefix, p.name),
                    style,
                ))];
                if let Some(desc) = &p.description {
                    lines.push(Line::from(Span::styled(
                        format!("  {}", desc),
                        Style::default().fg(Color::DarkGray),
                    )));
                }
                ListItem::new(lines)
            })
            .collect();

        let list = List::new(items).block(
            Block::default()
                .title(" Projects ")
                .borders(Borders::ALL)
                .border_style(self.border_style(Focus::Projects)),
        );
        frame.render_widget(list, area);
    }

    fn render_envs(&self, frame: &mut ratatui::Frame, area: Rect) {
        let items: Vec<ListItem> = self
            .env_rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let selected = i == self.selected_env && self.focus == Focus::Environments;
                let name_style = if selected {
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().add_modifier(Modifier::BOLD)
                };
                let value = row
                    .value
                    .as_ref()
                    .map(|v| v.display())
                    .unwrap_or_else(|| "-".to_string());
                let position = match row.position {
                    Some(p) => format!(" ({}/{})", p + 1, row.count),
                    None => String::new(),
                };
                let mut spans = vec![
                    Span::raw(if selected { "> " } else { "  " }),
                    Span::styled(row.name.clone(), name_style),
                    Span::raw(": "),
                    Span::styled(format!("< {} >", value), Style::default().fg(Color::Green)),
                    Span::styled(position, Style::default().fg(Color::DarkGray)),
                ];
                if let Some(desc) = &row.description {
                    spans.push(Span::styled(
                        format!("  # {}", desc),
                        Style::default().fg(Color::DarkGray),
                    ));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();

        let list = List::new(items).block(
            Block::default()
                .title(" Environments (←/→ to change) ")
                .borders(Borders::ALL)
                .border_style(self.border_style(Focus::Environments)),
        );
        frame.render_widget(list, area);
    }

    fn render_patterns(&self, frame: &mut ratatui::Frame, area: Rect) {
        let block = Block::default()
            .title(" Patterns (c=copy, o=open) ")
            .borders(Borders::ALL)
            .border_style(self.border_style(Focus::Patterns));

        if self.previews.is_empty() {
            frame.render_widget(Paragraph::new("No patterns.").block(block), area);
            return;
        }

        let items: Vec<ListItem> = self
            .previews
            .iter()
            .enumerate()
            .map(|(i, preview)| {
                let selected = i == self.selected_pattern && self.focus == Focus::Patterns;
                let header_style = if selected {
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::Cyan)
                };
                let name = preview
                    .name
                    .clone()
                    .unwrap_or_else(|| format!("pattern #{}", i + 1));
                let mut header = vec![
                    Span::raw(if selected { "> " } else { "  " }),
                    Span::styled(name, header_style),
                    Span::styled(
                        format!(" [{}]", preview.kind.as_str()),
                        Style::default().fg(Color::DarkGray),
                    ),
                ];
                if preview.unfilled {
                    header.push(Span::styled(" [unfilled]", Style::default().fg(Color::Red)));
                }

                let mut body = vec![Span::raw("    ")];
                body.extend(preview_spans(&preview.text));
                ListItem::new(vec![Line::from(header), Line::from(body), Line::from("")])
            })
            .collect();

        frame.render_widget(List::new(items).block(block), area);
    }

    fn render_status(&self, frame: &mut ratatui::Frame, area: Rect) {
        let status = Line::from(vec![
            Span::styled("Status: ", Style::default().fg(Color::DarkGray)),
            Span::styled(&self.status_message, Style::default().fg(Color::Green)),
            Span::raw(" | "),
            Span::styled(
                "q:Quit  Tab:Switch  ↑↓:Navigate  ←→:Value  c:Copy  o:Open  r:Reload",
                Style::default().fg(Color::DarkGray),
            ),
        ]);
        let bar = Paragraph::new(status).block(Block::default().borders(Borders::ALL));
        frame.render_widget(bar, area);
    }
}

/// 预览文本切分为 span，未填充的占位符高亮
pub fn preview_spans(text: &str) -> Vec<Span<'static>> {
    tokenize(text)
        .into_iter()
        .map(|segment| match segment {
            Segment::Literal(s) => Span::raw(s.to_string()),
            Segment::Placeholder { token, .. } => Span::styled(
                token.to_string(),
                Style::default()
                    .fg(Color::Red)
                    .add_modifier(Modifier::UNDERLINED),
            ),
        })
        .collect()
}

fn clamp_index(idx: usize, len: usize) -> usize {
    if len == 0 {
        0
    } else {
        idx.min(len - 1)
    }
}

fn step_index(idx: usize, len: usize, step: isize) -> usize {
    if len == 0 {
        return 0;
    }
    idx.saturating_add_signed(step).min(len - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::testing::{RecordingClipboard, RecordingOpener};
    use ratatui::backend::TestBackend;
    use tempfile::TempDir;

    const TWO_PROJECTS: &str = r#"projects:
  - name: api
    description: public api
    envs:
      - name: host
        values:
          - value: prod.example.com
            name: Production
          - staging.example.com
    patterns:
      - pattern: "https://{host}/v1/{missing}"
        type: url
        name: endpoint
      - pattern: "{host}"
        type: str
  - name: web
    envs:
      - name: region
        values: [eu, us]
    patterns:
      - pattern: "https://{region}.web.example.com//"
        type: url
"#;

    struct Harness {
        app: App,
        clipboard: RecordingClipboard,
        opener: RecordingOpener,
        _tmp: TempDir,
    }

    fn harness(yaml: Option<&str>) -> Harness {
        harness_with(yaml, RecordingClipboard::default())
    }

    fn harness_with(yaml: Option<&str>, clipboard: RecordingClipboard) -> Harness {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("envpicker.yaml");
        if let Some(yaml) = yaml {
            std::fs::write(&path, yaml).unwrap();
        }
        let opener = RecordingOpener::default();
        let app = App::with_parts(
            Panel::new(&path),
            Box::new(clipboard.clone()),
            Box::new(opener.clone()),
        );
        Harness {
            app,
            clipboard,
            opener,
            _tmp: tmp,
        }
    }

    #[test]
    fn test_initial_state() {
        let h = harness(None);
        assert_eq!(h.app.focus(), Focus::Projects);
        assert_eq!(h.app.status_message(), "Ready");
        assert!(h.app.is_running());
        assert_eq!(h.app.env_rows().len(), 4);
        assert_eq!(h.app.previews().len(), 2);
        assert_eq!(h.app.previews()[0].text, "https://example.com/base/1?a=b&x=y");
    }

    #[test]
    fn test_tab_cycles_focus() {
        let mut h = harness(None);
        h.app.handle_key(KeyCode::Tab);
        assert_eq!(h.app.focus(), Focus::Environments);
        h.app.handle_key(KeyCode::Tab);
        assert_eq!(h.app.focus(), Focus::Patterns);
        h.app.handle_key(KeyCode::Tab);
        assert_eq!(h.app.focus(), Focus::Projects);
        h.app.handle_key(KeyCode::BackTab);
        assert_eq!(h.app.focus(), Focus::Patterns);
    }

    #[test]
    fn test_quit() {
        let mut h = harness(None);
        h.app.handle_key(KeyCode::Char('q'));
        assert!(!h.app.is_running());
    }

    #[test]
    fn test_change_env_value_rerenders() {
        let mut h = harness(None);
        h.app.handle_key(KeyCode::Tab);
        h.app.handle_key(KeyCode::Right);

        assert_eq!(h.app.status_message(), "host = test.example.com");
        let row = &h.app.env_rows()[0];
        assert_eq!(row.position, Some(1));
        assert_eq!(row.value.as_ref().unwrap().label.as_deref(), Some("Test environment"));
        assert_eq!(
            h.app.previews()[0].text,
            "https://test.example.com/base/1?a=b&x=y"
        );
        assert_eq!(h.app.previews()[1].text, "test.example.com/base/1");
    }

    #[test]
    fn test_left_wraps_around() {
        let mut h = harness(None);
        h.app.handle_key(KeyCode::Tab);
        h.app.handle_key(KeyCode::Down);
        assert_eq!(h.app.selected_env(), 1);
        h.app.handle_key(KeyCode::Left);
        assert_eq!(h.app.status_message(), ":subscriptionId = /2");
        assert_eq!(h.app.previews()[1].text, "example.com/base/2");
    }

    #[test]
    fn test_left_right_ignored_outside_envs() {
        let mut h = harness(None);
        h.app.handle_key(KeyCode::Right);
        assert_eq!(h.app.status_message(), "Ready");
        assert_eq!(h.app.env_rows()[0].position, Some(0));
    }

    #[test]
    fn test_copy_selected_pattern() {
        let mut h = harness(None);
        h.app.handle_key(KeyCode::Tab);
        h.app.handle_key(KeyCode::Tab);
        h.app.handle_key(KeyCode::Down);
        h.app.handle_key(KeyCode::Char('c'));

        assert_eq!(h.app.status_message(), "Copied!");
        assert_eq!(
            *h.clipboard.written.lock().unwrap(),
            vec!["example.com/base/1".to_string()]
        );
    }

    #[test]
    fn test_enter_on_pattern_copies() {
        let mut h = harness(None);
        h.app.handle_key(KeyCode::BackTab);
        h.app.handle_key(KeyCode::Enter);
        assert_eq!(
            *h.clipboard.written.lock().unwrap(),
            vec!["https://example.com/base/1?a=b&x=y".to_string()]
        );
    }

    #[test]
    fn test_copy_failure_is_reported() {
        let clipboard = RecordingClipboard {
            fail: true,
            ..Default::default()
        };
        let mut h = harness_with(None, clipboard);
        h.app.handle_key(KeyCode::Char('c'));
        assert!(h.app.status_message().starts_with("Error:"));
        assert!(h.app.is_running());
    }

    #[test]
    fn test_copy_unfilled_is_allowed() {
        let mut h = harness(Some(TWO_PROJECTS));
        assert!(h.app.previews()[0].unfilled);
        h.app.handle_key(KeyCode::Char('c'));
        assert_eq!(
            *h.clipboard.written.lock().unwrap(),
            vec!["https://prod.example.com/v1/{missing}".to_string()]
        );
    }

    #[test]
    fn test_open_url_pattern() {
        let mut h = harness(None);
        h.app.handle_key(KeyCode::Char('o'));
        assert_eq!(
            *h.opener.opened.lock().unwrap(),
            vec!["https://example.com/base/1?a=b&x=y".to_string()]
        );
        assert!(h.app.status_message().starts_with("Opened:"));
    }

    #[test]
    fn test_open_str_pattern_refused() {
        let mut h = harness(None);
        h.app.handle_key(KeyCode::BackTab);
        h.app.handle_key(KeyCode::Down);
        h.app.handle_key(KeyCode::Char('o'));
        assert!(h.opener.opened.lock().unwrap().is_empty());
        assert_eq!(h.app.status_message(), "Only url patterns can be opened");
    }

    #[test]
    fn test_switch_project() {
        let mut h = harness(Some(TWO_PROJECTS));
        assert_eq!(h.app.env_rows()[0].name, "host");

        h.app.handle_key(KeyCode::Down);
        assert_eq!(h.app.selected_project(), 1);
        assert_eq!(h.app.env_rows()[0].name, "region");
        assert_eq!(h.app.previews()[0].text, "https://eu.web.example.com/");

        h.app.handle_key(KeyCode::Down);
        assert_eq!(h.app.selected_project(), 1);
    }

    #[test]
    fn test_selection_survives_project_switch() {
        let mut h = harness(Some(TWO_PROJECTS));
        h.app.handle_key(KeyCode::Tab);
        h.app.handle_key(KeyCode::Right);
        h.app.handle_key(KeyCode::BackTab);
        h.app.handle_key(KeyCode::Down);
        h.app.handle_key(KeyCode::Up);

        assert_eq!(h.app.previews()[1].text, "staging.example.com");
    }

    #[test]
    fn test_reload_resets_selection() {
        let mut h = harness(Some(TWO_PROJECTS));
        h.app.handle_key(KeyCode::Tab);
        h.app.handle_key(KeyCode::Right);
        assert_eq!(h.app.previews()[1].text, "staging.example.com");

        h.app.handle_key(KeyCode::Char('r'));
        assert_eq!(h.app.status_message(), "Config reloaded");
        assert_eq!(h.app.previews()[1].text, "prod.example.com");
    }

    #[test]
    fn test_reload_picks_up_changes() {
        let mut h = harness(Some(TWO_PROJECTS));
        h.app.handle_key(KeyCode::Down);
        assert_eq!(h.app.selected_project(), 1);

        let path = h.app.panel().config_path().to_path_buf();
        std::fs::write(&path, "projects:\n  - name: only\n").unwrap();
        h.app.reload();

        assert_eq!(h.app.selected_project(), 0);
        assert!(h.app.env_rows().is_empty());
        assert!(h.app.previews().is_empty());
    }

    #[test]
    fn test_empty_config() {
        let mut h = harness(Some("projects: []\n"));
        assert!(h.app.env_rows().is_empty());
        h.app.handle_key(KeyCode::Down);
        h.app.handle_key(KeyCode::Char('c'));
        assert_eq!(h.app.status_message(), "Nothing to copy");
        h.app.handle_key(KeyCode::Char('o'));
        assert_eq!(h.app.status_message(), "Nothing to open");
    }

    #[test]
    fn test_invalid_config_reload_reports_error() {
        let mut h = harness(Some(TWO_PROJECTS));
        let path = h.app.panel().config_path().to_path_buf();
        std::fs::write(&path, "projects:\n  - envs: []\n").unwrap();
        h.app.reload();

        assert!(h.app.status_message().starts_with("Error:"));
        assert!(h.app.previews().is_empty());
    }

    #[test]
    fn test_preview_spans_highlight_unfilled() {
        let spans = preview_spans("a{b}c");
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[1].content, "{b}");
        assert_eq!(spans[1].style.fg, Some(Color::Red));
        assert_eq!(spans[0].style.fg, None);
    }

    #[test]
    fn test_render_smoke() {
        let h = harness(Some(TWO_PROJECTS));
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| h.app.render(frame)).unwrap();

        let buffer = terminal.backend().buffer();
        let text: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Projects"));
        assert!(text.contains("endpoint"));
        assert!(text.contains("[unfilled]"));
    }

    #[test]
    fn test_render_error_state() {
        let h = harness(Some("projects: nope\n"));
        let mut terminal = Terminal::new(TestBackend::new(120, 20)).unwrap();
        terminal.draw(|frame| h.app.render(frame)).unwrap();

        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("Config parse error"));
    }

    #[test]
    fn test_step_index() {
        assert_eq!(step_index(0, 3, -1), 0);
        assert_eq!(step_index(2, 3, 1), 2);
        assert_eq!(step_index(1, 3, 1), 2);
        assert_eq!(step_index(0, 0, 1), 0);
        assert_eq!(clamp_index(5, 2), 1);
    }
}
