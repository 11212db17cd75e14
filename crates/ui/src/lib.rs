//! ratatui-based UI.

use std::io::{self, Stdout};
use std::time::{Duration, Instant};

use anyhow::Context as _;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{event, terminal};
use folio_application::{AppContext, FlipDirection, Transition};
use folio_core::{SectionKind, Theme};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{
    Block, Borders, Clear, HighlightSpacing, List, ListItem, ListState, Paragraph, Wrap,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const TICK_RATE: Duration = Duration::from_millis(250);
const SIDEBAR_WIDTH: u16 = 34;
const SCROLL_PAGE_LINES: u16 = 10;

pub struct Ui {
    ctx: AppContext,
    add_panel: AddChapterPanel,
    sidebar_cursor: usize,
    scroll: u16,
    notice: Option<String>,
    // The one cancelable flip timer. Armed when the controller stages a
    // flip, checked every loop pass, dropped on jump override or teardown.
    flip_deadline: Option<Instant>,
}

impl Ui {
    pub fn new(mut ctx: AppContext) -> Self {
        ctx.settings.normalize();
        let sidebar_cursor = ctx.nav.page();
        Self {
            ctx,
            add_panel: AddChapterPanel::default(),
            sidebar_cursor,
            scroll: 0,
            notice: None,
            flip_deadline: None,
        }
    }

    pub fn run(&mut self) -> anyhow::Result<()> {
        let mut terminal = setup_terminal()?;
        terminal.clear().ok();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.event_loop(&mut terminal)
        }));
        // A flip still pending at teardown is discarded without committing.
        self.flip_deadline = None;
        let restore_result = restore_terminal(&mut terminal);

        match (result, restore_result) {
            (Ok(Ok(())), Ok(())) => Ok(()),
            (Ok(Ok(())), Err(err)) => Err(err),
            (Ok(Err(err)), _) => Err(err),
            (Err(panic), Ok(())) => Err(anyhow::anyhow!(panic_to_string(panic))),
            (Err(panic), Err(err)) => Err(anyhow::anyhow!(
                "{}\n(additionally failed to restore terminal: {err})",
                panic_to_string(panic)
            )),
        }
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    ) -> anyhow::Result<()> {
        let mut needs_redraw = true;

        loop {
            if self.settle_flip() {
                needs_redraw = true;
            }

            if needs_redraw {
                terminal.draw(|frame| self.draw(frame.area(), frame))?;
                needs_redraw = false;
            }

            if !event::poll(self.poll_timeout())? {
                continue;
            }

            match event::read()? {
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                Event::Key(key) => {
                    if key.kind == KeyEventKind::Release {
                        continue;
                    }
                    needs_redraw = true;

                    if self.add_panel.open {
                        self.handle_add_panel_key(key);
                    } else if self.handle_reader_key(key) {
                        return Ok(());
                    }
                }
                _ => {}
            }
        }
    }

    /// Commits a staged flip once its delay has elapsed. The page index
    /// mutates only here, at the idle re-entry.
    fn settle_flip(&mut self) -> bool {
        let Some(deadline) = self.flip_deadline else {
            return false;
        };
        if Instant::now() < deadline {
            return false;
        }
        self.flip_deadline = None;
        self.ctx.nav.finish_flip();
        self.scroll = 0;
        self.sidebar_cursor = self.ctx.nav.page();
        true
    }

    fn poll_timeout(&self) -> Duration {
        match self.flip_deadline {
            Some(deadline) => deadline
                .saturating_duration_since(Instant::now())
                .min(TICK_RATE),
            None => TICK_RATE,
        }
    }

    fn arm_flip(&mut self) {
        self.flip_deadline = Some(Instant::now() + self.ctx.settings.flip_duration());
    }

    /// Returns true when the UI should quit.
    fn handle_reader_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return true,
            KeyCode::Right => {
                if self.ctx.nav.next(self.ctx.store.len()) {
                    self.arm_flip();
                }
            }
            KeyCode::Left => {
                if self.ctx.nav.prev() {
                    self.arm_flip();
                }
            }
            KeyCode::Char('f') | KeyCode::Char('F') => {
                self.ctx.nav.toggle_fullscreen();
            }
            KeyCode::Char('b') => {
                let page = self.ctx.nav.page();
                self.ctx.store.toggle_bookmark(page);
            }
            KeyCode::Char('s') => {
                self.ctx.nav.toggle_sidebar();
            }
            KeyCode::Char('t') => {
                self.ctx.settings.cycle_theme();
            }
            KeyCode::Char('a') => {
                self.add_panel = AddChapterPanel {
                    open: true,
                    ..AddChapterPanel::default()
                };
            }
            KeyCode::Up => {
                if self.ctx.nav.sidebar_open() {
                    self.sidebar_cursor = self.sidebar_cursor.saturating_sub(1);
                } else {
                    self.scroll = self.scroll.saturating_sub(1);
                }
            }
            KeyCode::Down => {
                if self.ctx.nav.sidebar_open() {
                    self.sidebar_cursor = (self.sidebar_cursor + 1).min(self.ctx.store.len() - 1);
                } else {
                    self.scroll = self.scroll.saturating_add(1);
                }
            }
            KeyCode::Enter => {
                if self.ctx.nav.sidebar_open()
                    && self.ctx.nav.jump_to(self.sidebar_cursor, self.ctx.store.len())
                {
                    // Direct selection overrides any in-flight flip.
                    self.flip_deadline = None;
                    self.scroll = 0;
                }
            }
            KeyCode::PageUp => {
                self.scroll = self.scroll.saturating_sub(SCROLL_PAGE_LINES);
            }
            KeyCode::PageDown => {
                self.scroll = self.scroll.saturating_add(SCROLL_PAGE_LINES);
            }
            _ => {}
        }
        false
    }

    fn handle_add_panel_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.add_panel = AddChapterPanel::default();
            }
            KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.submit_add_panel();
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                match self.add_panel.focus {
                    AddFocus::Title => self.add_panel.title.clear(),
                    AddFocus::Body => self.add_panel.body.clear(),
                    AddFocus::Kind => {}
                }
            }
            KeyCode::Tab => {
                self.add_panel.focus = self.add_panel.focus.next();
            }
            KeyCode::Enter => match self.add_panel.focus {
                AddFocus::Title => self.add_panel.focus = AddFocus::Kind,
                AddFocus::Kind => self.add_panel.focus = AddFocus::Body,
                AddFocus::Body => self.add_panel.body.push('\n'),
            },
            KeyCode::Left if self.add_panel.focus == AddFocus::Kind => {
                self.add_panel.kind = self.add_panel.kind.cycle_prev();
            }
            KeyCode::Right if self.add_panel.focus == AddFocus::Kind => {
                self.add_panel.kind = self.add_panel.kind.cycle_next();
            }
            KeyCode::Backspace => match self.add_panel.focus {
                AddFocus::Title => {
                    self.add_panel.title.pop();
                }
                AddFocus::Body => {
                    self.add_panel.body.pop();
                }
                AddFocus::Kind => {}
            },
            KeyCode::Char(ch) => {
                if ch.is_control() {
                    return;
                }
                match self.add_panel.focus {
                    AddFocus::Title => self.add_panel.title.push(ch),
                    AddFocus::Body => self.add_panel.body.push(ch),
                    AddFocus::Kind => {}
                }
            }
            _ => {}
        }
    }

    fn submit_add_panel(&mut self) {
        let title = self
            .ctx
            .store
            .append(
                &self.add_panel.title,
                self.add_panel.kind,
                &self.add_panel.body,
            )
            .title
            .clone();
        let label = if title.is_empty() {
            "(untitled)".to_string()
        } else {
            title
        };
        self.notice = Some(format!("added {label}"));
        self.add_panel = AddChapterPanel::default();
    }

    fn accent_color(&self) -> Color {
        match self.ctx.settings.theme {
            Theme::Light => Color::Blue,
            Theme::Dark => Color::Yellow,
        }
    }

    fn draw(&self, area: Rect, frame: &mut ratatui::Frame) {
        frame.render_widget(Clear, area);

        if self.ctx.nav.fullscreen() {
            self.draw_page(area, frame, true);
        } else if self.ctx.nav.sidebar_open() {
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
                .split(area);
            self.draw_sidebar(columns[0], frame);
            self.draw_page(columns[1], frame, false);
        } else {
            self.draw_page(area, frame, false);
        }

        if self.add_panel.open {
            self.draw_add_panel(area, frame);
        }
    }

    fn draw_sidebar(&self, area: Rect, frame: &mut ratatui::Frame) {
        let block = Block::default().borders(Borders::RIGHT).title(Span::styled(
            "Folio",
            Style::default().add_modifier(Modifier::BOLD),
        ));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0)])
            .split(inner);

        self.draw_progress(rows[0], frame);
        self.draw_contents_list(rows[1], frame);
    }

    fn draw_progress(&self, area: Rect, frame: &mut ratatui::Frame) {
        let progress = self.ctx.progress();
        let bar_width = area.width.saturating_sub(2).max(1) as usize;
        let lines = vec![
            Line::from(Span::styled(
                "Reading progress",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                progress_bar(progress.percent(), bar_width),
                Style::default().fg(self.accent_color()),
            )),
            Line::raw(format!(
                "page {} of {}",
                progress.current_page, progress.total_pages
            )),
        ];
        frame.render_widget(Paragraph::new(Text::from(lines)), area);
    }

    fn draw_contents_list(&self, area: Rect, frame: &mut ratatui::Frame) {
        let current = self.ctx.nav.page();
        let title_width = area.width.saturating_sub(7) as usize;

        let items: Vec<ListItem> = self
            .ctx
            .store
            .sections()
            .iter()
            .enumerate()
            .map(|(index, section)| {
                let marker = if self.ctx.store.is_bookmarked(index) {
                    " ◆"
                } else {
                    ""
                };
                let text = format!(
                    "{} {}{marker}",
                    kind_glyph(section.kind),
                    truncate_to_width(&section.title, title_width),
                );
                let style = if index == current {
                    Style::default()
                        .fg(self.accent_color())
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                ListItem::new(Line::styled(text, style))
            })
            .collect();

        let list = List::new(items)
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ")
            .highlight_spacing(HighlightSpacing::Always);
        let mut state = ListState::default();
        state.select(Some(self.sidebar_cursor));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_page(&self, area: Rect, frame: &mut ratatui::Frame, fullscreen: bool) {
        let (header_area, body_area, footer_area) = if fullscreen {
            (None, area, None)
        } else {
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3),
                    Constraint::Min(0),
                    Constraint::Length(2),
                ])
                .split(area);
            (Some(rows[0]), rows[1], Some(rows[2]))
        };

        let page = self.ctx.nav.page();
        let section = self.ctx.current_section();
        let flip_direction = match self.ctx.nav.transition() {
            Transition::Flipping { direction, .. } => Some(direction),
            Transition::Idle => None,
        };

        if let Some(header_area) = header_area {
            let mut spans = vec![Span::styled(
                section.title.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )];
            if self.ctx.store.is_bookmarked(page) {
                spans.push(Span::raw("  "));
                spans.push(Span::styled(
                    "◆ bookmarked",
                    Style::default().fg(self.accent_color()),
                ));
            }
            if let Some(direction) = flip_direction {
                let turning = match direction {
                    FlipDirection::Forward => "turning ▸",
                    FlipDirection::Backward => "◂ turning",
                };
                spans.push(Span::raw("  "));
                spans.push(Span::styled(
                    turning,
                    Style::default().add_modifier(Modifier::DIM),
                ));
            }
            let header = Paragraph::new(Line::from(spans))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .block(Block::default().borders(Borders::BOTTOM));
            frame.render_widget(header, header_area);
        }

        let mut body_lines: Vec<Line> = Vec::with_capacity(section.paragraphs.len() * 2);
        for (index, paragraph) in section.paragraphs.iter().enumerate() {
            if index > 0 {
                body_lines.push(Line::raw(""));
            }
            body_lines.push(Line::raw(paragraph.clone()));
        }
        let body_style = if flip_direction.is_some() {
            // The outgoing page stays visible but recedes until the flip
            // commits.
            Style::default().add_modifier(Modifier::DIM)
        } else {
            Style::default()
        };
        let body = Paragraph::new(Text::from(body_lines))
            .style(body_style)
            .wrap(Wrap { trim: false })
            .scroll((self.scroll, 0));
        frame.render_widget(body, body_area);

        if let Some(footer_area) = footer_area {
            let len = self.ctx.store.len();
            let guarded = flip_direction.is_some();
            let hint = |label: &str, enabled: bool| {
                let style = if enabled {
                    Style::default().add_modifier(Modifier::BOLD)
                } else {
                    Style::default().add_modifier(Modifier::DIM)
                };
                Span::styled(label.to_string(), style)
            };

            let mut spans = vec![
                hint("←", page > 0 && !guarded),
                Span::raw(" prev  "),
                hint("→", page + 1 < len && !guarded),
                Span::raw(" next  "),
            ];
            if self.ctx.nav.sidebar_open() {
                spans.push(hint("↑/↓", true));
                spans.push(Span::raw(" contents  "));
                spans.push(hint("Enter", true));
                spans.push(Span::raw(" open  "));
            } else {
                spans.push(hint("↑/↓", true));
                spans.push(Span::raw(" scroll  "));
            }
            spans.extend([
                hint("b", true),
                Span::raw(" bookmark  "),
                hint("a", true),
                Span::raw(" add  "),
                hint("s", true),
                Span::raw(" contents  "),
                hint("f", true),
                Span::raw(" fullscreen  "),
                hint("t", true),
                Span::raw(" theme  "),
                hint("Esc", true),
                Span::raw(" quit"),
            ]);

            if let Some(notice) = &self.notice {
                spans.push(Span::raw("  |  "));
                spans.push(Span::styled(
                    notice.clone(),
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                ));
            }

            let footer = Paragraph::new(Line::from(spans))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .block(Block::default().borders(Borders::TOP));
            frame.render_widget(footer, footer_area);
        }
    }

    fn draw_add_panel(&self, area: Rect, frame: &mut ratatui::Frame) {
        let popup_area = centered_rect(70, 70, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().borders(Borders::ALL).title(Span::styled(
            "Add chapter",
            Style::default().add_modifier(Modifier::BOLD),
        ));
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Min(0),
                Constraint::Length(2),
            ])
            .split(inner);

        let focus_style = Style::default()
            .fg(self.accent_color())
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
        let label_style = Style::default().add_modifier(Modifier::BOLD);
        let label_for = |focused: bool| if focused { focus_style } else { label_style };

        let title_line = Line::from(vec![
            Span::styled("Title: ", label_for(self.add_panel.focus == AddFocus::Title)),
            Span::raw(self.add_panel.title.clone()),
        ]);
        frame.render_widget(Paragraph::new(title_line), rows[0]);

        let mut kind_spans = vec![Span::styled(
            "Kind: ",
            label_for(self.add_panel.focus == AddFocus::Kind),
        )];
        let mut kind = SectionKind::Toc;
        for _ in 0..6 {
            kind_spans.push(kind_chip(
                kind,
                kind == self.add_panel.kind,
                self.add_panel.focus == AddFocus::Kind,
            ));
            kind_spans.push(Span::raw(" "));
            kind = kind.cycle_next();
        }
        frame.render_widget(Paragraph::new(Line::from(kind_spans)), rows[1]);

        let mut body_lines = vec![Line::from(Span::styled(
            "Text: ",
            label_for(self.add_panel.focus == AddFocus::Body),
        ))];
        for raw_line in self.add_panel.body.split('\n') {
            body_lines.push(Line::raw(raw_line.to_string()));
        }
        let body = Paragraph::new(Text::from(body_lines)).wrap(Wrap { trim: false });
        frame.render_widget(body, rows[2]);

        let help = Paragraph::new(Text::from(vec![
            Line::from(vec![
                Span::styled("Tab", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" field  "),
                Span::styled("←/→", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" kind  "),
                Span::styled("Ctrl+S", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" save  "),
                Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" cancel"),
            ]),
            Line::raw("A blank line starts a new paragraph."),
        ]))
        .wrap(Wrap { trim: true });
        frame.render_widget(help, rows[3]);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AddFocus {
    Title,
    Kind,
    Body,
}

impl AddFocus {
    fn next(self) -> Self {
        match self {
            AddFocus::Title => AddFocus::Kind,
            AddFocus::Kind => AddFocus::Body,
            AddFocus::Body => AddFocus::Title,
        }
    }
}

#[derive(Debug, Clone)]
struct AddChapterPanel {
    open: bool,
    focus: AddFocus,
    title: String,
    kind: SectionKind,
    body: String,
}

impl Default for AddChapterPanel {
    fn default() -> Self {
        Self {
            open: false,
            focus: AddFocus::Title,
            title: String::new(),
            kind: SectionKind::Chapter,
            body: String::new(),
        }
    }
}

fn kind_chip(kind: SectionKind, selected: bool, row_focused: bool) -> Span<'static> {
    let style = if selected && row_focused {
        Style::default().add_modifier(Modifier::REVERSED | Modifier::BOLD)
    } else if selected {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    Span::styled(format!(" {kind} "), style)
}

fn kind_glyph(kind: SectionKind) -> &'static str {
    match kind {
        SectionKind::Toc => "≡",
        SectionKind::Intro => "◈",
        SectionKind::Chapter => "▸",
        SectionKind::Bookmark => "◆",
        SectionKind::Note => "✎",
        SectionKind::Appendix => "§",
    }
}

fn progress_bar(percent: f32, width: usize) -> String {
    let filled = (((width as f32) * percent / 100.0).round() as usize).min(width);
    let mut bar = String::with_capacity(width * 3);
    for _ in 0..filled {
        bar.push('█');
    }
    for _ in filled..width {
        bar.push('░');
    }
    bar
}

fn truncate_to_width(text: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(text) <= max_width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0usize;
    for ch in text.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + ch_width + 1 > max_width {
            break;
        }
        out.push(ch);
        used += ch_width;
    }
    out.push('…');
    out
}

fn setup_terminal() -> anyhow::Result<Terminal<CrosstermBackend<Stdout>>> {
    terminal::enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, EnterAlternateScreen).context("enter alt screen")?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).context("create terminal")
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
    terminal::disable_raw_mode().context("disable raw mode")?;
    crossterm::execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("leave alt screen")?;
    Ok(())
}

fn panic_to_string(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic: (unknown payload)".to_string()
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
