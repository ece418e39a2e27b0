//! TUI widget rendering: header, document list, viewer, notice line, status
//! bar, and the modal dialogs.

use std::collections::BTreeMap;

use ratatui::Frame;
use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};

use crate::mark::Mark;
use crate::navigator::{Navigator, Notice, NoticeLevel, Viewer};
use crate::settings::MarkColors;
use crate::tui::dialog::{Dialog, ExportDialog, FilterDialog, FilterField};
use crate::tui::layout::PaneLayout;

/// Background colour per mark.
#[derive(Debug, Clone)]
pub struct Palette {
    colors: BTreeMap<Mark, Color>,
}

impl Palette {
    /// Colours from settings. Unparsable entries fall back to a terminal
    /// colour and are returned so the caller can report them.
    pub fn from_settings(colors: &MarkColors) -> (Self, Vec<String>) {
        let mut map = BTreeMap::new();
        let mut problems = Vec::new();
        for mark in Mark::ALL {
            let color = match colors.rgb(mark) {
                Ok((r, g, b)) => Color::Rgb(r, g, b),
                Err(e) => {
                    problems.push(e.to_string());
                    fallback(mark)
                }
            };
            map.insert(mark, color);
        }
        (Self { colors: map }, problems)
    }

    pub fn color(&self, mark: Mark) -> Color {
        self.colors.get(&mark).copied().unwrap_or_else(|| fallback(mark))
    }
}

fn fallback(mark: Mark) -> Color {
    match mark {
        Mark::A => Color::LightRed,
        Mark::B => Color::LightBlue,
    }
}

/// Everything one frame needs.
pub struct Screen<'a> {
    pub navigator: &'a Navigator,
    pub palette: &'a Palette,
    pub source: &'a str,
    pub layout: &'a PaneLayout,
    pub scroll: u16,
    pub hints: &'a str,
    pub busy: bool,
    pub dialog: Option<&'a Dialog>,
}

/// Main layout rendering.
pub fn render(frame: &mut Frame, screen: &Screen<'_>, list_state: &mut ListState) {
    let [header_area, body_area, notice_area, status_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    render_header(frame, header_area, screen);

    let [sidebar_area, viewer_area] = screen.layout.split(body_area);
    render_sidebar(frame, sidebar_area, screen, list_state);
    render_viewer(frame, viewer_area, screen);

    render_notice(frame, notice_area, screen.navigator.notice());
    render_status(frame, status_area, screen);

    match screen.dialog {
        Some(Dialog::Filter(d)) => render_filter_dialog(frame, d),
        Some(Dialog::Export(d)) => render_export_dialog(frame, d, screen.palette),
        None => {}
    }
}

/// Area of the two panes for a terminal of `area`; mouse handling needs it
/// outside of a draw.
pub fn body_area(area: Rect) -> Rect {
    let [_, body, _, _] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(area);
    body
}

fn render_header(frame: &mut Frame, area: Rect, screen: &Screen<'_>) {
    let mut spans = vec![
        Span::styled(
            " docmark ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" :: {} ", screen.source)),
    ];
    if screen.busy {
        spans.push(Span::styled("working…", Style::default().fg(Color::Yellow)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_sidebar(frame: &mut Frame, area: Rect, screen: &Screen<'_>, state: &mut ListState) {
    let session = screen.navigator.session();
    let items: Vec<ListItem> = session
        .documents()
        .iter()
        .map(|name| {
            let mark = session.mark_of(name);
            let badge = mark.map(|m| format!("[{m}] ")).unwrap_or_else(|| "    ".into());
            let style = match mark {
                Some(m) => Style::default().bg(screen.palette.color(m)).fg(Color::Black),
                None => Style::default(),
            };
            ListItem::new(Line::from(vec![Span::raw(badge), Span::raw(name.clone())])).style(style)
        })
        .collect();

    // Selecting the cursor row keeps it scrolled into view.
    state.select(session.cursor());

    let title = format!(" documents ({}) ", session.len());
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED | Modifier::BOLD))
        .highlight_symbol("▶ ");
    frame.render_stateful_widget(list, area, state);
}

fn render_viewer(frame: &mut Frame, area: Rect, screen: &Screen<'_>) {
    let viewer = screen.navigator.viewer();
    let title = match viewer.filename() {
        Some(name) => {
            let mark = screen
                .navigator
                .session()
                .mark_of(name)
                .map(|m| format!(" [{m}]"))
                .unwrap_or_default();
            format!(" {name}{mark} ")
        }
        None => " viewer ".to_string(),
    };
    let style = match viewer {
        Viewer::Empty | Viewer::Loading { .. } => Style::default().fg(Color::DarkGray),
        Viewer::Unreadable { .. } | Viewer::Failed { .. } => Style::default().fg(Color::Red),
        Viewer::Text { .. } | Viewer::Pdf { .. } => Style::default(),
    };

    let lines: Vec<Line> = viewer
        .lines()
        .into_iter()
        .map(|l| {
            if l.starts_with("── page ") {
                Line::styled(l, Style::default().fg(Color::DarkGray))
            } else {
                Line::raw(l)
            }
        })
        .collect();

    let paragraph = Paragraph::new(lines)
        .style(style)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false })
        .scroll((screen.scroll, 0));
    frame.render_widget(paragraph, area);
}

fn render_notice(frame: &mut Frame, area: Rect, notice: Option<&Notice>) {
    let Some(notice) = notice else {
        return;
    };
    let line = match notice.level {
        NoticeLevel::Error => {
            let mut spans = vec![
                Span::styled(
                    format!(" {notice} "),
                    Style::default().fg(Color::White).bg(Color::Red),
                ),
            ];
            if let Some(help) = &notice.help {
                spans.push(Span::styled(
                    format!(" help: {help}"),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            spans.push(Span::styled(" (Esc)", Style::default().fg(Color::DarkGray)));
            Line::from(spans)
        }
        NoticeLevel::Info => Line::from(vec![
            Span::styled(format!(" {notice} "), Style::default().fg(Color::Green)),
            Span::styled(" (Esc)", Style::default().fg(Color::DarkGray)),
        ]),
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn render_status(frame: &mut Frame, area: Rect, screen: &Screen<'_>) {
    let session = screen.navigator.session();
    let position = match session.cursor() {
        Some(i) => format!(" {}/{} ", i + 1, session.len()),
        None if session.is_empty() => " no documents ".to_string(),
        None => format!(" -/{} ", session.len()),
    };
    let counts = session.mark_counts();

    let mut spans = vec![Span::styled(position, Style::default().fg(Color::DarkGray))];
    for mark in Mark::ALL {
        spans.push(Span::raw("| "));
        spans.push(Span::styled(
            format!("{mark}: {} ", counts.get(&mark).copied().unwrap_or(0)),
            Style::default().fg(Color::Black).bg(screen.palette.color(mark)),
        ));
        spans.push(Span::raw(" "));
    }
    spans.push(Span::raw("| "));
    spans.push(Span::styled(
        screen.hints.to_string(),
        Style::default().fg(Color::DarkGray),
    ));
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Centered rectangle for a modal.
fn modal_area(area: Rect, width: u16, height: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    let [cell] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(row);
    cell
}

fn render_filter_dialog(frame: &mut Frame, dialog: &FilterDialog) {
    let area = modal_area(frame.area(), 60, 10);
    frame.render_widget(Clear, area);

    let mut lines: Vec<Line> = FilterField::ORDER
        .iter()
        .map(|field| {
            let focused = *field == dialog.focus;
            let marker = if focused { "▶ " } else { "  " };
            let value_style = if focused {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::raw(marker),
                Span::styled(
                    format!("{:<16}", field.label()),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(format!("{} ", dialog.value(*field)), value_style),
            ])
        })
        .collect();
    lines.push(Line::raw(""));
    lines.push(match &dialog.error {
        Some(e) => Line::styled(e.clone(), Style::default().fg(Color::Red)),
        None => Line::styled(
            "Tab next field · Enter apply · Esc cancel",
            Style::default().fg(Color::DarkGray),
        ),
    });

    let widget = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" filter "))
        .wrap(Wrap { trim: false });
    frame.render_widget(widget, area);
}

fn render_export_dialog(frame: &mut Frame, dialog: &ExportDialog, palette: &Palette) {
    let area = modal_area(frame.area(), 40, 7);
    frame.render_widget(Clear, area);

    let mut lines: Vec<Line> = Mark::ALL
        .iter()
        .enumerate()
        .map(|(i, mark)| {
            let check = if dialog.is_selected(*mark) { "[x]" } else { "[ ]" };
            let marker = if i == dialog.focus { "▶ " } else { "  " };
            Line::from(vec![
                Span::raw(format!("{marker}{check} ")),
                Span::styled(
                    format!(" {mark} "),
                    Style::default().fg(Color::Black).bg(palette.color(*mark)),
                ),
            ])
        })
        .collect();
    lines.push(Line::raw(""));
    lines.push(match &dialog.error {
        Some(e) => Line::styled(e.clone(), Style::default().fg(Color::Red)),
        None => Line::styled(
            "Space toggle · Enter export · Esc cancel",
            Style::default().fg(Color::DarkGray),
        ),
    });

    let widget = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" export "));
    frame.render_widget(widget, area);
}
