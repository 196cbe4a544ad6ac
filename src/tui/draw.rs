use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use super::file_picker::FilePicker;
use super::modals::{LineInput, Modal, PhotoFormMode};
use super::screens::{
    DiaryListState, EditorFocus, EditorState, SaveStatus, Screen, SettingsState,
};
use super::{ToastLevel, Toasts, Tui};

const ACCENT: Color = Color::Cyan;
const KEY_COLOR: Color = Color::Yellow;
const DIM: Color = Color::DarkGray;
const SIDEBAR_WIDTH: u16 = 38;

pub(crate) fn draw(frame: &mut Frame<'_>, tui: &Tui) {
    let toast_height = clamp_u16(tui.toasts.items().len());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(toast_height),
            Constraint::Length(1),
        ])
        .split(frame.area());

    match &tui.screen {
        Screen::DiaryList(list) => render_diary_list(frame, list, chunks[0]),
        Screen::Editor(editor) => render_editor(frame, editor, chunks[0], tui.modal.is_none()),
        Screen::Settings(settings) => render_settings(frame, settings, chunks[0]),
    }
    render_toasts(frame, &tui.toasts, chunks[1]);
    frame.render_widget(Paragraph::new(footer_line(tui)), chunks[2]);

    if let Some(modal) = &tui.modal {
        let home = tui.app.layout().home().display().to_string();
        render_modal(frame, modal, &home, frame.area());
    }
}

fn titled_block(title: &str, focused: bool) -> Block<'static> {
    let border = if focused {
        Style::default().fg(ACCENT)
    } else {
        Style::default().fg(DIM)
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(Span::styled(
            format!(" {title} "),
            Style::default().add_modifier(Modifier::BOLD),
        ))
}

fn render_diary_list(frame: &mut Frame<'_>, list: &DiaryListState, area: Rect) {
    let block = titled_block("Pilgrim - Diaries", true);
    if list.diaries.is_empty() {
        let empty = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "No diaries yet. Press 'n' to create one.",
                Style::default().fg(DIM),
            )),
        ])
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem<'_>> = list
        .diaries
        .iter()
        .map(|diary| {
            ListItem::new(Line::from(vec![
                Span::styled(diary.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
                Span::raw("  "),
                Span::styled(
                    format!(
                        "{} entries, {} photos  ({})",
                        diary.entries, diary.photos, diary.directory_name
                    ),
                    Style::default().fg(DIM),
                ),
            ]))
        })
        .collect();

    let widget = List::new(items)
        .block(block)
        .highlight_style(Style::default().fg(Color::Black).bg(ACCENT))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    state.select(Some(list.selected));
    frame.render_stateful_widget(widget, area, &mut state);
}

fn status_style(status: SaveStatus) -> Style {
    match status {
        SaveStatus::New => Style::default().fg(ACCENT),
        SaveStatus::NotSaved => Style::default().fg(Color::Yellow),
        SaveStatus::Saved => Style::default().fg(Color::Green),
    }
}

fn render_editor(frame: &mut Frame<'_>, editor: &EditorState, area: Rect, show_cursor: bool) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(20), Constraint::Length(SIDEBAR_WIDTH)])
        .split(area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(3)])
        .split(columns[0]);

    let status = editor.status();
    let header = Line::from(vec![
        Span::styled(
            editor.diary.name.clone(),
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::raw(editor.position_label()),
        Span::raw("  "),
        Span::styled(editor.date.clone(), Style::default().fg(DIM)),
        Span::raw("  "),
        Span::styled(format!("[{}]", status.label()), status_style(status)),
    ]);
    frame.render_widget(Paragraph::new(header), rows[0]);

    let text_focused = editor.focus == EditorFocus::Text;
    let block = titled_block(&editor.title, text_focused);
    let inner = block.inner(rows[1]);
    let (row, col) = editor.buffer.cursor();
    let scroll_y = row.saturating_sub(usize::from(inner.height.saturating_sub(1)));
    let scroll_x = col.saturating_sub(usize::from(inner.width.saturating_sub(1)));

    let lines: Vec<Line<'_>> = editor
        .buffer
        .lines()
        .iter()
        .map(|line| highlight_references(line))
        .collect();
    let body = Paragraph::new(lines)
        .block(block)
        .scroll((clamp_u16(scroll_y), clamp_u16(scroll_x)));
    frame.render_widget(body, rows[1]);

    if show_cursor && text_focused {
        let x = inner.x + clamp_u16(col - scroll_x);
        let y = inner.y + clamp_u16(row - scroll_y);
        frame.set_cursor_position((x, y));
    }

    render_photo_sidebar(frame, editor, columns[1]);
}

fn clamp_u16(value: usize) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

/// Renders `[[photo::...]]` tokens in the accent colour.
fn highlight_references(line: &str) -> Line<'_> {
    const OPEN: &str = "[[photo:";
    let mut spans = Vec::new();
    let mut rest = line;
    while let Some(start) = rest.find(OPEN) {
        let Some(len) = rest[start..].find("]]").map(|end| end + 2) else {
            break;
        };
        if start > 0 {
            spans.push(Span::raw(&rest[..start]));
        }
        spans.push(Span::styled(
            &rest[start..start + len],
            Style::default().fg(ACCENT).add_modifier(Modifier::UNDERLINED),
        ));
        rest = &rest[start + len..];
    }
    if !rest.is_empty() {
        spans.push(Span::raw(rest));
    }
    Line::from(spans)
}

fn render_photo_sidebar(frame: &mut Frame<'_>, editor: &EditorState, area: Rect) {
    let focused = editor.focus == EditorFocus::Sidebar;
    let block = titled_block(&format!("Photos ({})", editor.photos.len()), focused);

    if editor.photos.is_empty() {
        let hint = Paragraph::new(Span::styled(
            "No photos. Ctrl+P then 'n' to add one.",
            Style::default().fg(DIM),
        ))
        .wrap(Wrap { trim: true })
        .block(block);
        frame.render_widget(hint, area);
        return;
    }

    let items: Vec<ListItem<'_>> = editor
        .photos
        .iter()
        .map(|photo| {
            let mut lines = vec![Line::from(vec![
                Span::styled(photo.short_hash.clone(), Style::default().fg(ACCENT)),
                Span::raw(" "),
                Span::raw(photo.name.clone()),
            ])];
            if let Some(caption) = &photo.caption {
                lines.push(Line::from(Span::styled(
                    format!("  {caption}"),
                    Style::default().fg(DIM),
                )));
            }
            ListItem::new(lines)
        })
        .collect();

    let highlight = if focused {
        Style::default().fg(Color::Black).bg(ACCENT)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    let widget = List::new(items)
        .block(block)
        .highlight_style(highlight)
        .highlight_symbol("> ");
    let mut state = ListState::default();
    state.select(Some(editor.photo_selected));
    frame.render_stateful_widget(widget, area, &mut state);
}

fn render_settings(frame: &mut Frame<'_>, settings: &SettingsState, area: Rect) {
    let block = titled_block(&format!("Settings - {}", settings.diary.name), true);
    let checkbox = if settings.auto_open { "[x]" } else { "[ ]" };
    let mut lines = vec![
        Line::from(vec![
            Span::styled("Directory: ", Style::default().fg(DIM)),
            Span::raw(settings.diary.directory_name.clone()),
        ]),
        Line::from(vec![
            Span::styled("Path:      ", Style::default().fg(DIM)),
            Span::raw(settings.diary.path.clone()),
        ]),
        Line::from(vec![
            Span::styled("Contents:  ", Style::default().fg(DIM)),
            Span::raw(format!(
                "{} entries, {} photos",
                settings.diary.entries, settings.diary.photos
            )),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled(checkbox, Style::default().fg(ACCENT)),
            Span::raw(" Open this diary on startup"),
        ]),
    ];
    if settings.is_dirty() {
        lines.push(Line::from(Span::styled(
            "unsaved (Ctrl+S)",
            Style::default().fg(Color::Yellow),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Danger zone",
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    )));
    lines.push(key_hint_line(&[
        ("E", "delete all entries"),
        ("P", "delete all photos"),
        ("D", "delete diary"),
    ]));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_toasts(frame: &mut Frame<'_>, toasts: &Toasts, area: Rect) {
    if area.height == 0 {
        return;
    }
    let lines: Vec<Line<'_>> = toasts
        .items()
        .iter()
        .map(|toast| {
            let (label, color) = match toast.level {
                ToastLevel::Info => ("info", Color::Green),
                ToastLevel::Warning => ("warn", Color::Yellow),
                ToastLevel::Error => ("error", Color::Red),
            };
            Line::from(vec![
                Span::styled(
                    format!("{label}: "),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
                Span::raw(toast.message.as_str()),
            ])
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), area);
}

fn key_hint_line(hints: &[(&str, &str)]) -> Line<'static> {
    let mut spans = Vec::new();
    for (idx, (key, desc)) in hints.iter().enumerate() {
        if idx > 0 {
            spans.push(Span::styled("  ", Style::default().fg(DIM)));
        }
        spans.push(Span::styled(
            (*key).to_string(),
            Style::default().fg(KEY_COLOR).add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(format!(" {desc}")));
    }
    Line::from(spans)
}

fn footer_line(tui: &Tui) -> Line<'static> {
    if tui.modal.is_some() {
        return key_hint_line(&[("Enter", "confirm"), ("Esc", "cancel")]);
    }
    match &tui.screen {
        Screen::DiaryList(_) => key_hint_line(&[
            ("Enter", "open"),
            ("n", "new"),
            ("e", "rename"),
            ("s", "settings"),
            ("r", "refresh"),
            ("?", "about"),
            ("q", "quit"),
        ]),
        Screen::Editor(editor) if editor.focus == EditorFocus::Sidebar => key_hint_line(&[
            ("i", "insert ref"),
            ("n", "add"),
            ("e", "edit"),
            ("d", "delete"),
            ("Esc", "back to text"),
        ]),
        Screen::Editor(_) => key_hint_line(&[
            ("^S", "save"),
            ("^N", "next"),
            ("^B", "prev"),
            ("^R", "rename"),
            ("^P", "photos"),
            ("Esc", "diaries"),
        ]),
        Screen::Settings(_) => key_hint_line(&[
            ("Space", "toggle"),
            ("^S", "save"),
            ("Esc", "back"),
        ]),
    }
}

fn centered_rect(width_percent: u16, height: u16, area: Rect) -> Rect {
    let height = height.min(area.height);
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    let horizontal_margin = (100u16.saturating_sub(width_percent)) / 2;
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(horizontal_margin),
            Constraint::Percentage(width_percent),
            Constraint::Percentage(horizontal_margin),
        ])
        .split(vertical[1])[1]
}

fn input_line(label: &str, input: &LineInput, focused: bool) -> Line<'static> {
    let label_style = if focused {
        Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DIM)
    };
    Line::from(vec![
        Span::styled(format!("{label}: "), label_style),
        Span::raw(input.value().to_string()),
    ])
}

fn render_file_picker(frame: &mut Frame<'_>, picker: &FilePicker, screen: Rect) {
    let area = centered_rect(70, 20, screen);
    frame.render_widget(Clear, area);
    let block = titled_block(&format!("Browse: {}", picker.dir().display()), true);

    if let Some(error) = picker.error() {
        let message = Paragraph::new(Line::from(Span::styled(
            error.to_string(),
            Style::default().fg(Color::Red),
        )))
        .wrap(Wrap { trim: true })
        .block(block);
        frame.render_widget(message, area);
        return;
    }
    if picker.entries().is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            "No folders or images here. Backspace goes up.",
            Style::default().fg(DIM),
        )))
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem<'_>> = picker
        .entries()
        .iter()
        .map(|entry| {
            let style = if entry.is_dir {
                Style::default().fg(ACCENT)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(Span::styled(entry.label(), style)))
        })
        .collect();
    let widget = List::new(items)
        .block(block)
        .highlight_style(Style::default().fg(Color::Black).bg(ACCENT))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    state.select(Some(picker.selected()));
    frame.render_stateful_widget(widget, area, &mut state);
}

fn render_modal(frame: &mut Frame<'_>, modal: &Modal, home: &str, screen: Rect) {
    if let Modal::PhotoForm {
        picker: Some(picker),
        ..
    } = modal
    {
        render_file_picker(frame, picker, screen);
        return;
    }

    let (title, lines, cursor): (String, Vec<Line<'static>>, Option<(usize, usize)>) = match modal
    {
        Modal::Prompt { title, input, .. } => (
            title.clone(),
            vec![Line::from(input.value().to_string())],
            Some((0, input.cursor())),
        ),
        Modal::PhotoForm {
            mode,
            fields,
            focused,
            ..
        } => {
            let lines = fields
                .iter()
                .enumerate()
                .map(|(idx, field)| input_line(field.label, &field.input, idx == *focused))
                .collect();
            let cursor = fields
                .get(*focused)
                .map(|field| (*focused, field.label.len() + 2 + field.input.cursor()));
            let title = match mode {
                PhotoFormMode::Add { .. } => "Photo (Tab: next field, Ctrl+O: browse)",
                PhotoFormMode::Edit { .. } => "Photo (Tab: next field)",
            };
            (title.to_string(), lines, cursor)
        }
        Modal::Confirm { message, .. } => (
            "Confirm".to_string(),
            vec![Line::from(message.clone())],
            None,
        ),
        Modal::TypeToConfirm {
            expected, input, ..
        } => (
            "Delete diary".to_string(),
            vec![
                Line::from(format!("Type '{expected}' to delete this diary and its files:")),
                Line::from(input.value().to_string()),
            ],
            Some((1, input.cursor())),
        ),
        Modal::About => (
            "About".to_string(),
            vec![
                Line::from(Span::styled(
                    format!("pilgrim {}", env!("CARGO_PKG_VERSION")),
                    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
                )),
                Line::from("A terminal travel diary."),
                Line::from("Reference photos in entries with [[photo::hash]]."),
                Line::from(Span::styled(format!("Home: {home}"), Style::default().fg(DIM))),
            ],
            None,
        ),
    };

    let height = clamp_u16(lines.len()).saturating_add(2);
    let area = centered_rect(60, height, screen);
    frame.render_widget(Clear, area);
    let block = titled_block(&title, true);
    let inner = block.inner(area);
    frame.render_widget(Paragraph::new(lines).block(block), area);

    if let Some((row, col)) = cursor {
        let x = inner.x + clamp_u16(col).min(inner.width.saturating_sub(1));
        frame.set_cursor_position((x, inner.y + clamp_u16(row)));
    }
}
