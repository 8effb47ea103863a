//! UI Rendering
//!
//! Main UI layout and rendering logic for the TUI.

use crate::models::APP_TITLE;
use crate::tui::app::{ApiStatus, App, MessageRole, PipelineStage, View};
use crate::tui::theme::{Icons, Theme};
use crate::tui::widgets;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

const HEADER_HEIGHT: u16 = 3;
const PROGRESS_HEIGHT: u16 = 4;
const INPUT_HEIGHT: u16 = 4;
const STATUS_HEIGHT: u16 = 1;
const INDENT: &str = "  ";

/// Render the main UI
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Length(PROGRESS_HEIGHT),
            Constraint::Min(10),
            Constraint::Length(INPUT_HEIGHT),
            Constraint::Length(STATUS_HEIGHT),
        ])
        .split(frame.area());

    render_header(frame, chunks[0], app);
    widgets::render_progress(
        frame,
        chunks[1],
        &app.pipeline_stage,
        &app.current_question,
        app.sources_found,
    );
    render_messages(frame, chunks[2], app);
    render_input(frame, chunks[3], app);
    render_status_bar(frame, chunks[4], app);

    if app.view == View::Help {
        render_help(frame);
    }
}

/// Inner size of the message pane for a terminal of `width` x `height`
pub(crate) fn messages_viewport(width: u16, height: u16) -> (u16, u16) {
    let fixed = HEADER_HEIGHT + PROGRESS_HEIGHT + INPUT_HEIGHT + STATUS_HEIGHT;
    let pane_height = height.saturating_sub(fixed).max(10);
    (width.saturating_sub(2), pane_height.saturating_sub(2))
}

/// Header with LLM and index status dots
fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let dot = |status: ApiStatus| match status {
        ApiStatus::Ready => Span::styled("●", Style::default().fg(Color::Green)),
        ApiStatus::NotConfigured => Span::styled("●", Style::default().fg(Color::Red)),
    };

    let title_text = vec![Line::from(vec![
        Span::raw(format!("{} ", Icons::SHIELD)),
        Span::styled(APP_TITLE, Theme::title()),
        Span::raw("  "),
        Span::styled("LLM ", Theme::text_dim()),
        dot(app.llm_status),
        Span::styled(" Index ", Theme::text_dim()),
        dot(app.index_status),
    ])];

    let title = Paragraph::new(title_text).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Theme::border()),
    );

    frame.render_widget(title, area);
}

/// All lines of the message history, wrapped to `width`
pub(crate) fn message_lines(app: &App, width: u16) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();
    let max_line_width = (width as usize).saturating_sub(INDENT.len() + 2).max(1);

    for msg in &app.messages {
        let (prefix, style) = match msg.role {
            MessageRole::User => ("You", Theme::user_message()),
            MessageRole::Assistant => ("Analyst", Theme::assistant_message()),
            MessageRole::System => ("System", Theme::system_message()),
        };

        lines.push(Line::from(vec![
            Span::styled(format!("{}: ", prefix), style),
            Span::styled(msg.timestamp.format("%H:%M").to_string(), Theme::text_dim()),
        ]));

        // Chat replies use markdown bold for the evidence list; the terminal shows it plain.
        let content = msg.content.replace("**", "");
        for line in content.lines() {
            let line_style = if line.starts_with("---") {
                Theme::text_dim()
            } else {
                Theme::text()
            };
            if line.is_empty() {
                lines.push(Line::from(INDENT));
                continue;
            }
            for piece in wrap_line(line, max_line_width) {
                lines.push(Line::from(vec![
                    Span::raw(INDENT),
                    Span::styled(piece, line_style),
                ]));
            }
        }

        lines.push(Line::from(""));
    }

    if app.pipeline_stage.is_busy() {
        lines.push(Line::from(vec![
            Span::styled("Analyst: ", Theme::assistant_message()),
            Span::styled(Icons::CURSOR, Theme::active()),
        ]));
    }

    lines
}

/// Split a line into pieces of at most `max_width` characters, preferring
/// to break after whitespace or punctuation.
pub(crate) fn wrap_line(line: &str, max_width: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut remaining = line;

    while !remaining.is_empty() {
        if remaining.chars().count() <= max_width {
            pieces.push(remaining.to_string());
            break;
        }

        let mut break_byte = None;
        let mut hard_break = remaining.len();
        for (seen, (idx, ch)) in remaining.char_indices().enumerate() {
            if seen >= max_width {
                hard_break = idx;
                break;
            }
            if idx > 0 && ch.is_whitespace() {
                break_byte = Some(idx);
            } else if matches!(ch, ',' | '.' | ';') {
                // keep punctuation on the current line
                break_byte = Some(idx + ch.len_utf8());
            }
        }

        let (chunk, rest) = remaining.split_at(break_byte.unwrap_or(hard_break));
        pieces.push(chunk.to_string());
        remaining = rest.trim_start();
    }

    pieces
}

fn render_messages(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .title(" Conversation ")
        .borders(Borders::ALL)
        .border_style(if app.view == View::Chat {
            Theme::border_focused()
        } else {
            Theme::border()
        });

    let inner_area = block.inner(area);
    frame.render_widget(block, area);

    let paragraph = Paragraph::new(message_lines(app, inner_area.width)).scroll((app.scroll_offset, 0));
    frame.render_widget(paragraph, inner_area);
}

fn render_input(frame: &mut Frame, area: Rect, app: &App) {
    let is_focused = app.view == View::Chat && !app.pipeline_stage.is_busy();

    let block = Block::default()
        .title(" Question ")
        .borders(Borders::ALL)
        .border_style(if is_focused {
            Theme::border_focused()
        } else {
            Theme::border()
        });

    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(&app.input, inner);
}

fn render_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let status = match &app.pipeline_stage {
        PipelineStage::Idle => Span::styled("Ready", Theme::text_secondary()),
        PipelineStage::Loading => Span::styled("Loading index...", Theme::active()),
        PipelineStage::Retrieving => Span::styled("Searching complaints...", Theme::active()),
        PipelineStage::Generating => Span::styled("Generating answer...", Theme::active()),
        PipelineStage::Complete => Span::styled("Complete", Theme::complete()),
        PipelineStage::Error(e) => Span::styled(format!("Error: {}", e), Theme::error()),
    };

    let shortcuts = vec![
        Span::styled(" [Enter]", Theme::shortcut_key()),
        Span::styled(" Ask ", Theme::shortcut_desc()),
        Span::styled("[Tab]", Theme::shortcut_key()),
        Span::styled(" Examples ", Theme::shortcut_desc()),
        Span::styled("[Ctrl+Q]", Theme::shortcut_key()),
        Span::styled(" Quit ", Theme::shortcut_desc()),
        Span::styled("[F1]", Theme::shortcut_key()),
        Span::styled(" Help", Theme::shortcut_desc()),
    ];

    let line = Line::from(
        std::iter::once(status)
            .chain(std::iter::once(Span::raw(" │ ")))
            .chain(shortcuts)
            .collect::<Vec<_>>(),
    );

    frame.render_widget(Paragraph::new(line), area);
}

fn render_help(frame: &mut Frame) {
    let area = centered_rect(60, 60, frame.area());
    frame.render_widget(Clear, area);

    let shortcut = |keys: &'static str, desc: &'static str| {
        Line::from(vec![
            Span::styled(keys, Theme::shortcut_key()),
            Span::styled(desc, Theme::text()),
        ])
    };

    let help_lines = vec![
        Line::from(Span::styled("Keyboard Shortcuts", Theme::heading())),
        Line::from(""),
        shortcut("Enter        ", "Ask the question"),
        shortcut("Tab/Shift+Tab", " Cycle example questions"),
        shortcut("Ctrl+Q       ", "Quit application"),
        shortcut("Ctrl+C       ", "Force quit"),
        shortcut("↑/↓          ", "Scroll conversation"),
        shortcut("PageUp/Down  ", "Scroll page"),
        shortcut("Home/End     ", "Jump to top / latest"),
        shortcut("Esc          ", "Close help"),
        shortcut("F1 / Ctrl+H  ", "Show this help"),
        Line::from(""),
        Line::from(Span::styled(
            "Answers cite the complaint excerpts they were based on.",
            Theme::text_secondary(),
        )),
        Line::from(Span::styled("Press any key to close", Theme::text_dim())),
    ];

    let paragraph = Paragraph::new(help_lines).block(
        Block::default()
            .title(" Help ")
            .borders(Borders::ALL)
            .border_style(Theme::border_focused()),
    );

    frame.render_widget(paragraph, area);
}

/// Helper to create a centered rect
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
