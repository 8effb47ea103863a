//! Progress Widget
//!
//! Shows the current question and where it is in the
//! Retrieving → Generating → Done pipeline.

use crate::tui::app::PipelineStage;
use crate::tui::theme::{Icons, Theme};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Render the progress indicator
pub fn render_progress(
    frame: &mut Frame,
    area: Rect,
    stage: &PipelineStage,
    question: &Option<String>,
    sources_found: Option<usize>,
) {
    let block = Block::default()
        .title(" Progress ")
        .borders(Borders::ALL)
        .border_style(Theme::border());

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = Vec::new();

    match question {
        Some(q) => lines.push(Line::from(vec![
            Span::styled("Question: ", Theme::text_secondary()),
            Span::styled(
                truncate_string(q, (inner.width as usize).saturating_sub(10)),
                Theme::text(),
            ),
        ])),
        None => lines.push(Line::from(Span::styled("Waiting for a question...", Theme::text_dim()))),
    }

    let mut progress = build_progress_line(stage);
    if let Some(count) = sources_found {
        progress.push(Span::styled(
            format!("   ({} complaint excerpts)", count),
            Theme::text_dim(),
        ));
    }
    lines.push(Line::from(progress));

    frame.render_widget(Paragraph::new(lines), inner);
}

fn build_progress_line(stage: &PipelineStage) -> Vec<Span<'static>> {
    let mut spans = Vec::new();

    if *stage == PipelineStage::Loading {
        spans.push(Span::styled(format!("{} Loading index ", Icons::ACTIVE), Theme::active()));
        spans.push(Span::styled(format!("{} ", Icons::ARROW), Theme::text_dim()));
    }

    let stages = [
        ("Retrieving", StageState::retrieving(stage)),
        ("Generating", StageState::generating(stage)),
        ("Done", StageState::done(stage)),
    ];

    for (i, (name, state)) in stages.iter().enumerate() {
        let (icon, style) = match state {
            StageState::Complete => (Icons::COMPLETE, Theme::complete()),
            StageState::Active => (Icons::ACTIVE, Theme::active()),
            StageState::Pending => (Icons::PENDING, Theme::pending()),
            StageState::Error => (Icons::ERROR, Theme::error()),
        };

        spans.push(Span::styled(format!("{} ", icon), style));
        spans.push(Span::styled(name.to_string(), style));

        if i < stages.len() - 1 {
            spans.push(Span::styled(format!(" {} ", Icons::ARROW), Theme::text_dim()));
        }
    }

    spans
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum StageState {
    Pending,
    Active,
    Complete,
    Error,
}

impl StageState {
    fn retrieving(stage: &PipelineStage) -> Self {
        match stage {
            PipelineStage::Idle | PipelineStage::Loading => StageState::Pending,
            PipelineStage::Retrieving => StageState::Active,
            PipelineStage::Error(_) => StageState::Error,
            PipelineStage::Generating | PipelineStage::Complete => StageState::Complete,
        }
    }

    fn generating(stage: &PipelineStage) -> Self {
        match stage {
            PipelineStage::Generating => StageState::Active,
            PipelineStage::Complete => StageState::Complete,
            PipelineStage::Error(_) => StageState::Error,
            _ => StageState::Pending,
        }
    }

    fn done(stage: &PipelineStage) -> Self {
        match stage {
            PipelineStage::Complete => StageState::Complete,
            PipelineStage::Error(_) => StageState::Error,
            _ => StageState::Pending,
        }
    }
}

/// Truncate to `max_width` characters, marking the cut with "..."
fn truncate_string(s: &str, max_width: usize) -> String {
    if s.chars().count() <= max_width {
        s.to_string()
    } else if max_width > 3 {
        let head: String = s.chars().take(max_width - 3).collect();
        format!("{}...", head)
    } else {
        s.chars().take(max_width).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(spans: &[Span]) -> String {
        spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_stage_states() {
        assert_eq!(StageState::retrieving(&PipelineStage::Retrieving), StageState::Active);
        assert_eq!(StageState::retrieving(&PipelineStage::Generating), StageState::Complete);
        assert_eq!(StageState::generating(&PipelineStage::Retrieving), StageState::Pending);
        assert_eq!(StageState::done(&PipelineStage::Complete), StageState::Complete);
        assert_eq!(
            StageState::done(&PipelineStage::Error("x".into())),
            StageState::Error
        );
    }

    #[test]
    fn test_progress_line_text() {
        assert_eq!(
            text(&build_progress_line(&PipelineStage::Generating)),
            "✓ Retrieving → ● Generating → ○ Done"
        );
        assert!(text(&build_progress_line(&PipelineStage::Loading)).starts_with("● Loading index → "));
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate_string("short", 10), "short");
        assert_eq!(truncate_string("crédit card fees", 8), "crédi...");
        assert_eq!(truncate_string("abc", 2), "ab");
    }
}
