//! Pane describing the rendered first page of the latest report.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use time::macros::format_description;

use crate::app::rasterize::RenderedPage;

/// Shows where the preview image lives and what it was rendered from.
#[derive(Debug, Default)]
pub struct RenderPane;

impl RenderPane {
    pub fn render(&self, frame: &mut Frame<'_>, area: Rect, page: Option<&RenderedPage>) {
        let block = Block::default().title("First page").borders(Borders::ALL);
        let paragraph = match page {
            Some(page) => Paragraph::new(page_lines(page)),
            None => Paragraph::new("Nothing rendered yet").style(
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            ),
        };
        frame.render_widget(paragraph.block(block).wrap(Wrap { trim: true }), area);
    }
}

fn page_lines(page: &RenderedPage) -> Vec<Line<'static>> {
    let size = page
        .dimensions
        .map(|(width, height)| format!("{width}×{height} px"))
        .unwrap_or_else(|| "unknown size".into());
    let rendered_at = page
        .rendered_at
        .format(format_description!("[hour]:[minute]:[second]"))
        .unwrap_or_default();

    vec![
        field("image", page.image.display().to_string()),
        field("size", size),
        field("from", page.pdf.display().to_string()),
        field("at", format!("{rendered_at} UTC")),
        Line::styled(
            "press : then open to view",
            Style::default().fg(Color::DarkGray),
        ),
    ]
}

fn field(name: &'static str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{name:>5} "), Style::default().fg(Color::Cyan)),
        Span::raw(value),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::PathBuf;

    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use time::OffsetDateTime;

    fn draw(page: Option<&RenderedPage>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(48, 8)).unwrap();
        terminal
            .draw(|frame| {
                let area = frame.size();
                RenderPane.render(frame, area, page);
            })
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn placeholder_without_render() {
        assert!(draw(None).contains("Nothing rendered yet"));
    }

    #[test]
    fn shows_image_details() {
        let page = RenderedPage {
            image: PathBuf::from("out/preview.png"),
            pdf: PathBuf::from("out/report.pdf"),
            dimensions: Some((850, 1100)),
            rendered_at: OffsetDateTime::UNIX_EPOCH,
        };
        let rendered = draw(Some(&page));
        assert!(rendered.contains("out/preview.png"));
        assert!(rendered.contains("850×1100 px"));
        assert!(rendered.contains("00:00:00 UTC"));
    }
}
