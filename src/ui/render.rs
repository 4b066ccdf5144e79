use crate::app::AppMode;
use crate::storage::{ContentType, ItemMeta};
use crate::ui::theme::colors;
use ratatui::{
    layout::Alignment,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};

fn kind_label(content_type: ContentType) -> &'static str {
    match content_type {
        ContentType::Text => "text ",
        ContentType::Image => "image",
    }
}

pub fn item_line(index: usize, item: &ItemMeta) -> Line<'static> {
    let kind_style = match item.content_type {
        ContentType::Image => Style::default().fg(colors::accent()),
        ContentType::Text => Style::default().fg(colors::dimmed()),
    };
    Line::from(vec![
        Span::styled(format!("{:>4} ", index + 1), Style::default().fg(colors::dimmed())),
        Span::styled(kind_label(item.content_type), kind_style),
        Span::raw("  "),
        Span::styled(item.id.clone(), Style::default().fg(colors::text())),
    ])
}

pub fn render_history_list(items: &[ItemMeta]) -> List<'static> {
    let rows: Vec<ListItem> = items
        .iter()
        .enumerate()
        .map(|(i, item)| ListItem::new(item_line(i, item)))
        .collect();

    List::new(rows)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" clipdeck ({}) ", items.len()))
                .border_style(Style::default().fg(colors::dimmed())),
        )
        .style(Style::default().bg(colors::background()))
        .highlight_style(
            Style::default()
                .bg(colors::selection())
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ")
}

pub fn render_empty_history() -> Paragraph<'static> {
    Paragraph::new("History is empty. Press c to capture the clipboard.")
        .alignment(Alignment::Center)
        .style(Style::default().fg(colors::dimmed()).bg(colors::background()))
        .block(Block::default().borders(Borders::ALL).title(" clipdeck "))
}

/// Frame around the preview body; the image goes into its inner area
pub fn preview_block(title: &str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .title(format!(" {title} "))
        .border_style(Style::default().fg(colors::accent()))
        .style(Style::default().bg(colors::background()))
}

pub fn render_preview_text(text: &str) -> Paragraph<'static> {
    Paragraph::new(text.to_string())
        .wrap(Wrap { trim: false })
        .style(Style::default().fg(colors::text()).bg(colors::background()))
}

pub fn render_caption(caption: &str) -> Line<'static> {
    Line::from(Span::styled(
        caption.to_string(),
        Style::default().fg(colors::dimmed()),
    ))
    .alignment(Alignment::Center)
}

fn key_hints(mode: AppMode) -> &'static str {
    match mode {
        AppMode::Preview => "esc back  j/k next/prev  d delete",
        _ => "enter preview  j/k move  c capture  d delete  r reload  q quit",
    }
}

/// Bottom line: status message if any, otherwise key hints, plus position
pub fn render_status_line(mode: AppMode, status: Option<&str>, position: (usize, usize)) -> Line<'static> {
    let (cursor, total) = position;
    let message = status.unwrap_or_else(|| key_hints(mode)).to_string();
    let counter = if total == 0 {
        String::from(" 0/0 ")
    } else {
        format!(" {}/{} ", cursor + 1, total)
    };

    Line::from(vec![
        Span::styled(counter, Style::default().fg(colors::background()).bg(colors::accent())),
        Span::raw(" "),
        Span::styled(message, Style::default().fg(colors::text())),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_item_line_shows_position_kind_and_id() {
        let line = item_line(2, &ItemMeta::new("0001.png", ContentType::Image));
        assert_eq!(line_text(&line), "   3 image  0001.png");
    }

    #[test]
    fn test_status_line_prefers_status_message() {
        let line = render_status_line(AppMode::List, Some("Captured x"), (0, 4));
        assert_eq!(line_text(&line), " 1/4  Captured x");
    }

    #[test]
    fn test_status_line_empty_history() {
        let line = render_status_line(AppMode::List, None, (0, 0));
        assert!(line_text(&line).starts_with(" 0/0  enter preview"));
    }

    #[test]
    fn test_preview_hints_differ() {
        let line = render_status_line(AppMode::Preview, None, (1, 2));
        assert!(line_text(&line).contains("esc back"));
    }
}
