//! Custom widgets for the TUI

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::model::Page;

use super::theme::Theme;

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Truncate `text` to at most `max_width` terminal columns, marking the cut
/// with an ellipsis.
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut width = 0usize;
    for c in text.chars() {
        let w = UnicodeWidthChar::width(c).unwrap_or(1);
        if width + w + 1 > max_width {
            break;
        }
        out.push(c);
        width += w;
    }
    out.push('…');
    out
}

/// Header bar with app name and page title
pub struct HeaderBar<'a> {
    pub title: &'a str,
    pub is_busy: bool,
    pub spinner_frame: usize,
}

impl Widget for HeaderBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height < 1 {
            return;
        }

        let line = Line::from(vec![
            Span::styled("◆ ", Theme::accent()),
            Span::styled("Lehrer-Assistent Pro", Theme::muted()),
            Span::styled(" │ ", Theme::muted()),
            Span::styled(self.title, Theme::title()),
        ]);
        buf.set_line(area.x + 1, area.y, &line, area.width.saturating_sub(2));

        let status = if self.is_busy {
            Span::styled(
                format!("{} lädt ", SPINNER[self.spinner_frame % SPINNER.len()]),
                Theme::accent(),
            )
        } else {
            Span::styled("● Online ", Theme::success())
        };
        let status_len = status.width() as u16;
        let x = area.x + area.width.saturating_sub(status_len + 1);
        buf.set_span(x, area.y, &status, status_len + 1);
    }
}

/// Left navigation listing the three pages
pub struct Sidebar {
    pub current: Page,
}

impl Widget for Sidebar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::RIGHT)
            .border_style(Theme::border());
        let inner = block.inner(area);
        block.render(area, buf);

        for (i, page) in Page::ALL.iter().enumerate() {
            let y = inner.y + 1 + (i as u16) * 2;
            if y >= inner.y + inner.height {
                break;
            }
            let style = if *page == self.current {
                Theme::nav_active()
            } else {
                Theme::nav_inactive()
            };
            let label = format!(" F{} {:<width$}", i + 1, page.label(), width = inner.width as usize);
            let label = truncate_to_width(&label, inner.width as usize);
            buf.set_span(inner.x, y, &Span::styled(label, style), inner.width);
        }
    }
}

/// Status line at the bottom of the content area
pub struct StatusBar<'a> {
    pub text: Option<&'a str>,
    pub is_busy: bool,
    pub spinner_frame: usize,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let line = match (self.is_busy, self.text) {
            (true, text) => Line::from(vec![
                Span::styled(
                    format!("{} ", SPINNER[self.spinner_frame % SPINNER.len()]),
                    Theme::accent(),
                ),
                Span::styled(text.unwrap_or("Bitte warten..."), Theme::accent()),
            ]),
            (false, Some(text)) => Line::from(Span::styled(text, Theme::success())),
            (false, None) => Line::from(vec![
                Span::styled("● ", Theme::success()),
                Span::styled("Bereit", Theme::muted()),
            ]),
        };
        buf.set_line(area.x + 1, area.y, &line, area.width.saturating_sub(2));
    }
}

/// Help bar showing key bindings
pub struct HelpBar<'a> {
    pub bindings: &'a [(&'a str, &'a str)],
}

impl Widget for HelpBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut spans = vec![Span::raw(" ")];
        for (i, (key, desc)) in self.bindings.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(" │ ", Theme::muted()));
            }
            spans.push(Span::styled(*key, Theme::key()));
            spans.push(Span::styled(format!(" {}", desc), Theme::key_desc()));
        }
        buf.set_line(area.x, area.y, &Line::from(spans), area.width);
    }
}

/// Bordered form field. Select fields show a trailing marker.
pub struct FieldBox<'a> {
    pub label: &'a str,
    pub value: &'a str,
    pub placeholder: &'a str,
    pub focused: bool,
    pub enabled: bool,
    pub is_select: bool,
}

impl Widget for FieldBox<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.focused {
            Theme::border_focused()
        } else {
            Theme::border()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(Span::styled(format!(" {} ", self.label), Theme::muted()));
        let inner = block.inner(area);
        block.render(area, buf);

        let (text, style) = if self.value.is_empty() {
            (self.placeholder, Theme::muted())
        } else if self.enabled {
            (self.value, Theme::text())
        } else {
            (self.value, Theme::muted())
        };
        let marker_width = if self.is_select { 2 } else { 0 };
        let shown = truncate_to_width(text, (inner.width as usize).saturating_sub(marker_width));
        buf.set_span(inner.x, inner.y, &Span::styled(shown, style), inner.width);
        if self.is_select && inner.width > 2 {
            buf.set_span(
                inner.x + inner.width - 1,
                inner.y,
                &Span::styled("▾", border_style),
                1,
            );
        }
    }
}

/// Single-line button
pub struct Button<'a> {
    pub label: &'a str,
    pub focused: bool,
    pub enabled: bool,
}

impl Widget for Button<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let style = Theme::button(self.focused, self.enabled);
        buf.set_style(area, style);
        Paragraph::new(self.label)
            .style(style)
            .alignment(Alignment::Center)
            .render(area, buf);
    }
}

/// Boxed message, used for guidance notes and inline results
pub struct Notice<'a> {
    pub title: &'a str,
    pub text: &'a str,
    pub style: ratatui::style::Style,
}

impl Widget for Notice<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.style)
            .title(Span::styled(format!(" {} ", self.title), self.style));
        Paragraph::new(self.text)
            .style(self.style)
            .wrap(Wrap { trim: false })
            .block(block)
            .render(area, buf);
    }
}

/// Modal alert, dismissed with Enter or Esc
pub struct AlertOverlay<'a> {
    pub message: &'a str,
}

impl Widget for AlertOverlay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let width = (self.message.width() as u16 + 6).clamp(30, 70).min(area.width);
        let height = 5.min(area.height);
        let x = area.x + (area.width - width) / 2;
        let y = area.y + (area.height - height) / 2;
        let overlay = Rect::new(x, y, width, height);

        Clear.render(overlay, buf);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Theme::warning())
            .title_top(Line::styled(" Hinweis ", Theme::warning()))
            .title_bottom(Line::styled(" Enter OK ", Theme::muted()));
        Paragraph::new(self.message)
            .wrap(Wrap { trim: true })
            .alignment(Alignment::Center)
            .block(block)
            .render(overlay, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_keeps_short_text() {
        assert_eq!(truncate_to_width("Mathe", 10), "Mathe");
    }

    #[test]
    fn test_truncate_adds_ellipsis() {
        assert_eq!(truncate_to_width("Französisch", 6), "Franz…");
        assert_eq!(truncate_to_width("Französisch", 0), "");
    }
}
