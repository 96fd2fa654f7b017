//! Modal picker for select fields (student, subject, class, ...)

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Stylize,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};
use unicode_width::UnicodeWidthStr;

use super::theme::Theme;
use super::widgets::truncate_to_width;

const VISIBLE_ITEMS: usize = 10;

/// A selectable item in the picker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerItem {
    pub id: String,
    pub title: String,
    pub subtitle: String,
}

impl PickerItem {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            subtitle: String::new(),
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = subtitle.into();
        self
    }
}

/// Generic picker state
#[derive(Debug, Clone, Default)]
pub struct Picker {
    pub visible: bool,
    pub title: String,
    pub items: Vec<PickerItem>,
    pub selected: usize,
    pub scroll_offset: usize,
}

impl Picker {
    /// Open the picker, preselecting the item with `current_id` if present
    pub fn open(&mut self, title: &str, items: Vec<PickerItem>, current_id: Option<&str>) {
        self.visible = true;
        self.title = title.to_string();
        self.selected = current_id
            .and_then(|id| items.iter().position(|item| item.id == id))
            .unwrap_or(0);
        self.items = items;
        self.scroll_offset = 0;
        self.ensure_visible();
    }

    pub fn close(&mut self) {
        self.visible = false;
        self.items.clear();
        self.selected = 0;
        self.scroll_offset = 0;
    }

    pub fn select_prev(&mut self) {
        if !self.items.is_empty() {
            if self.selected == 0 {
                self.selected = self.items.len() - 1;
            } else {
                self.selected -= 1;
            }
            self.ensure_visible();
        }
    }

    pub fn select_next(&mut self) {
        if !self.items.is_empty() {
            self.selected = (self.selected + 1) % self.items.len();
            self.ensure_visible();
        }
    }

    fn ensure_visible(&mut self) {
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + VISIBLE_ITEMS {
            self.scroll_offset = self.selected + 1 - VISIBLE_ITEMS;
        }
    }

    pub fn selected_item(&self) -> Option<&PickerItem> {
        self.items.get(self.selected)
    }

    /// Render the picker centered in `area`
    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        if !self.visible {
            return;
        }

        let width = (area.width * 2 / 3).clamp(40, 80).min(area.width);
        let height = (self.items.len().min(VISIBLE_ITEMS) as u16 + 2)
            .max(3)
            .min(area.height);
        let x = area.x + (area.width - width) / 2;
        let y = area.y + (area.height - height) / 2;
        let picker_area = Rect::new(x, y, width, height);

        Clear.render(picker_area, buf);

        let inner_width = width.saturating_sub(2) as usize;
        let lines: Vec<Line> = if self.items.is_empty() {
            vec![Line::styled("Keine Einträge vorhanden.", Theme::muted())]
        } else {
            self.items
                .iter()
                .enumerate()
                .skip(self.scroll_offset)
                .take(VISIBLE_ITEMS)
                .map(|(i, item)| {
                    let is_selected = i == self.selected;
                    let prefix = if is_selected { "> " } else { "  " };
                    let style = if is_selected { Theme::accent() } else { Theme::text() };
                    let avail = inner_width.saturating_sub(prefix.width());
                    let title = truncate_to_width(&item.title, avail);
                    let mut spans = vec![
                        Span::styled(prefix, style),
                        Span::styled(title.clone(), style.bold()),
                    ];
                    let rest = avail.saturating_sub(title.width() + 2);
                    if !item.subtitle.is_empty() && rest > 3 {
                        spans.push(Span::styled(
                            format!("  {}", truncate_to_width(&item.subtitle, rest)),
                            Theme::muted(),
                        ));
                    }
                    Line::from(spans)
                })
                .collect()
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Theme::accent())
            .title_top(Line::styled(format!(" {} ", self.title), Theme::title()))
            .title_bottom(Line::styled(" ↑↓ Enter Esc ", Theme::muted()));

        Paragraph::new(lines).block(block).render(picker_area, buf);
    }
}
