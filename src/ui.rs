use ratatui::{
    buffer::Buffer,
    layout::{Position, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Widget,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::{
    config::Theme,
    game::{Mode, RenderDescription},
    layout::{line_slices, screen_coords, word_wrap},
    util::pad_right,
};

/// Screen row of the first quote line.
const QUOTE_TOP: u16 = 2;

const BROWSE_HINT: &str = "Use arrows/space to browse, esc to quit, or start typing.";
const SCORE_PREFIX: &str = "You scored ";

/// Draws one [`RenderDescription`]; drawing the same description twice
/// produces the same screen.
pub struct View<'a> {
    desc: &'a RenderDescription,
    theme: &'a Theme,
    max_width: u16,
}

impl<'a> View<'a> {
    pub fn new(desc: &'a RenderDescription, theme: &'a Theme, max_width: u16) -> Self {
        Self {
            desc,
            theme,
            max_width,
        }
    }

    fn quote_columns(&self, area: Rect) -> u16 {
        if self.max_width > 0 {
            area.width.min(self.max_width)
        } else {
            area.width
        }
    }

    fn line_lengths(&self, area: Rect) -> Vec<usize> {
        word_wrap(
            &self.desc.text,
            self.quote_columns(area).saturating_sub(1) as usize,
        )
    }

    /// Where the terminal cursor goes: the first untyped (or erroneous)
    /// character while typing, nowhere otherwise.
    pub fn cursor(&self, area: Rect) -> Option<Position> {
        if self.desc.mode != Mode::Typing {
            return None;
        }

        let lengths = self.line_lengths(area);
        let (x, y) = screen_coords(&lengths, self.desc.position + self.desc.incorrect);
        let x = (x as u16).min(self.quote_columns(area).saturating_sub(1));
        let y = QUOTE_TOP.saturating_add(y as u16);

        if x < area.width && y < area.height {
            Some(Position::new(area.x + x, area.y + y))
        } else {
            None
        }
    }

    fn char_style(&self, offset: usize) -> Style {
        let theme = self.theme;
        match self.desc.mode {
            Mode::Browsing => theme.quote.into(),
            Mode::Finished => theme.correct.into(),
            Mode::Typing if offset < self.desc.position => theme.correct.into(),
            Mode::Typing if offset < self.desc.position + self.desc.incorrect => {
                theme.incorrect.into()
            }
            Mode::Typing => theme.quote.into(),
        }
    }

    fn render_quote(&self, lengths: &[usize], area: Rect, buf: &mut Buffer) {
        let mut offset = 0;

        for (row, line) in line_slices(&self.desc.text, lengths).iter().enumerate() {
            let y = area.y + QUOTE_TOP + row as u16;
            if y >= area.bottom() {
                break;
            }

            let mut x = area.x;
            for (col, ch) in line.chars().enumerate() {
                let (symbol, width) = match ch.width() {
                    Some(width) if !ch.is_control() => (ch, width as u16),
                    _ => (' ', 1),
                };
                if x + width > area.right() {
                    break;
                }
                buf.set_string(x, y, symbol.to_string(), self.char_style(offset + col));
                x += width;
            }

            offset += line.chars().count() + 1;
        }
    }

    /// Writes the attribution right-aligned under the quote, returns its height.
    fn render_author(&self, top: u16, columns: u16, area: Rect, buf: &mut Buffer) -> u16 {
        let attribution = match (self.desc.author.is_empty(), self.desc.title.is_empty()) {
            (true, true) => return 0,
            (false, true) => format!("— {}", self.desc.author),
            (true, false) => format!("— {}", self.desc.title),
            (false, false) => format!("— {}, {}", self.desc.author, self.desc.title),
        };

        let lengths = word_wrap(&attribution, (columns / 2).max(1) as usize);
        let style: Style = self.theme.author.into();

        for (row, line) in line_slices(&attribution, &lengths).iter().enumerate() {
            let y = top + row as u16;
            if y >= area.bottom() {
                break;
            }
            let x = area.x + columns.saturating_sub(line.width() as u16);
            buf.set_stringn(x, y, line, area.right().saturating_sub(x) as usize, style);
        }

        lengths.len() as u16
    }

    fn prompt_line(&self) -> Line<'a> {
        let prompt: Style = self.theme.prompt.into();
        match self.desc.mode {
            Mode::Typing => Line::from(Span::styled(format!("> {}", self.desc.edit), prompt)),
            Mode::Browsing => Line::from(Span::styled(BROWSE_HINT, prompt)),
            Mode::Finished => {
                let mark = if self.desc.wpm > self.desc.average {
                    "!"
                } else {
                    "."
                };
                Line::from(vec![
                    Span::styled(SCORE_PREFIX, prompt),
                    Span::styled(
                        format!("{:.1}", self.desc.wpm),
                        Style::from(self.theme.score_highlight),
                    ),
                    Span::styled(format!(" wpm{mark} {BROWSE_HINT}"), prompt),
                ])
            }
        }
    }
}

impl Widget for &View<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        buf.set_style(area, Style::default().bg(self.theme.background));

        let width = area.width as usize;
        buf.set_stringn(
            area.x,
            area.y,
            pad_right(&self.desc.header, width),
            width,
            Style::from(self.theme.status),
        );

        let columns = self.quote_columns(area);
        let lengths = self.line_lengths(area);
        self.render_quote(&lengths, area, buf);

        let author_top = area.y + QUOTE_TOP + lengths.len() as u16 + 1;
        let author_height = self.render_author(author_top, columns, area, buf);

        let prompt_y = author_top + author_height + 1;
        if prompt_y < area.bottom() {
            buf.set_line(area.x, prompt_y, &self.prompt_line(), area.width);
        }

        if let Some(status) = &self.desc.status {
            let status_y = prompt_y + 1;
            if status_y < area.bottom() {
                buf.set_stringn(
                    area.x,
                    status_y,
                    status,
                    width,
                    Style::from(self.theme.incorrect),
                );
            }
        }
    }
}
