//! Word wrapping and text placement.
//!
//! Greedy, word-granular line breaking: no hyphenation, no kerning. Explicit
//! newlines are honoured and a word wider than the line is broken between
//! characters.

use super::{Block, DrawCommand, LayoutElement, TextLine};
use crate::font::{FontContext, FontKey};
use crate::style::{Color, TextAlign};

/// Everything needed to set a run of text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font: FontKey,
    pub size: f64,
    pub color: Color,
    /// Multiple of `size`.
    pub line_height: f64,
}

impl TextStyle {
    pub fn line_box(&self) -> f64 {
        self.size * self.line_height
    }

    pub fn with_size(&self, size: f64) -> Self {
        Self {
            size,
            ..self.clone()
        }
    }

    pub fn with_color(&self, color: Color) -> Self {
        Self {
            color,
            ..self.clone()
        }
    }

    pub fn with_font(&self, font: FontKey) -> Self {
        Self {
            font,
            ..self.clone()
        }
    }
}

/// Break `text` into lines no wider than `max_width`.
pub fn wrap_text(text: &str, fonts: &FontContext, font: &FontKey, size: f64, max_width: f64) -> Vec<String> {
    let mut lines = Vec::new();
    let space = fonts.char_width(' ', font, size);

    for paragraph in text.split('\n') {
        let paragraph = paragraph.trim_end_matches('\r');
        let mut current = String::new();
        let mut current_width = 0.0;

        for word in paragraph.split_whitespace() {
            let word_width = fonts.measure_string(word, font, size);

            if current.is_empty() {
                if word_width <= max_width {
                    current.push_str(word);
                    current_width = word_width;
                } else {
                    let mut pieces = break_word(word, fonts, font, size, max_width);
                    let last = pieces.pop().unwrap_or_default();
                    lines.extend(pieces);
                    current_width = fonts.measure_string(&last, font, size);
                    current = last;
                }
            } else if current_width + space + word_width <= max_width {
                current.push(' ');
                current.push_str(word);
                current_width += space + word_width;
            } else {
                lines.push(std::mem::take(&mut current));
                if word_width <= max_width {
                    current.push_str(word);
                    current_width = word_width;
                } else {
                    let mut pieces = break_word(word, fonts, font, size, max_width);
                    let last = pieces.pop().unwrap_or_default();
                    lines.extend(pieces);
                    current_width = fonts.measure_string(&last, font, size);
                    current = last;
                }
            }
        }
        lines.push(current);
    }

    lines
}

fn break_word(word: &str, fonts: &FontContext, font: &FontKey, size: f64, max_width: f64) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut width = 0.0;
    for ch in word.chars() {
        let w = fonts.char_width(ch, font, size);
        if !current.is_empty() && width + w > max_width {
            pieces.push(std::mem::take(&mut current));
            width = 0.0;
        }
        current.push(ch);
        width += w;
    }
    pieces.push(current);
    pieces
}

impl Block {
    /// Set pre-broken lines at (x, y) within a box `width` wide, one element
    /// per line so the block can be split between any two lines. Returns the
    /// height used.
    #[allow(clippy::too_many_arguments)]
    pub fn text_lines(
        &mut self,
        fonts: &FontContext,
        lines: &[String],
        x: f64,
        y: f64,
        width: f64,
        style: &TextStyle,
        align: TextAlign,
    ) -> f64 {
        let line_box = style.line_box();
        for (i, text) in lines.iter().enumerate() {
            let top = y + i as f64 * line_box;
            let line_width = fonts.measure_string(text, &style.font, style.size);
            let line_x = match align {
                TextAlign::Left => x,
                TextAlign::Center => x + (width - line_width) / 2.0,
                TextAlign::Right => x + width - line_width,
            };
            if text.is_empty() {
                continue;
            }
            self.push(LayoutElement {
                x,
                y: top,
                width,
                height: line_box,
                draw: DrawCommand::Text {
                    lines: vec![TextLine {
                        x: line_x,
                        y: top + style.size,
                        width: line_width,
                        text: text.clone(),
                    }],
                    font: style.font.clone(),
                    font_size: style.size,
                    color: style.color,
                },
                section: None,
            });
        }
        let used = lines.len() as f64 * line_box;
        self.pad_to(y + used);
        used
    }

    /// Wrap and set a paragraph. Returns the height used.
    #[allow(clippy::too_many_arguments)]
    pub fn paragraph(
        &mut self,
        fonts: &FontContext,
        text: &str,
        x: f64,
        y: f64,
        width: f64,
        style: &TextStyle,
        align: TextAlign,
    ) -> f64 {
        let lines = wrap_text(text, fonts, &style.font, style.size, width);
        self.text_lines(fonts, &lines, x, y, width, style, align)
    }
}
