//! # Layout
//!
//! Page-native layout: content is placed INTO pages, never onto an endless
//! canvas that is sliced afterwards. A single [`PageCursor`] owns the current
//! page and vertical position for the whole document and makes every page
//! break decision.
//!
//! Most sections compose a detached [`Block`] first (coordinates relative to
//! the block's top) and hand it to the cursor, which decides whether it fits,
//! moves it to a fresh page, or splits it when it is taller than a page. The
//! line-items table is the exception: it draws row by row straight onto the
//! cursor so it can break between rows and repeat its header.
//!
//! All coordinates are points, measured from the top-left corner of the page.
//! The PDF writer flips them.

pub mod text;

pub use text::{wrap_text, TextStyle};

use std::sync::Arc;

use crate::font::FontKey;
use crate::image_loader::LoadedImage;
use crate::style::{BorderStyle, Color, Edges};
use crate::template::SectionKind;

/// Tolerance for floating point comparisons of positions.
const EPSILON: f64 = 0.001;

/// A single laid-out page.
#[derive(Debug, Clone)]
pub struct LayoutPage {
    pub width: f64,
    pub height: f64,
    pub elements: Vec<LayoutElement>,
}

/// A positioned drawing command.
#[derive(Debug, Clone)]
pub struct LayoutElement {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub draw: DrawCommand,
    /// The section that produced this element. `None` for document
    /// decoration such as page numbers.
    pub section: Option<SectionKind>,
}

impl LayoutElement {
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    fn offset(&mut self, dy: f64) {
        self.y += dy;
        if let DrawCommand::Text { lines, .. } = &mut self.draw {
            for line in lines {
                line.y += dy;
            }
        }
    }

    /// Rectangles can be cut across; everything else moves as a unit.
    fn is_splittable(&self) -> bool {
        matches!(self.draw, DrawCommand::Rect { .. })
    }

    /// The plain text of a text element, lines joined by newlines.
    pub fn text(&self) -> Option<String> {
        match &self.draw {
            DrawCommand::Text { lines, .. } => Some(
                lines
                    .iter()
                    .map(|l| l.text.as_str())
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub width: f64,
    pub style: BorderStyle,
}

impl Stroke {
    /// `None` for [`BorderStyle::None`], so callers can skip drawing.
    pub fn new(color: Color, width: f64, style: BorderStyle) -> Option<Self> {
        match style {
            BorderStyle::None => None,
            _ => Some(Self { color, width, style }),
        }
    }
}

#[derive(Debug, Clone)]
pub enum DrawCommand {
    Rect {
        fill: Option<Color>,
        stroke: Option<Stroke>,
    },
    /// A straight line from (x, y) to (x + width, y + height).
    Line { stroke: Stroke },
    Text {
        lines: Vec<TextLine>,
        font: FontKey,
        font_size: f64,
        color: Color,
    },
    Image { image: Arc<LoadedImage> },
}

/// One line of text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub x: f64,
    /// Baseline position.
    pub y: f64,
    pub width: f64,
    pub text: String,
}

/// Content composed off-page, positioned relative to its own top edge.
#[derive(Debug, Clone, Default)]
pub struct Block {
    pub elements: Vec<LayoutElement>,
    pub height: f64,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn push(&mut self, element: LayoutElement) {
        self.height = self.height.max(element.bottom());
        self.elements.push(element);
    }

    pub fn rect(&mut self, x: f64, y: f64, width: f64, height: f64, fill: Option<Color>, stroke: Option<Stroke>) {
        if fill.is_none() && stroke.is_none() {
            return;
        }
        self.push(LayoutElement {
            x,
            y,
            width,
            height,
            draw: DrawCommand::Rect { fill, stroke },
            section: None,
        });
    }

    pub fn hline(&mut self, x: f64, y: f64, width: f64, stroke: Option<Stroke>) {
        if let Some(stroke) = stroke {
            self.push(LayoutElement {
                x,
                y,
                width,
                height: 0.0,
                draw: DrawCommand::Line { stroke },
                section: None,
            });
        }
    }

    pub fn image(&mut self, x: f64, y: f64, width: f64, height: f64, image: Arc<LoadedImage>) {
        self.push(LayoutElement {
            x,
            y,
            width,
            height,
            draw: DrawCommand::Image { image },
            section: None,
        });
    }

    /// Reserve empty space at the bottom.
    pub fn pad_to(&mut self, height: f64) {
        self.height = self.height.max(height);
    }

    /// Append another block below this one, `gap` points apart.
    pub fn stack(&mut self, other: Block, gap: f64) {
        if other.is_empty() && other.height <= 0.0 {
            return;
        }
        let dy = if self.height > 0.0 { self.height + gap } else { 0.0 };
        for mut el in other.elements {
            el.offset(dy);
            self.elements.push(el);
        }
        self.height = dy + other.height;
    }

    /// The largest cut at or above `limit` that no unsplittable element
    /// straddles.
    fn cut_point(&self, limit: f64) -> f64 {
        let mut cut = limit;
        loop {
            let straddler = self
                .elements
                .iter()
                .filter(|e| !e.is_splittable())
                .filter(|e| e.y < cut - EPSILON && e.bottom() > cut + EPSILON)
                .map(|e| e.y)
                .fold(None, |acc: Option<f64>, y| Some(acc.map_or(y, |a| a.min(y))));
            match straddler {
                Some(top) => cut = top,
                None => return cut,
            }
        }
    }

    /// Split at `cut`. Rectangles crossing the cut are divided; the tail is
    /// re-based to start at zero.
    fn split_at(self, cut: f64) -> (Block, Block) {
        let mut head = Block::new();
        let mut tail = Block::new();
        for el in self.elements {
            if el.bottom() <= cut + EPSILON {
                head.push(el);
            } else if el.y >= cut - EPSILON {
                let mut el = el;
                el.offset(-cut);
                tail.push(el);
            } else {
                // Splittable element straddling the cut.
                let mut top = el.clone();
                top.height = cut - el.y;
                head.push(top);
                let mut bottom = el;
                bottom.height = bottom.bottom() - cut;
                bottom.y = 0.0;
                tail.push(bottom);
            }
        }
        head.height = head.height.max(cut.min(self.height));
        tail.height = tail.height.max(self.height - cut);
        (head, tail)
    }
}

/// Snapshot of the cursor for rolling back a faulted section.
#[derive(Debug, Clone, Copy)]
pub struct Checkpoint {
    pages: usize,
    elements: usize,
    cursor_y: f64,
}

/// The layout cursor and pagination controller.
#[derive(Debug)]
pub struct PageCursor {
    pages: Vec<LayoutPage>,
    width: f64,
    height: f64,
    margins: Edges,
    /// Space kept free above the bottom margin on every page.
    reserved_bottom: f64,
    /// Absolute vertical position on the current page.
    y: f64,
    section: Option<SectionKind>,
}

impl PageCursor {
    pub fn new(width: f64, height: f64, margins: Edges) -> Self {
        Self {
            pages: vec![LayoutPage {
                width,
                height,
                elements: Vec::new(),
            }],
            width,
            height,
            margins,
            reserved_bottom: 0.0,
            y: margins.top,
            section: None,
        }
    }

    pub fn reserve_bottom(&mut self, height: f64) {
        self.reserved_bottom = height.max(0.0);
    }

    /// Tag subsequently emitted elements with `section`.
    pub fn begin_section(&mut self, section: Option<SectionKind>) {
        self.section = section;
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn set_y(&mut self, y: f64) {
        self.y = y;
    }

    pub fn page_index(&self) -> usize {
        self.pages.len() - 1
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn page_width(&self) -> f64 {
        self.width
    }

    pub fn page_height(&self) -> f64 {
        self.height
    }

    pub fn margins(&self) -> Edges {
        self.margins
    }

    pub fn left(&self) -> f64 {
        self.margins.left
    }

    pub fn content_width(&self) -> f64 {
        self.width - self.margins.horizontal()
    }

    /// The lowest y flowing content may reach.
    pub fn content_bottom(&self) -> f64 {
        self.height - self.margins.bottom - self.reserved_bottom
    }

    pub fn available_height(&self) -> f64 {
        self.content_bottom() - self.y
    }

    /// Whether nothing has been placed on the current page yet.
    pub fn at_page_top(&self) -> bool {
        (self.y - self.margins.top).abs() < EPSILON
    }

    pub fn advance(&mut self, consumed: f64) {
        self.y += consumed;
    }

    pub fn new_page(&mut self) {
        self.pages.push(LayoutPage {
            width: self.width,
            height: self.height,
            elements: Vec::new(),
        });
        self.y = self.margins.top;
        log::debug!("Page break: now on page {}", self.pages.len());
    }

    /// Start a new page if `required` does not fit, unless this is the last
    /// section. Returns whether a break happened.
    pub fn ensure_space(&mut self, required: f64, is_last: bool) -> bool {
        if self.available_height() + EPSILON < required && !is_last && !self.at_page_top() {
            self.new_page();
            return true;
        }
        false
    }

    /// Add an element to the current page, tagged with the current section.
    pub fn push(&mut self, mut element: LayoutElement) {
        element.section = self.section;
        if let Some(page) = self.pages.last_mut() {
            page.elements.push(element);
        }
    }

    /// Place a block at the cursor and advance past it. Blocks taller than
    /// a whole page are split across pages. The last section may run into
    /// the bottom margin instead of breaking, but never off the paper.
    pub fn place_block(&mut self, block: Block, is_last: bool) {
        self.ensure_space(block.height, is_last);

        let mut remaining = block;
        loop {
            let limit = if is_last {
                self.height - self.y
            } else {
                self.available_height()
            };
            if remaining.height <= limit + EPSILON {
                self.emit(remaining);
                return;
            }

            let mut cut = remaining.cut_point(limit);
            if cut <= EPSILON {
                if !self.at_page_top() {
                    self.new_page();
                    continue;
                }
                // Not even one element fits an empty page: let it overflow.
                cut = remaining
                    .elements
                    .iter()
                    .map(LayoutElement::bottom)
                    .fold(f64::INFINITY, f64::min)
                    .min(remaining.height);
            }

            let (head, tail) = remaining.split_at(cut);
            self.emit(head);
            if tail.is_empty() {
                return;
            }
            self.new_page();
            remaining = tail;
        }
    }

    /// Place a block at an absolute y on the current page without moving the
    /// cursor.
    pub fn place_block_at(&mut self, block: Block, y: f64) {
        for mut el in block.elements {
            el.offset(y);
            self.push(el);
        }
    }

    /// Place a block at the cursor with no page break check beforehand;
    /// only a block taller than the remaining space is split. `continuation`
    /// is emitted at the top of every page the block spills onto. A tail
    /// holding nothing but cut-off rectangles is dropped.
    pub fn place_flowing(&mut self, block: Block, continuation: Option<&Block>) {
        let mut remaining = block;
        loop {
            let limit = self.available_height();
            if remaining.height <= limit + EPSILON {
                self.emit(remaining);
                return;
            }
            let cut = remaining.cut_point(limit);
            if cut <= EPSILON {
                self.emit(remaining);
                return;
            }
            let (head, tail) = remaining.split_at(cut);
            self.emit(head);
            if tail.elements.iter().all(LayoutElement::is_splittable) {
                return;
            }
            self.new_page();
            if let Some(header) = continuation {
                self.emit(header.clone());
            }
            remaining = tail;
        }
    }

    /// Place a block at the cursor and advance past it, no questions asked.
    pub fn emit(&mut self, block: Block) {
        let top = self.y;
        let height = block.height;
        self.place_block_at(block, top);
        self.y = top + height;
    }

    /// Draw a block produced per page by `make(page_index, page_count)` at
    /// absolute `y` on every page, after layout.
    pub fn stamp_each<F>(&mut self, y: f64, section: Option<SectionKind>, mut make: F)
    where
        F: FnMut(usize, usize) -> Block,
    {
        let total = self.pages.len();
        for (index, page) in self.pages.iter_mut().enumerate() {
            for mut el in make(index, total).elements {
                el.offset(y);
                el.section = section;
                page.elements.push(el);
            }
        }
    }

    /// Fill every page with `color`, underneath everything already on it.
    pub fn paint_background(&mut self, color: Color) {
        for page in &mut self.pages {
            page.elements.insert(
                0,
                LayoutElement {
                    x: 0.0,
                    y: 0.0,
                    width: page.width,
                    height: page.height,
                    draw: DrawCommand::Rect {
                        fill: Some(color),
                        stroke: None,
                    },
                    section: None,
                },
            );
        }
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            pages: self.pages.len(),
            elements: self.pages.last().map_or(0, |p| p.elements.len()),
            cursor_y: self.y,
        }
    }

    /// Discard everything emitted since `checkpoint`.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        self.pages.truncate(checkpoint.pages);
        if let Some(page) = self.pages.last_mut() {
            page.elements.truncate(checkpoint.elements);
        }
        self.y = checkpoint.cursor_y;
    }

    pub fn finish(self) -> Vec<LayoutPage> {
        self.pages
    }
}
