//! The line-items table.
//!
//! The only renderer that drives the cursor itself: rows are placed one at a
//! time so the table can break between any two rows, and the column header
//! row is re-emitted at the top of every continuation page.

use super::format::{format_percent, format_quantity};
use super::{SectionContext, SectionFault};
use crate::layout::{wrap_text, Block, PageCursor, Stroke, TextStyle};
use crate::model::LineItem;
use crate::style::{Color, LineItemsStyle, TextAlign};

/// Horizontal padding inside a cell.
const CELL_PADDING: f64 = 4.0;
/// Vertical padding of a row, split evenly above and below the text.
const ROW_PADDING: f64 = 8.0;
const BORDER_WIDTH: f64 = 0.5;
/// Narrowest description column the table accepts.
const MIN_DESCRIPTION_WIDTH: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Number,
    ItemCode,
    Description,
    Quantity,
    UnitPrice,
    Discount,
    Tax,
    Amount,
}

impl ColumnKind {
    /// Fixed width in points. Description takes whatever is left.
    fn fixed_width(self) -> Option<f64> {
        match self {
            ColumnKind::Number => Some(24.0),
            ColumnKind::ItemCode => Some(60.0),
            ColumnKind::Description => None,
            ColumnKind::Quantity => Some(40.0),
            ColumnKind::UnitPrice => Some(65.0),
            ColumnKind::Discount => Some(50.0),
            ColumnKind::Tax => Some(45.0),
            ColumnKind::Amount => Some(70.0),
        }
    }

    fn title(self) -> &'static str {
        match self {
            ColumnKind::Number => "#",
            ColumnKind::ItemCode => "Code",
            ColumnKind::Description => "Description",
            ColumnKind::Quantity => "Qty",
            ColumnKind::UnitPrice => "Unit Price",
            ColumnKind::Discount => "Disc.",
            ColumnKind::Tax => "Tax",
            ColumnKind::Amount => "Amount",
        }
    }

    fn align(self) -> TextAlign {
        match self {
            ColumnKind::ItemCode | ColumnKind::Description => TextAlign::Left,
            _ => TextAlign::Right,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Column {
    kind: ColumnKind,
    width: f64,
}

fn columns(style: &LineItemsStyle, table_width: f64) -> Result<Vec<Column>, SectionFault> {
    let set = style.columns;
    let kinds = [
        (ColumnKind::Number, style.number_format.is_some()),
        (ColumnKind::ItemCode, set.item_code),
        (ColumnKind::Description, true),
        (ColumnKind::Quantity, set.quantity),
        (ColumnKind::UnitPrice, set.unit_price),
        (ColumnKind::Discount, set.discount),
        (ColumnKind::Tax, set.tax),
        (ColumnKind::Amount, true),
    ];
    let visible: Vec<ColumnKind> = kinds.iter().filter(|(_, on)| *on).map(|(k, _)| *k).collect();

    let fixed: f64 = visible.iter().filter_map(|k| k.fixed_width()).sum();
    let description = table_width - fixed;
    if description < MIN_DESCRIPTION_WIDTH {
        return Err(SectionFault(format!(
            "line-item columns need {:.0}pt but the table is {:.0}pt wide",
            fixed + MIN_DESCRIPTION_WIDTH,
            table_width
        )));
    }

    Ok(visible
        .into_iter()
        .map(|kind| Column {
            kind,
            width: kind.fixed_width().unwrap_or(description),
        })
        .collect())
}

fn cell(ctx: &SectionContext, style: &LineItemsStyle, kind: ColumnKind, index: usize, item: &LineItem) -> String {
    match kind {
        ColumnKind::Number => style
            .number_format
            .as_ref()
            .map(|f| f.format(index + 1))
            .unwrap_or_default(),
        ColumnKind::ItemCode => item.item_code.clone().unwrap_or_default(),
        ColumnKind::Description => item.description.clone(),
        ColumnKind::Quantity => format_quantity(item.quantity),
        ColumnKind::UnitPrice => ctx.money(item.unit_price),
        ColumnKind::Discount => item.discount.map(format_percent).unwrap_or_default(),
        ColumnKind::Tax => item.tax_rate.map(format_percent).unwrap_or_default(),
        ColumnKind::Amount => ctx.money(item.amount),
    }
}

/// One table row. Cell text wraps within its column and the row grows to
/// the tallest cell.
fn row(
    ctx: &SectionContext,
    columns: &[Column],
    cells: &[String],
    text: &TextStyle,
    fill: Option<Color>,
    stroke: Option<Stroke>,
) -> Block {
    let wrapped: Vec<Vec<String>> = columns
        .iter()
        .zip(cells)
        .map(|(col, content)| wrap_text(content, ctx.fonts, &text.font, text.size, col.width - 2.0 * CELL_PADDING))
        .collect();
    let lines = wrapped.iter().map(Vec::len).max().unwrap_or(1).max(1);
    let height = lines as f64 * text.line_box() + ROW_PADDING;

    let mut block = Block::new();
    block.rect(ctx.left, 0.0, ctx.width, height, fill, stroke);
    let mut x = ctx.left;
    for (col, cell_lines) in columns.iter().zip(&wrapped) {
        block.text_lines(
            ctx.fonts,
            cell_lines,
            x + CELL_PADDING,
            ROW_PADDING / 2.0,
            col.width - 2.0 * CELL_PADDING,
            text,
            col.kind.align(),
        );
        x += col.width;
    }
    block.pad_to(height);
    block
}

pub(super) fn render(ctx: &SectionContext, style: &LineItemsStyle, cursor: &mut PageCursor) -> Result<(), SectionFault> {
    let columns = columns(style, ctx.width)?;
    let stroke = Stroke::new(ctx.doc.palette.secondary.lighten(0.5), BORDER_WIDTH, style.border_style);

    let header_cells: Vec<String> = columns.iter().map(|c| c.kind.title().to_string()).collect();
    let header_text = ctx.bold().with_color(ctx.doc.palette.primary);
    let header = row(
        ctx,
        &columns,
        &header_cells,
        &header_text,
        Some(ctx.doc.palette.header_background),
        stroke,
    );

    let body = ctx.body();
    let items = &ctx.invoice.line_items;
    let rows: Vec<Block> = if items.is_empty() {
        let placeholder = Column {
            kind: ColumnKind::Description,
            width: ctx.width,
        };
        vec![row(
            ctx,
            &[placeholder],
            &["No items".to_string()],
            &ctx.muted(),
            None,
            stroke,
        )]
    } else {
        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let cells: Vec<String> = columns.iter().map(|c| cell(ctx, style, c.kind, i, item)).collect();
                let fill = (style.striped && i % 2 == 1).then_some(style.stripe_color);
                row(ctx, &columns, &cells, &body, fill, stroke)
            })
            .collect()
    };

    // Never leave the header stranded at the bottom of a page.
    let first = rows.first().map_or(0.0, |r| r.height);
    cursor.ensure_space(header.height + first, false);
    cursor.emit(header.clone());

    let mut rows_on_page = 0;
    for block in rows {
        if rows_on_page > 0 && block.height > cursor.available_height() {
            cursor.new_page();
            cursor.emit(header.clone());
            rows_on_page = 0;
        }
        let page = cursor.page_index();
        cursor.place_flowing(block, Some(&header));
        rows_on_page = if cursor.page_index() == page { rows_on_page + 1 } else { 1 };
    }
    Ok(())
}
