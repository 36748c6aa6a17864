//! Totals box, payment history and payment methods.

use super::format::format_percent;
use super::{non_blank, SectionContext, SectionFault};
use crate::layout::{wrap_text, Block, Stroke, TextStyle};
use crate::style::{BorderStyle, SummaryStyle, TextAlign};

/// Width of the right-aligned totals box.
const TOTALS_WIDTH: f64 = 260.0;
const RULE_GAP: f64 = 3.0;
const BLOCK_GAP: f64 = 12.0;

struct Line {
    label: String,
    value: String,
    style: TextStyle,
    rule_above: bool,
}

impl Line {
    fn new(label: impl Into<String>, value: String, style: &TextStyle) -> Self {
        Self {
            label: label.into(),
            value,
            style: style.clone(),
            rule_above: false,
        }
    }
}

pub(super) fn compose(ctx: &SectionContext, style: &SummaryStyle) -> Result<Block, SectionFault> {
    let mut block = totals(ctx, style);

    if style.show_payment_history && !ctx.invoice.payments.is_empty() {
        block.stack(payment_history(ctx), BLOCK_GAP);
    }
    if style.show_payment_methods {
        if let Some(methods) = non_blank(style.payment_methods.as_deref()) {
            let mut section = Block::new();
            let y = section.paragraph(ctx.fonts, "Payment Methods", ctx.left, 0.0, ctx.width, &ctx.label(), TextAlign::Left);
            section.paragraph(ctx.fonts, methods, ctx.left, y, ctx.width, &ctx.body(), TextAlign::Left);
            block.stack(section, BLOCK_GAP);
        }
    }
    Ok(block)
}

fn totals(ctx: &SectionContext, style: &SummaryStyle) -> Block {
    let invoice = ctx.invoice;
    let body = ctx.body();
    let bold = ctx.bold();

    let mut lines = vec![Line::new("Subtotal", ctx.money(invoice.subtotal), &body)];

    if style.detailed_taxes && !invoice.taxes.is_empty() {
        for tax in &invoice.taxes {
            let label = match tax.rate {
                Some(rate) => format!("{} ({})", tax.name, format_percent(rate)),
                None => tax.name.clone(),
            };
            lines.push(Line::new(label, ctx.money(tax.amount), &body));
        }
    } else {
        lines.push(Line::new("Tax", ctx.money(invoice.tax_total), &body));
    }

    if invoice.discount_total != 0.0 {
        lines.push(Line::new(
            "Discount",
            format!("-{}", ctx.money(invoice.discount_total.abs())),
            &body,
        ));
    }
    if invoice.shipping != 0.0 {
        lines.push(Line::new("Shipping", ctx.money(invoice.shipping), &body));
    }

    let mut total = Line::new("Total", ctx.money(invoice.total), &bold);
    total.rule_above = true;
    lines.push(total);

    if invoice.amount_paid != 0.0 {
        lines.push(Line::new("Amount Paid", ctx.money(invoice.amount_paid), &body));
    }

    let balance_style = bold
        .with_color(ctx.section.colors.accent)
        .with_size(ctx.section.font_size + 1.0);
    lines.push(Line::new("Balance Due", ctx.money(invoice.balance_due), &balance_style));

    let width = TOTALS_WIDTH.min(ctx.width);
    let x = ctx.left + ctx.width - width;
    let label_width = width * 0.6;
    let rule = Stroke::new(ctx.section.colors.text, 0.75, BorderStyle::Solid);

    let mut block = Block::new();
    let mut y = 0.0;
    for line in &lines {
        if line.rule_above {
            y += RULE_GAP;
            block.hline(x, y, width, rule);
            y += RULE_GAP;
        }
        let label_used = block.paragraph(ctx.fonts, &line.label, x, y, label_width, &line.style, TextAlign::Left);
        let value_used = block.paragraph(ctx.fonts, &line.value, x + label_width, y, width - label_width, &line.style, TextAlign::Right);
        y += label_used.max(value_used);
    }
    block
}

fn payment_history(ctx: &SectionContext) -> Block {
    let body = ctx.body();
    let bold = ctx.bold();
    // Date, method, reference, amount.
    let widths = [0.2, 0.3, 0.3, 0.2].map(|f| f * ctx.width);
    let aligns = [TextAlign::Left, TextAlign::Left, TextAlign::Left, TextAlign::Right];

    let mut block = Block::new();
    let mut y = block.paragraph(ctx.fonts, "Payment History", ctx.left, 0.0, ctx.width, &ctx.label(), TextAlign::Left);

    let header = ["Date", "Method", "Reference", "Amount"].map(str::to_string);
    y += table_row(ctx, &mut block, &header, &widths, &aligns, y, &bold);
    block.hline(
        ctx.left,
        y,
        ctx.width,
        Stroke::new(ctx.doc.palette.secondary, 0.5, BorderStyle::Solid),
    );
    y += RULE_GAP;

    for payment in &ctx.invoice.payments {
        let cells = [
            ctx.date(&payment.date),
            payment.method.clone(),
            payment.reference.clone().unwrap_or_default(),
            ctx.money(payment.amount),
        ];
        y += table_row(ctx, &mut block, &cells, &widths, &aligns, y, &body);
    }
    block
}

fn table_row(
    ctx: &SectionContext,
    block: &mut Block,
    cells: &[String; 4],
    widths: &[f64; 4],
    aligns: &[TextAlign; 4],
    y: f64,
    style: &TextStyle,
) -> f64 {
    let mut x = ctx.left;
    let mut height: f64 = style.line_box();
    for ((text, width), align) in cells.iter().zip(widths).zip(aligns) {
        let lines = wrap_text(text, ctx.fonts, &style.font, style.size, width - 4.0);
        height = height.max(block.text_lines(ctx.fonts, &lines, x, y, width - 4.0, style, *align));
        x += width;
    }
    height
}
