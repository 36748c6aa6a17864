//! Payment QR placeholder. Encoding the code is the caller's business; the
//! engine reserves a bordered square for it, titled above and captioned
//! below.

use super::{non_blank, SectionContext, SectionFault};
use crate::layout::{Block, Stroke};
use crate::style::{Color, PaymentQrStyle, TextAlign};

const CAPTION_GAP: f64 = 6.0;
const PLACEHOLDER_FILL: Color = Color {
    r: 0.97,
    g: 0.97,
    b: 0.98,
    a: 1.0,
};

pub(super) fn compose(ctx: &SectionContext, style: &PaymentQrStyle) -> Result<Block, SectionFault> {
    let size = style.box_size;
    if size <= 0.0 || size > ctx.width {
        return Err(SectionFault(format!(
            "QR box of {:.0}pt does not fit a {:.0}pt content width",
            size, ctx.width
        )));
    }

    let mut block = Block::new();
    let mut y = 0.0;
    if let Some(title) = non_blank(Some(&style.title)) {
        y += block.paragraph(ctx.fonts, title, ctx.left, y, ctx.width, &ctx.label(), TextAlign::Left);
    }

    let stroke = Stroke::new(ctx.section.colors.text, 1.0, style.border_style);
    block.rect(ctx.left, y, size, size, Some(PLACEHOLDER_FILL), stroke);
    let mark = ctx.muted();
    block.text_lines(
        ctx.fonts,
        &["QR".to_string()],
        ctx.left,
        y + (size - mark.line_box()) / 2.0,
        size,
        &mark,
        TextAlign::Center,
    );

    y += size + CAPTION_GAP;
    if let Some(caption) = non_blank(Some(&style.caption)) {
        y += block.paragraph(ctx.fonts, caption, ctx.left, y, ctx.width, &ctx.body(), TextAlign::Left);
    }
    if let Some(link) = non_blank(ctx.invoice.payment_link.as_deref()) {
        let link_style = ctx.body().with_color(ctx.section.colors.accent);
        block.paragraph(ctx.fonts, link, ctx.left, y, ctx.width, &link_style, TextAlign::Left);
    }
    Ok(block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::DrawCommand;
    use crate::render::fixture::{texts, Fixture};
    use crate::style::SectionStyle;
    use crate::template::SectionKind;

    fn qr_style(f: &Fixture) -> PaymentQrStyle {
        match &f.context(SectionKind::PaymentQr).section.style {
            SectionStyle::PaymentQr(s) => s.clone(),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn placeholder_box_with_title_and_caption() {
        let mut f = Fixture::standard();
        f.invoice.payment_link = Some("https://pay.example/inv-42".to_string());
        let ctx = f.context(SectionKind::PaymentQr);
        let block = compose(&ctx, &qr_style(&f)).unwrap();

        let text = texts(&block);
        assert_eq!(text[0], "Scan to Pay");
        assert_eq!(text[1], "QR");
        assert!(text.contains(&"https://pay.example/inv-42".to_string()));

        let square = block
            .elements
            .iter()
            .find(|e| matches!(e.draw, DrawCommand::Rect { .. }))
            .unwrap();
        assert_eq!((square.width, square.height), (90.0, 90.0));
        assert!(block.height >= square.bottom());
    }

    #[test]
    fn caption_and_link_sit_below_the_box() {
        let mut f = Fixture::standard();
        f.invoice.payment_link = Some("https://pay.example/inv-42".to_string());
        let ctx = f.context(SectionKind::PaymentQr);
        let block = compose(&ctx, &qr_style(&f)).unwrap();

        let square = block
            .elements
            .iter()
            .find(|e| matches!(e.draw, DrawCommand::Rect { .. }))
            .unwrap();
        let top_of = |needle: &str| {
            block
                .elements
                .iter()
                .find(|e| e.text().is_some_and(|t| t.contains(needle)))
                .map(|e| (e.x, e.y))
                .unwrap()
        };
        let (caption_x, caption_y) = top_of("banking app");
        let (_, link_y) = top_of("pay.example");
        assert_eq!(caption_x, ctx.left);
        assert!(caption_y >= square.bottom());
        assert!(link_y > caption_y);
        assert!(block.height > link_y);
    }

    #[test]
    fn oversized_box_faults() {
        let f = Fixture::standard();
        let mut style = qr_style(&f);
        style.box_size = 5000.0;
        assert!(compose(&f.context(SectionKind::PaymentQr), &style).is_err());
    }
}
