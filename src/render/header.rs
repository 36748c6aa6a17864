//! Title, optional logo, subtitle and company name, closed by a rule in the
//! primary color.

use std::sync::Arc;

use super::{non_blank, SectionContext, SectionFault};
use crate::image_loader::LoadedImage;
use crate::layout::{Block, Stroke};
use crate::style::{BorderStyle, HeaderStyle, TextAlign};

const MAX_LOGO_HEIGHT: f64 = 60.0;
const LOGO_GAP: f64 = 12.0;
const RULE_GAP: f64 = 6.0;
const RULE_WIDTH: f64 = 1.5;

pub(super) fn compose(ctx: &SectionContext, style: &HeaderStyle) -> Result<Block, SectionFault> {
    let mut block = Block::new();

    let mut text_x = ctx.left;
    let mut text_width = ctx.width;
    let mut text_top = 0.0;
    let mut align = style.align;

    if let Some(logo) = ctx.logo.filter(|_| style.show_logo) {
        let (w, h) = logo_size(logo, style.logo_width.min(ctx.width / 2.0));
        match style.align {
            TextAlign::Left => {
                block.image(ctx.left, 0.0, w, h, Arc::clone(logo));
                text_x = ctx.left + w + LOGO_GAP;
                text_width = ctx.width - w - LOGO_GAP;
                align = TextAlign::Right;
            }
            TextAlign::Right => {
                block.image(ctx.left + ctx.width - w, 0.0, w, h, Arc::clone(logo));
                text_width = ctx.width - w - LOGO_GAP;
                align = TextAlign::Left;
            }
            TextAlign::Center => {
                block.image(ctx.left + (ctx.width - w) / 2.0, 0.0, w, h, Arc::clone(logo));
                text_top = h + LOGO_GAP / 2.0;
            }
        }
    }

    let mut y = text_top;
    let title = ctx.template.header.title.trim();
    if !title.is_empty() {
        y += block.paragraph(ctx.fonts, title, text_x, y, text_width, &ctx.heading(), align);
    }
    if let Some(subtitle) = non_blank(ctx.template.header.subtitle.as_deref()) {
        let subtitle_style = ctx.muted().with_size(ctx.section.font_size + 2.0);
        y += block.paragraph(ctx.fonts, subtitle, text_x, y, text_width, &subtitle_style, align);
    }
    if let Some(name) = non_blank(ctx.template.company.name.as_deref()) {
        block.paragraph(ctx.fonts, name, text_x, y, text_width, &ctx.bold(), align);
    }

    if block.is_empty() {
        return Ok(block);
    }

    let rule_y = block.height + RULE_GAP;
    block.hline(
        ctx.left,
        rule_y,
        ctx.width,
        Stroke::new(ctx.doc.palette.primary, RULE_WIDTH, BorderStyle::Solid),
    );
    block.pad_to(rule_y + RULE_WIDTH);
    Ok(block)
}

/// Fit within `max_width` and [`MAX_LOGO_HEIGHT`], keeping the aspect ratio.
fn logo_size(logo: &LoadedImage, max_width: f64) -> (f64, f64) {
    let (w, h) = logo.fit_width(max_width);
    if h > MAX_LOGO_HEIGHT {
        let scale = MAX_LOGO_HEIGHT / h;
        (w * scale, MAX_LOGO_HEIGHT)
    } else {
        (w, h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_loader::decode_image;
    use crate::image_loader::tests::png_bytes;
    use crate::layout::DrawCommand;
    use crate::render::fixture::{texts, Fixture};
    use crate::template::SectionKind;

    #[test]
    fn text_only_header() {
        let mut f = Fixture::standard();
        f.template.header.subtitle = Some("Tax invoice".to_string());
        f.template.company.name = Some("Acme Tooling".to_string());
        let style = header_style(&f);
        let block = compose(&f.context(SectionKind::Header), &style).unwrap();

        assert_eq!(texts(&block), vec!["INVOICE", "Tax invoice", "Acme Tooling"]);
        assert!(block.elements.iter().all(|e| !matches!(e.draw, DrawCommand::Image { .. })));
        assert!(matches!(block.elements.last().unwrap().draw, DrawCommand::Line { .. }));
    }

    #[test]
    fn logo_sits_left_and_title_moves_right() {
        let mut f = Fixture::standard();
        f.logo = Some(Arc::new(decode_image(&png_bytes(200, 100, [200, 30, 30, 255]), "logo.png").unwrap()));
        let style = header_style(&f);
        let ctx = f.context(SectionKind::Header);
        let block = compose(&ctx, &style).unwrap();

        let image = block
            .elements
            .iter()
            .find(|e| matches!(e.draw, DrawCommand::Image { .. }))
            .unwrap();
        assert_eq!(image.x, ctx.left);
        assert_eq!(image.width, 120.0);
        assert_eq!(image.height, 60.0);

        let DrawCommand::Text { lines, .. } = &block.elements[1].draw else {
            panic!("expected the title");
        };
        assert!((lines[0].x + lines[0].width - (ctx.left + ctx.width)).abs() < 1e-6);
    }

    #[test]
    fn tall_logo_is_capped() {
        let img = decode_image(&png_bytes(10, 100, [200, 30, 30, 255]), "tall.png").unwrap();
        let (w, h) = logo_size(&img, 120.0);
        assert_eq!(h, MAX_LOGO_HEIGHT);
        assert!((w - 6.0).abs() < 1e-9);
    }

    #[test]
    fn hidden_logo_is_not_drawn() {
        let mut f = Fixture::standard();
        f.logo = Some(Arc::new(decode_image(&png_bytes(20, 20, [200, 30, 30, 255]), "logo.png").unwrap()));
        let mut style = header_style(&f);
        style.show_logo = false;
        let block = compose(&f.context(SectionKind::Header), &style).unwrap();
        assert!(block.elements.iter().all(|e| !matches!(e.draw, DrawCommand::Image { .. })));
    }

    fn header_style(f: &Fixture) -> HeaderStyle {
        match &f.context(SectionKind::Header).section.style {
            crate::style::SectionStyle::Header(s) => s.clone(),
            other => panic!("unexpected {other:?}"),
        }
    }
}
