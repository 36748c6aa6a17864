//! Thank-you line and footer text, anchored to the bottom margin.
//!
//! Under [`FooterPolicy::Once`](crate::config::FooterPolicy) the footer is
//! drawn where the section loop reaches it, at the bottom of that page.
//! Under `EveryPage` the assembler composes it once and stamps it on every
//! page after layout.

use super::{framed, non_blank, SectionContext, SectionFault};
use crate::layout::{Block, PageCursor, Stroke};
use crate::style::{BorderStyle, FooterStyle};

const PADDING: f64 = 6.0;

pub(super) fn compose(ctx: &SectionContext, style: &FooterStyle) -> Result<Block, SectionFault> {
    let thank_you = style
        .show_thank_you
        .then(|| non_blank(Some(&style.thank_you_text)))
        .flatten();
    let text = non_blank(ctx.template.footer_text.as_deref());
    if thank_you.is_none() && text.is_none() {
        return Ok(Block::new());
    }

    let mut content = Block::new();
    let mut y = PADDING;
    if let Some(thank_you) = thank_you {
        y += content.paragraph(ctx.fonts, thank_you, ctx.left, y, ctx.width, &ctx.bold(), style.align);
    }
    if let Some(text) = text {
        content.paragraph(ctx.fonts, text, ctx.left, y, ctx.width, &ctx.muted(), style.align);
    }
    content.hline(
        ctx.left,
        0.0,
        ctx.width,
        Stroke::new(ctx.doc.palette.secondary, 0.5, BorderStyle::Solid),
    );

    let fill = ctx.section.colors.background.unwrap_or(ctx.doc.palette.footer_background);
    Ok(framed(content, ctx.left, ctx.width, PADDING, Some(fill), None))
}

/// Draw the footer at the bottom of the current page, or of a fresh page if
/// the cursor is already past where it would go. Flow resumes below it.
pub(super) fn render_once(ctx: &SectionContext, style: &FooterStyle, cursor: &mut PageCursor) -> Result<(), SectionFault> {
    let block = compose(ctx, style)?;
    if block.is_empty() {
        return Ok(());
    }

    let anchor = |cursor: &PageCursor| (cursor.content_bottom() - block.height).max(cursor.margins().top);
    if cursor.y() + ctx.section.spacing.before > anchor(&*cursor) + 0.001 {
        cursor.new_page();
    }
    let y = anchor(&*cursor);
    let bottom = y + block.height;
    cursor.place_block_at(block, y);
    cursor.set_y(bottom);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::fixture::{texts, Fixture};
    use crate::style::{SectionStyle, TextAlign};
    use crate::template::SectionKind;

    fn footer_style(f: &Fixture) -> FooterStyle {
        match &f.context(SectionKind::Footer).section.style {
            SectionStyle::Footer(s) => s.clone(),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn thank_you_above_footer_text() {
        let mut f = Fixture::standard();
        f.template.footer_text = Some("Acme Tooling Ltd, registered in England".to_string());
        let block = compose(&f.context(SectionKind::Footer), &footer_style(&f)).unwrap();
        assert_eq!(
            texts(&block),
            vec!["Thank you for your business!", "Acme Tooling Ltd, registered in England"]
        );
    }

    #[test]
    fn centered_by_default() {
        let f = Fixture::standard();
        let ctx = f.context(SectionKind::Footer);
        let style = footer_style(&f);
        assert_eq!(style.align, TextAlign::Center);
        let block = compose(&ctx, &style).unwrap();
        let line = block.elements.iter().find_map(|e| match &e.draw {
            crate::layout::DrawCommand::Text { lines, .. } => Some(lines[0].clone()),
            _ => None,
        });
        let line = line.unwrap();
        let centre = line.x + line.width / 2.0;
        assert!((centre - (ctx.left + ctx.width / 2.0)).abs() < 1e-6);
    }

    #[test]
    fn nothing_to_say_renders_nothing() {
        let f = Fixture::standard();
        let mut style = footer_style(&f);
        style.show_thank_you = false;
        assert!(compose(&f.context(SectionKind::Footer), &style).unwrap().is_empty());
    }

    #[test]
    fn anchored_to_bottom_margin() {
        let f = Fixture::standard();
        let ctx = f.context(SectionKind::Footer);
        let mut cursor = f.cursor();
        cursor.advance(40.0);
        render_once(&ctx, &footer_style(&f), &mut cursor).unwrap();
        assert_eq!(cursor.page_count(), 1);
        assert!((cursor.y() - cursor.content_bottom()).abs() < 1e-9);
        let pages = cursor.finish();
        let lowest = pages[0].elements.iter().map(|e| e.bottom()).fold(0.0, f64::max);
        let bottom_margin = f.template.margins.to_points().bottom;
        assert!((lowest - (pages[0].height - bottom_margin)).abs() < 1e-6);
    }

    #[test]
    fn moves_to_a_new_page_when_past_the_anchor() {
        let f = Fixture::standard();
        let ctx = f.context(SectionKind::Footer);
        let mut cursor = f.cursor();
        cursor.set_y(cursor.content_bottom() - 5.0);
        render_once(&ctx, &footer_style(&f), &mut cursor).unwrap();
        assert_eq!(cursor.page_count(), 2);
    }
}
