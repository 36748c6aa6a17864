//! Boxed notes followed by payment terms.

use super::{framed, non_blank, SectionContext, SectionFault};
use crate::layout::{Block, Stroke};
use crate::style::{NotesStyle, TextAlign};

const BOX_PADDING: f64 = 8.0;
const TERMS_GAP: f64 = 10.0;

pub(super) fn compose(ctx: &SectionContext, style: &NotesStyle) -> Result<Block, SectionFault> {
    let notes = non_blank(ctx.invoice.notes.as_deref()).or(non_blank(ctx.template.default_notes.as_deref()));
    let terms = if style.show_payment_terms {
        non_blank(ctx.invoice.terms.as_deref()).or(non_blank(ctx.template.default_payment_terms.as_deref()))
    } else {
        None
    };

    let mut block = Block::new();

    if let Some(notes) = notes {
        let inner_x = ctx.left + BOX_PADDING;
        let inner_width = ctx.width - 2.0 * BOX_PADDING;
        let mut content = Block::new();
        let mut y = BOX_PADDING;
        if !style.title.trim().is_empty() {
            y += content.paragraph(ctx.fonts, style.title.trim(), inner_x, y, inner_width, &ctx.label(), TextAlign::Left);
        }
        content.paragraph(ctx.fonts, notes, inner_x, y, inner_width, &ctx.body(), TextAlign::Left);

        let border = Stroke::new(ctx.doc.palette.secondary, 0.75, style.border_style);
        block = framed(content, ctx.left, ctx.width, BOX_PADDING, None, border);
    }

    if let Some(terms) = terms {
        let mut section = Block::new();
        let mut y = 0.0;
        if !style.terms_title.trim().is_empty() {
            y += section.paragraph(ctx.fonts, style.terms_title.trim(), ctx.left, y, ctx.width, &ctx.label(), TextAlign::Left);
        }
        section.paragraph(ctx.fonts, terms, ctx.left, y, ctx.width, &ctx.body(), TextAlign::Left);
        block.stack(section, TERMS_GAP);
    }

    Ok(block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::DrawCommand;
    use crate::render::fixture::{texts, Fixture};
    use crate::style::{BorderStyle, SectionStyle};
    use crate::template::SectionKind;

    fn notes_style(f: &Fixture) -> NotesStyle {
        match &f.context(SectionKind::Notes).section.style {
            SectionStyle::Notes(s) => s.clone(),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn falls_back_to_template_defaults() {
        let mut f = Fixture::standard();
        f.template.default_notes = Some("Thanks for ordering.".to_string());
        let block = compose(&f.context(SectionKind::Notes), &notes_style(&f)).unwrap();
        assert_eq!(
            texts(&block),
            vec!["Notes", "Thanks for ordering.", "Payment Terms", "Payment due within 30 days."]
        );
        assert!(matches!(
            block.elements[0].draw,
            DrawCommand::Rect { fill: None, stroke: Some(_) }
        ));
    }

    #[test]
    fn invoice_values_win() {
        let mut f = Fixture::standard();
        f.template.default_notes = Some("Default".to_string());
        f.invoice.notes = Some("Deliver to dock 4".to_string());
        f.invoice.terms = Some("Net 15".to_string());
        let block = compose(&f.context(SectionKind::Notes), &notes_style(&f)).unwrap();
        let text = texts(&block);
        assert!(text.contains(&"Deliver to dock 4".to_string()));
        assert!(text.contains(&"Net 15".to_string()));
        assert!(!text.contains(&"Default".to_string()));
    }

    #[test]
    fn terms_can_be_switched_off() {
        let mut f = Fixture::standard();
        let mut style = notes_style(&f);
        style.show_payment_terms = false;
        f.invoice.notes = None;
        let block = compose(&f.context(SectionKind::Notes), &style).unwrap();
        assert!(block.is_empty());
    }

    #[test]
    fn borderless_box() {
        let mut f = Fixture::standard();
        f.invoice.notes = Some("Plain".to_string());
        let mut style = notes_style(&f);
        style.border_style = BorderStyle::None;
        let block = compose(&f.context(SectionKind::Notes), &style).unwrap();
        assert!(block.elements.iter().all(|e| !matches!(e.draw, DrawCommand::Rect { .. })));
    }

    #[test]
    fn long_notes_wrap_to_content_width() {
        let mut f = Fixture::standard();
        f.invoice.notes = Some("lorem ipsum ".repeat(60));
        let ctx = f.context(SectionKind::Notes);
        let block = compose(&ctx, &notes_style(&f)).unwrap();
        assert!(texts(&block).len() > 4);
        assert!(block.elements.iter().all(|e| e.x + e.width <= ctx.left + ctx.width + 1e-6));
    }
}
