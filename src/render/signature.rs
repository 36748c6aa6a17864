use super::{SectionContext, SectionFault};
use crate::layout::{Block, Stroke};
use crate::style::{BorderStyle, SignatureStyle, TextAlign};

/// Room left above the rule for a handwritten signature.
const SIGNING_SPACE: f64 = 36.0;
const SIGNATURE_RULE: f64 = 180.0;
const DATE_RULE: f64 = 140.0;
const LABEL_GAP: f64 = 4.0;

pub(super) fn compose(ctx: &SectionContext, style: &SignatureStyle) -> Result<Block, SectionFault> {
    let needed = if style.show_date {
        SIGNATURE_RULE + DATE_RULE
    } else {
        SIGNATURE_RULE
    };
    if needed > ctx.width {
        return Err(SectionFault(format!(
            "signature rules need {:.0}pt, content is {:.0}pt wide",
            needed, ctx.width
        )));
    }

    let rule = Stroke::new(ctx.section.colors.text, 0.75, BorderStyle::Solid);
    let label = ctx.muted();
    let mut block = Block::new();

    block.hline(ctx.left, SIGNING_SPACE, SIGNATURE_RULE, rule);
    block.paragraph(
        ctx.fonts,
        &style.label,
        ctx.left,
        SIGNING_SPACE + LABEL_GAP,
        SIGNATURE_RULE,
        &label,
        TextAlign::Left,
    );

    if style.show_date {
        let x = ctx.left + ctx.width - DATE_RULE;
        block.hline(x, SIGNING_SPACE, DATE_RULE, rule);
        block.paragraph(
            ctx.fonts,
            &style.date_label,
            x,
            SIGNING_SPACE + LABEL_GAP,
            DATE_RULE,
            &label,
            TextAlign::Left,
        );
    }
    Ok(block)
}
