//! Issuer, recipient and invoice-info blocks.

use super::{non_blank, status_color, SectionContext, SectionFault};
use crate::layout::{wrap_text, Block, TextStyle};
use crate::model::{InvoiceStatus, Party};
use crate::style::{InfoStyle, PartyStyle, TextAlign};

/// Space between a key and its value in the invoice-info column.
const KEY_GAP: f64 = 8.0;

/// Contact lines in print order. Absent fields produce no line.
#[derive(Debug, Default, PartialEq)]
struct Contact<'a> {
    name: Option<&'a str>,
    address: Option<&'a str>,
    phone: Option<&'a str>,
    email: Option<&'a str>,
    website: Option<&'a str>,
    tax_id: Option<&'a str>,
}

impl<'a> Contact<'a> {
    fn from_party(party: &'a Party) -> Self {
        Self {
            name: non_blank(Some(&party.name)),
            address: non_blank(party.address.as_deref()),
            phone: non_blank(party.phone.as_deref()),
            email: non_blank(party.email.as_deref()),
            website: None,
            tax_id: non_blank(party.tax_id.as_deref()),
        }
    }

    fn is_empty(&self) -> bool {
        *self == Contact::default()
    }
}

pub(super) fn issuer(ctx: &SectionContext, style: &PartyStyle) -> Result<Block, SectionFault> {
    let company = &ctx.template.company;
    let mut contact = Contact::from_party(&ctx.invoice.issuer);
    contact.name = contact.name.or(non_blank(company.name.as_deref()));
    contact.address = contact.address.or(non_blank(company.address.as_deref()));
    contact.phone = contact.phone.or(non_blank(company.phone.as_deref()));
    contact.email = contact.email.or(non_blank(company.email.as_deref()));
    contact.website = non_blank(company.website.as_deref());
    Ok(party_block(ctx, &style.label, &contact))
}

pub(super) fn recipient(ctx: &SectionContext, style: &PartyStyle) -> Result<Block, SectionFault> {
    let contact = Contact::from_party(&ctx.invoice.recipient);
    Ok(party_block(ctx, &style.label, &contact))
}

fn party_block(ctx: &SectionContext, label: &str, contact: &Contact) -> Block {
    let mut block = Block::new();
    if contact.is_empty() {
        return block;
    }

    let width = ctx.width / 2.0;
    let body = ctx.body();
    let mut y = 0.0;

    if !label.trim().is_empty() {
        y += block.paragraph(ctx.fonts, label.trim(), ctx.left, y, width, &ctx.label(), TextAlign::Left);
    }
    if let Some(name) = contact.name {
        y += block.paragraph(ctx.fonts, name, ctx.left, y, width, &ctx.bold(), TextAlign::Left);
    }
    if let Some(address) = contact.address {
        // Blank address lines are dropped rather than printed as gaps.
        let lines: Vec<String> = address
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .flat_map(|l| wrap_text(l, ctx.fonts, &body.font, body.size, width))
            .collect();
        y += block.text_lines(ctx.fonts, &lines, ctx.left, y, width, &body, TextAlign::Left);
    }

    let tax_id = contact.tax_id.map(|id| format!("Tax ID: {}", id));
    for field in [contact.phone, contact.email, contact.website, tax_id.as_deref()]
        .into_iter()
        .flatten()
    {
        y += block.paragraph(ctx.fonts, field, ctx.left, y, width, &body, TextAlign::Left);
    }
    block
}

pub(super) fn invoice_info(ctx: &SectionContext, style: &InfoStyle) -> Result<Block, SectionFault> {
    let invoice = ctx.invoice;
    let body = ctx.body();
    let key_style = ctx.bold().with_color(ctx.doc.palette.secondary);

    let mut rows: Vec<(&str, String, TextStyle)> = vec![("Invoice #", invoice.number.clone(), body.clone())];
    if let Some(date) = non_blank(Some(&invoice.issue_date)) {
        rows.push(("Issue Date", ctx.date(date), body.clone()));
    }
    if let Some(date) = non_blank(Some(&invoice.due_date)) {
        rows.push(("Due Date", ctx.date(date), body.clone()));
    }
    rows.push((
        "Status",
        invoice.status.label().to_string(),
        status_style(ctx, invoice.status),
    ));
    if let Some(reference) = non_blank(invoice.reference_number.as_deref()) {
        rows.push(("Reference", reference.to_string(), body.clone()));
    }
    if let Some(po) = non_blank(invoice.po_number.as_deref()) {
        rows.push(("PO Number", po.to_string(), body.clone()));
    }

    let column = ctx.width / 2.0;
    let x = match style.align {
        TextAlign::Left => ctx.left,
        TextAlign::Center => ctx.left + column / 2.0,
        TextAlign::Right => ctx.left + ctx.width - column,
    };
    let key_width = rows
        .iter()
        .map(|(key, _, _)| ctx.measure(key, &key_style))
        .fold(0.0, f64::max);
    let value_x = x + key_width + KEY_GAP;
    let value_width = column - key_width - KEY_GAP;
    if value_width <= 0.0 {
        return Err(SectionFault(format!(
            "invoice-info column is {:.0}pt wide, too narrow for its labels",
            column
        )));
    }

    let mut block = Block::new();
    let mut y = 0.0;
    if let Some(title) = non_blank(style.title.as_deref()) {
        let title_style = ctx.label().with_size(ctx.section.font_size + 2.0);
        y += block.paragraph(ctx.fonts, title, x, y, column, &title_style, TextAlign::Left);
    }
    for (key, value, value_style) in &rows {
        block.text_lines(ctx.fonts, &[key.to_string()], x, y, key_width, &key_style, TextAlign::Left);
        let used = block.paragraph(ctx.fonts, value, value_x, y, value_width, value_style, TextAlign::Right);
        y += used.max(key_style.line_box());
    }
    Ok(block)
}

fn status_style(ctx: &SectionContext, status: InvoiceStatus) -> TextStyle {
    ctx.bold().with_color(status_color(status, ctx.section.colors.text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::DrawCommand;
    use crate::render::fixture::{texts, Fixture};
    use crate::style::{Color, SectionStyle};
    use crate::template::SectionKind;

    fn party_style(f: &Fixture, kind: SectionKind) -> PartyStyle {
        match &f.context(kind).section.style {
            SectionStyle::IssuerInfo(s) | SectionStyle::RecipientInfo(s) => s.clone(),
            other => panic!("unexpected {other:?}"),
        }
    }

    fn info_style(f: &Fixture) -> InfoStyle {
        match &f.context(SectionKind::InvoiceInfo).section.style {
            SectionStyle::InvoiceInfo(s) => s.clone(),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn issuer_lines_skip_absent_fields() {
        let f = Fixture::standard();
        let block = issuer(&f.context(SectionKind::IssuerInfo), &party_style(&f, SectionKind::IssuerInfo)).unwrap();
        assert_eq!(
            texts(&block),
            vec![
                "From",
                "Acme Tooling",
                "1 Forge Lane",
                "Sheffield",
                "billing@acme.test",
                "Tax ID: GB123"
            ]
        );
    }

    #[test]
    fn issuer_falls_back_to_branding() {
        let mut f = Fixture::standard();
        f.invoice.issuer = Party::default();
        f.template.company.name = Some("Branding Ltd".to_string());
        f.template.company.phone = Some("+44 1234".to_string());
        f.template.company.website = Some("acme.test".to_string());
        let block = issuer(&f.context(SectionKind::IssuerInfo), &party_style(&f, SectionKind::IssuerInfo)).unwrap();
        assert_eq!(texts(&block), vec!["From", "Branding Ltd", "+44 1234", "acme.test"]);
    }

    #[test]
    fn empty_recipient_renders_nothing() {
        let mut f = Fixture::standard();
        f.invoice.recipient = Party::default();
        let block = recipient(
            &f.context(SectionKind::RecipientInfo),
            &party_style(&f, SectionKind::RecipientInfo),
        )
        .unwrap();
        assert!(block.is_empty());
    }

    #[test]
    fn info_rows_and_status_color() {
        let f = Fixture::standard();
        let block = invoice_info(&f.context(SectionKind::InvoiceInfo), &info_style(&f)).unwrap();
        let text = texts(&block);
        assert_eq!(
            text,
            vec![
                "Invoice #",
                "INV-2024-0042",
                "Issue Date",
                "2024-03-01",
                "Due Date",
                "2024-03-31",
                "Status",
                "Pending",
                "Reference",
                "REF-9"
            ]
        );
        let status = block
            .elements
            .iter()
            .find(|e| e.text().as_deref() == Some("Pending"))
            .unwrap();
        let DrawCommand::Text { color, .. } = status.draw else {
            panic!("expected text");
        };
        assert_eq!(color, Color::rgb8(0xEA, 0x58, 0x0C));
    }

    #[test]
    fn draft_status_uses_text_color() {
        let mut f = Fixture::standard();
        f.invoice.status = InvoiceStatus::Draft;
        let ctx = f.context(SectionKind::InvoiceInfo);
        let block = invoice_info(&ctx, &info_style(&f)).unwrap();
        let status = block
            .elements
            .iter()
            .find(|e| e.text().as_deref() == Some("Draft"))
            .unwrap();
        let DrawCommand::Text { color, .. } = status.draw else {
            panic!("expected text");
        };
        assert_eq!(color, ctx.section.colors.text);
    }

    #[test]
    fn info_column_sits_on_the_right() {
        let f = Fixture::standard();
        let ctx = f.context(SectionKind::InvoiceInfo);
        let block = invoice_info(&ctx, &info_style(&f)).unwrap();
        assert!(block.elements.iter().all(|e| e.x >= ctx.left + ctx.width / 2.0 - 1e-6));
    }
}
