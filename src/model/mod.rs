//! # Invoice Model
//!
//! The concrete invoice record the engine renders. It is produced by the
//! billing side of the application and handed to the engine as an immutable
//! snapshot; nothing in this crate mutates it.
//!
//! Amounts are plain `f64` values in the invoice currency. The engine does
//! not recompute totals: what the record says is what gets printed.

use serde::{Deserialize, Serialize};

/// A complete invoice ready for rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    /// Human-facing invoice number, e.g. "INV-2024-0042".
    pub number: String,
    #[serde(default)]
    pub reference_number: Option<String>,
    #[serde(default)]
    pub po_number: Option<String>,

    #[serde(default)]
    pub issuer: Party,
    #[serde(default)]
    pub recipient: Party,

    /// ISO date (`YYYY-MM-DD`) or free text.
    #[serde(default)]
    pub issue_date: String,
    #[serde(default)]
    pub due_date: String,

    #[serde(default)]
    pub line_items: Vec<LineItem>,

    #[serde(default)]
    pub subtotal: f64,
    /// Aggregate tax. Always printed when `taxes` is empty or detailed
    /// taxes are disabled.
    #[serde(default)]
    pub tax_total: f64,
    /// Itemized taxes, one line each when the summary asks for detail.
    #[serde(default)]
    pub taxes: Vec<TaxEntry>,
    #[serde(default)]
    pub discount_total: f64,
    #[serde(default)]
    pub shipping: f64,
    #[serde(default)]
    pub total: f64,
    #[serde(default)]
    pub amount_paid: f64,
    #[serde(default)]
    pub balance_due: f64,

    /// ISO 4217 code.
    #[serde(default = "default_currency")]
    pub currency: String,

    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub terms: Option<String>,

    #[serde(default)]
    pub status: InvoiceStatus,

    #[serde(default)]
    pub payments: Vec<Payment>,

    /// Payment link or code payload for the QR section. The engine only
    /// draws a placeholder; encoding belongs to the caller.
    #[serde(default)]
    pub payment_link: Option<String>,
}

fn default_currency() -> String {
    "USD".to_string()
}

/// A contact block: issuer or recipient.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    #[serde(default)]
    pub name: String,
    /// Multi-line address; embedded `\n` separate lines.
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub tax_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub description: String,
    #[serde(default)]
    pub item_code: Option<String>,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default)]
    pub unit_price: f64,
    /// Computed line amount, as stored on the invoice.
    #[serde(default)]
    pub amount: f64,
    /// Discount percentage.
    #[serde(default)]
    pub discount: Option<f64>,
    /// Tax rate percentage.
    #[serde(default)]
    pub tax_rate: Option<f64>,
}

/// A named tax line, e.g. "VAT 20%".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxEntry {
    pub name: String,
    #[serde(default)]
    pub rate: Option<f64>,
    pub amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub date: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub reference: Option<String>,
    pub amount: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Pending,
    Sent,
    Paid,
    Overdue,
    Cancelled,
}

impl InvoiceStatus {
    pub fn label(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "Draft",
            InvoiceStatus::Pending => "Pending",
            InvoiceStatus::Sent => "Sent",
            InvoiceStatus::Paid => "Paid",
            InvoiceStatus::Overdue => "Overdue",
            InvoiceStatus::Cancelled => "Cancelled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_invoice_deserializes_with_defaults() {
        let invoice: Invoice = serde_json::from_str(r#"{ "number": "INV-1" }"#).unwrap();
        assert_eq!(invoice.number, "INV-1");
        assert_eq!(invoice.currency, "USD");
        assert_eq!(invoice.status, InvoiceStatus::Draft);
        assert!(invoice.line_items.is_empty());
    }

    #[test]
    fn camel_case_fields() {
        let json = r#"{
            "number": "INV-2",
            "balanceDue": 12.5,
            "status": "overdue",
            "lineItems": [{ "description": "Bolts", "unitPrice": 2.5, "quantity": 5, "amount": 12.5, "taxRate": 20 }]
        }"#;
        let invoice: Invoice = serde_json::from_str(json).unwrap();
        assert_eq!(invoice.balance_due, 12.5);
        assert_eq!(invoice.status, InvoiceStatus::Overdue);
        assert_eq!(invoice.line_items[0].tax_rate, Some(20.0));
    }
}
