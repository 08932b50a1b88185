use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Viewed,
    Paid,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::Viewed => "viewed",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvoiceStatus::Draft => write!(f, "Draft"),
            InvoiceStatus::Sent => write!(f, "Sent"),
            InvoiceStatus::Viewed => write!(f, "Viewed"),
            InvoiceStatus::Paid => write!(f, "Paid"),
            InvoiceStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct InvoiceLine {
    pub description: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    pub unit_price_cents: i64,
}

fn default_quantity() -> u32 {
    1
}

fn default_currency() -> String {
    "USD".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Invoice {
    pub id: String,
    pub invoice_number: Option<String>,
    pub student_name: Option<String>,
    #[serde(default)]
    pub amount_cents: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub status: InvoiceStatus,
    pub issued_on: Option<NaiveDate>,
    pub due_on: Option<NaiveDate>,
    pub viewed_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub lines: Vec<InvoiceLine>,
}

impl Invoice {
    /// Awaiting payment: sent to the parent but neither paid nor cancelled.
    pub fn is_open(&self) -> bool {
        matches!(self.status, InvoiceStatus::Sent | InvoiceStatus::Viewed)
    }

    pub fn amount_display(&self) -> String {
        format!(
            "{} {}.{:02}",
            self.currency,
            self.amount_cents / 100,
            (self.amount_cents % 100).abs()
        )
    }
}

/// Body of `POST /tutors/invoices`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateInvoiceRequest {
    pub student_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_on: Option<NaiveDate>,
    pub lines: Vec<InvoiceLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Body of `PATCH /tutors/invoices/{id}`. Only the fields present are
/// changed server-side.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateInvoiceRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_on: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines: Option<Vec<InvoiceLine>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Payment redirect returned by `POST /parents/invoices/{id}/payments`.
#[derive(Debug, Clone, Deserialize)]
pub struct InvoicePayment {
    pub invoice_id: String,
    pub payment_url: String,
    pub provider: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Optional filters for invoice list queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvoiceFilter {
    pub status: Option<InvoiceStatus>,
}

impl InvoiceFilter {
    pub fn to_query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(status) = self.status {
            params.push(("status", status.as_str().to_string()));
        }
        params
    }
}
