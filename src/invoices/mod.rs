//! Invoice adapters for both roles under one import path.
//!
//! Pure re-export surface - no logic, no state. Unifies the tutor-side
//! adapter (list, create, update, delete, send, cancel, detail), the
//! parent-side adapter (list, mark viewed, initiate payment, detail)
//! and the invoice record types, so consumers import everything
//! invoice-shaped from `lessonwise::invoices`.

pub mod parent;
pub mod tutor;

pub use parent::{ParentInvoiceApi, ParentInvoiceQueries};
pub use tutor::{TutorInvoiceApi, TutorInvoiceQueries};

pub use crate::models::invoice::{
    CreateInvoiceRequest, Invoice, InvoiceFilter, InvoiceLine, InvoicePayment, InvoiceStatus,
    UpdateInvoiceRequest,
};
