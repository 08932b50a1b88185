//! Data models for Lessonwise entities.
//!
//! This module contains the data structures exchanged with the
//! Lessonwise API and handed to the web frontend:
//!
//! - `Lesson`, `LessonStatus`: a student's scheduled lessons
//! - `StudentProfile`, `ScheduleFilter`, `ChildSchedule`: the parent
//!   schedule view and its filters
//! - Invoice types: `Invoice`, `InvoiceLine`, `InvoiceStatus`, request
//!   bodies and the payment redirect
//!
//! Wire structs mirror the server's snake_case field names; view models
//! serialize camelCase where the frontend expects it.

pub mod invoice;
pub mod lesson;
pub mod schedule;

pub use invoice::{
    CreateInvoiceRequest, Invoice, InvoiceFilter, InvoiceLine, InvoicePayment, InvoiceStatus,
    UpdateInvoiceRequest,
};
pub use lesson::{Lesson, LessonStatus, UNSPECIFIED_SUBJECT};
pub use schedule::{ChildSchedule, ChildScheduleResponse, ScheduleFilter, StudentProfile};
