//! Tutor-side invoice adapter: the authoring role. Listing and detail
//! go through the query cache; every mutation invalidates the cached
//! tutor invoice queries so the next read refetches.

use std::future::Future;
use std::time::Duration;

use crate::api::ApiError;
use crate::cache::{QueryCache, QueryKey, QueryOptions, QuerySnapshot};
use crate::models::{CreateInvoiceRequest, Invoice, InvoiceFilter, UpdateInvoiceRequest};

/// Invoice reads are considered fresh for 60 seconds. Mutations
/// invalidate eagerly, so lists stay current through the paths that
/// actually change data.
const INVOICE_STALE_SECS: u64 = 60;

/// The slice of the REST API the tutor invoice adapter consumes.
pub trait TutorInvoiceApi: Clone + Send + Sync + 'static {
    /// `GET /tutors/invoices`
    fn tutor_invoices(
        &self,
        filter: &InvoiceFilter,
    ) -> impl Future<Output = Result<Vec<Invoice>, ApiError>> + Send;

    /// `GET /tutors/invoices/{id}`
    fn tutor_invoice_detail(
        &self,
        invoice_id: &str,
    ) -> impl Future<Output = Result<Invoice, ApiError>> + Send;

    /// `POST /tutors/invoices`
    fn create_invoice(
        &self,
        req: &CreateInvoiceRequest,
    ) -> impl Future<Output = Result<Invoice, ApiError>> + Send;

    /// `PATCH /tutors/invoices/{id}`
    fn update_invoice(
        &self,
        invoice_id: &str,
        patch: &UpdateInvoiceRequest,
    ) -> impl Future<Output = Result<Invoice, ApiError>> + Send;

    /// `DELETE /tutors/invoices/{id}`
    fn delete_invoice(&self, invoice_id: &str)
        -> impl Future<Output = Result<(), ApiError>> + Send;

    /// `POST /tutors/invoices/{id}/send`
    fn send_invoice(
        &self,
        invoice_id: &str,
    ) -> impl Future<Output = Result<Invoice, ApiError>> + Send;

    /// `POST /tutors/invoices/{id}/cancel`
    fn cancel_invoice(
        &self,
        invoice_id: &str,
    ) -> impl Future<Output = Result<Invoice, ApiError>> + Send;
}

pub struct TutorInvoiceQueries<A> {
    api: A,
    list_cache: QueryCache<Vec<Invoice>>,
    detail_cache: QueryCache<Invoice>,
}

impl<A: TutorInvoiceApi> TutorInvoiceQueries<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            list_cache: QueryCache::new(),
            detail_cache: QueryCache::new(),
        }
    }

    fn options() -> QueryOptions {
        QueryOptions {
            stale_after: Duration::from_secs(INVOICE_STALE_SECS),
            retries: 0,
            refetch_on_activate: false,
        }
    }

    pub fn list_key(filter: &InvoiceFilter) -> QueryKey {
        QueryKey::new("tutor", "invoices").push_opt(filter.status.map(|status| status.as_str()))
    }

    pub fn detail_key(invoice_id: &str) -> QueryKey {
        QueryKey::new("tutor", "invoice-detail").push(invoice_id)
    }

    pub async fn list(&self, filter: &InvoiceFilter) -> QuerySnapshot<Vec<Invoice>> {
        let key = Self::list_key(filter);
        let api = self.api.clone();
        let filter = filter.clone();
        let fetch = move || {
            let api = api.clone();
            let filter = filter.clone();
            async move { api.tutor_invoices(&filter).await }
        };
        self.list_cache.fetch(key, Self::options(), fetch).await
    }

    pub async fn detail(&self, invoice_id: &str) -> QuerySnapshot<Invoice> {
        let key = Self::detail_key(invoice_id);
        let api = self.api.clone();
        let invoice_id = invoice_id.to_string();
        let fetch = move || {
            let api = api.clone();
            let invoice_id = invoice_id.clone();
            async move { api.tutor_invoice_detail(&invoice_id).await }
        };
        self.detail_cache.fetch(key, Self::options(), fetch).await
    }

    pub async fn create(&self, req: CreateInvoiceRequest) -> Result<Invoice, ApiError> {
        let invoice = self.api.create_invoice(&req).await?;
        self.invalidate_lists().await;
        Ok(invoice)
    }

    pub async fn update(
        &self,
        invoice_id: &str,
        patch: UpdateInvoiceRequest,
    ) -> Result<Invoice, ApiError> {
        let invoice = self.api.update_invoice(invoice_id, &patch).await?;
        self.invalidate_invoice(invoice_id).await;
        Ok(invoice)
    }

    pub async fn delete(&self, invoice_id: &str) -> Result<(), ApiError> {
        self.api.delete_invoice(invoice_id).await?;
        self.invalidate_invoice(invoice_id).await;
        Ok(())
    }

    pub async fn send(&self, invoice_id: &str) -> Result<Invoice, ApiError> {
        let invoice = self.api.send_invoice(invoice_id).await?;
        self.invalidate_invoice(invoice_id).await;
        Ok(invoice)
    }

    pub async fn cancel(&self, invoice_id: &str) -> Result<Invoice, ApiError> {
        let invoice = self.api.cancel_invoice(invoice_id).await?;
        self.invalidate_invoice(invoice_id).await;
        Ok(invoice)
    }

    async fn invalidate_lists(&self) {
        self.list_cache
            .invalidate_prefix(&QueryKey::new("tutor", "invoices"))
            .await;
    }

    async fn invalidate_invoice(&self, invoice_id: &str) {
        self.invalidate_lists().await;
        self.detail_cache
            .invalidate(&Self::detail_key(invoice_id))
            .await;
    }
}
