//! Parent-side invoice adapter: the paying role. Parents read the
//! invoices addressed to them, acknowledge them, and kick off payment;
//! the acknowledging and paying mutations invalidate the cached parent
//! invoice queries.

use std::future::Future;
use std::time::Duration;

use crate::api::ApiError;
use crate::cache::{QueryCache, QueryKey, QueryOptions, QuerySnapshot};
use crate::models::{Invoice, InvoiceFilter, InvoicePayment};

/// Same freshness window as the tutor side.
const INVOICE_STALE_SECS: u64 = 60;

/// The slice of the REST API the parent invoice adapter consumes.
pub trait ParentInvoiceApi: Clone + Send + Sync + 'static {
    /// `GET /parents/invoices`
    fn parent_invoices(
        &self,
        filter: &InvoiceFilter,
    ) -> impl Future<Output = Result<Vec<Invoice>, ApiError>> + Send;

    /// `GET /parents/invoices/{id}`
    fn parent_invoice_detail(
        &self,
        invoice_id: &str,
    ) -> impl Future<Output = Result<Invoice, ApiError>> + Send;

    /// `POST /parents/invoices/{id}/viewed`
    fn mark_invoice_viewed(
        &self,
        invoice_id: &str,
    ) -> impl Future<Output = Result<Invoice, ApiError>> + Send;

    /// `POST /parents/invoices/{id}/payments`
    fn initiate_invoice_payment(
        &self,
        invoice_id: &str,
    ) -> impl Future<Output = Result<InvoicePayment, ApiError>> + Send;
}

pub struct ParentInvoiceQueries<A> {
    api: A,
    list_cache: QueryCache<Vec<Invoice>>,
    detail_cache: QueryCache<Invoice>,
}

impl<A: ParentInvoiceApi> ParentInvoiceQueries<A> {
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
        QueryKey::new("parent", "invoices").push_opt(filter.status.map(|status| status.as_str()))
    }

    pub fn detail_key(invoice_id: &str) -> QueryKey {
        QueryKey::new("parent", "invoice-detail").push(invoice_id)
    }

    pub async fn list(&self, filter: &InvoiceFilter) -> QuerySnapshot<Vec<Invoice>> {
        let key = Self::list_key(filter);
        let api = self.api.clone();
        let filter = filter.clone();
        let fetch = move || {
            let api = api.clone();
            let filter = filter.clone();
            async move { api.parent_invoices(&filter).await }
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
            async move { api.parent_invoice_detail(&invoice_id).await }
        };
        self.detail_cache.fetch(key, Self::options(), fetch).await
    }

    /// Acknowledge the invoice. The server stamps `viewed_at` and flips
    /// the status, so the cached reads for it are invalidated.
    pub async fn mark_viewed(&self, invoice_id: &str) -> Result<Invoice, ApiError> {
        let invoice = self.api.mark_invoice_viewed(invoice_id).await?;
        self.invalidate_invoice(invoice_id).await;
        Ok(invoice)
    }

    /// Start a payment and hand back the provider redirect. The invoice
    /// is invalidated so a pending payment shows up on the next read.
    pub async fn initiate_payment(&self, invoice_id: &str) -> Result<InvoicePayment, ApiError> {
        let payment = self.api.initiate_invoice_payment(invoice_id).await?;
        self.invalidate_invoice(invoice_id).await;
        Ok(payment)
    }

    async fn invalidate_invoice(&self, invoice_id: &str) {
        self.list_cache
            .invalidate_prefix(&QueryKey::new("parent", "invoices"))
            .await;
        self.detail_cache
            .invalidate(&Self::detail_key(invoice_id))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use chrono::Utc;

    use crate::models::InvoiceStatus;

    use super::*;

    #[derive(Clone, Default)]
    struct FakeApi {
        list_calls: Arc<AtomicUsize>,
        detail_calls: Arc<AtomicUsize>,
    }

    fn invoice(id: &str, status: InvoiceStatus) -> Invoice {
        Invoice {
            id: id.to_string(),
            invoice_number: None,
            student_name: None,
            amount_cents: 7500,
            currency: "USD".to_string(),
            status,
            issued_on: None,
            due_on: None,
            viewed_at: None,
            paid_at: None,
            lines: vec![],
        }
    }

    impl ParentInvoiceApi for FakeApi {
        async fn parent_invoices(&self, _filter: &InvoiceFilter) -> Result<Vec<Invoice>, ApiError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![invoice("inv-1", InvoiceStatus::Sent)])
        }

        async fn parent_invoice_detail(&self, invoice_id: &str) -> Result<Invoice, ApiError> {
            self.detail_calls.fetch_add(1, Ordering::SeqCst);
            Ok(invoice(invoice_id, InvoiceStatus::Sent))
        }

        async fn mark_invoice_viewed(&self, invoice_id: &str) -> Result<Invoice, ApiError> {
            let mut viewed = invoice(invoice_id, InvoiceStatus::Viewed);
            viewed.viewed_at = Some(Utc::now());
            Ok(viewed)
        }

        async fn initiate_invoice_payment(
            &self,
            invoice_id: &str,
        ) -> Result<InvoicePayment, ApiError> {
            Ok(InvoicePayment {
                invoice_id: invoice_id.to_string(),
                payment_url: format!("https://pay.example.com/{}", invoice_id),
                provider: Some("stripe".to_string()),
                expires_at: None,
            })
        }
    }

    #[tokio::test]
    async fn test_list_is_cached() {
        let api = FakeApi::default();
        let queries = ParentInvoiceQueries::new(api.clone());

        queries.list(&InvoiceFilter::default()).await;
        queries.list(&InvoiceFilter::default()).await;

        assert_eq!(api.list_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_mark_viewed_invalidates_reads() {
        let api = FakeApi::default();
        let queries = ParentInvoiceQueries::new(api.clone());

        queries.list(&InvoiceFilter::default()).await;
        queries.detail("inv-1").await;

        let viewed = queries.mark_viewed("inv-1").await.expect("mark viewed");
        assert_eq!(viewed.status, InvoiceStatus::Viewed);
        assert!(viewed.viewed_at.is_some());

        queries.list(&InvoiceFilter::default()).await;
        queries.detail("inv-1").await;
        assert_eq!(api.list_calls.load(Ordering::SeqCst), 2);
        assert_eq!(api.detail_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_initiate_payment_returns_redirect() {
        let api = FakeApi::default();
        let queries = ParentInvoiceQueries::new(api);

        let payment = queries.initiate_payment("inv-9").await.expect("payment");
        assert_eq!(payment.invoice_id, "inv-9");
        assert_eq!(payment.payment_url, "https://pay.example.com/inv-9");
    }
}
