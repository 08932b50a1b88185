//! API client for communicating with the Lessonwise REST API.
//!
//! This module provides the `ApiClient` struct for making authenticated
//! API requests to fetch schedule and invoice data. The client carries
//! an externally supplied bearer token; obtaining one is the embedding
//! application's concern.

use std::time::Duration;

use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::Config;
use crate::invoices::{ParentInvoiceApi, TutorInvoiceApi};
use crate::models::{
    ChildScheduleResponse, CreateInvoiceRequest, Invoice, InvoiceFilter, InvoicePayment, Lesson,
    ScheduleFilter, UpdateInvoiceRequest,
};
use crate::schedule::ScheduleApi;

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Base URL for the hosted Lessonwise API
const DEFAULT_BASE_URL: &str = "https://api.lessonwise.app/v1";

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Empty query parameter list for endpoints without filters
const NO_QUERY: &[(&str, &str)] = &[];

/// API client for Lessonwise.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client against the hosted API
    pub fn new() -> Result<Self, ApiError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a new API client against a specific base URL (self-hosted
    /// deployments, staging, local test servers)
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Create a client honoring the configured base URL override
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        match &config.api_base_url {
            Some(url) => Self::with_base_url(url.clone()),
            None => Self::new(),
        }
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    /// This is more efficient than creating a new client for each request.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(), // Cheap clone, shares connection pool
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref token) = self.token {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| {
                    ApiError::InvalidRequest(
                        "bearer token contains characters not valid in a header".to_string(),
                    )
                })?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn get<T, Q>(&self, path: &str, query: &Q) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let url = self.url(path);
        debug!(url = %url, "GET");
        let response = self
            .client
            .get(&url)
            .headers(self.auth_headers()?)
            .query(query)
            .send()
            .await?;
        let response = Self::check_response(response).await?;
        Ok(response.json().await?)
    }

    async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url(path);
        debug!(url = %url, "POST");
        let response = self
            .client
            .post(&url)
            .headers(self.auth_headers()?)
            .json(body)
            .send()
            .await?;
        let response = Self::check_response(response).await?;
        Ok(response.json().await?)
    }

    /// POST with no request body, for action endpoints like send/cancel
    async fn post_action<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!(url = %url, "POST");
        let response = self
            .client
            .post(&url)
            .headers(self.auth_headers()?)
            .send()
            .await?;
        let response = Self::check_response(response).await?;
        Ok(response.json().await?)
    }

    async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url(path);
        debug!(url = %url, "PATCH");
        let response = self
            .client
            .patch(&url)
            .headers(self.auth_headers()?)
            .json(body)
            .send()
            .await?;
        let response = Self::check_response(response).await?;
        Ok(response.json().await?)
    }

    async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let url = self.url(path);
        debug!(url = %url, "DELETE");
        let response = self
            .client
            .delete(&url)
            .headers(self.auth_headers()?)
            .send()
            .await?;
        Self::check_response(response).await?;
        Ok(())
    }
}

impl ScheduleApi for ApiClient {
    async fn parent_child_schedule(
        &self,
        child_id: &str,
        filter: &ScheduleFilter,
    ) -> Result<ChildScheduleResponse, ApiError> {
        let path = format!("/parents/children/{}/schedule", child_id);
        self.get(&path, &filter.to_query_params()).await
    }

    async fn my_schedule(&self, filters: &[(String, String)]) -> Result<Vec<Lesson>, ApiError> {
        self.get("/students/me/schedule", filters).await
    }
}

impl TutorInvoiceApi for ApiClient {
    async fn tutor_invoices(&self, filter: &InvoiceFilter) -> Result<Vec<Invoice>, ApiError> {
        self.get("/tutors/invoices", &filter.to_query_params()).await
    }

    async fn tutor_invoice_detail(&self, invoice_id: &str) -> Result<Invoice, ApiError> {
        self.get(&format!("/tutors/invoices/{}", invoice_id), NO_QUERY)
            .await
    }

    async fn create_invoice(&self, req: &CreateInvoiceRequest) -> Result<Invoice, ApiError> {
        self.post("/tutors/invoices", req).await
    }

    async fn update_invoice(
        &self,
        invoice_id: &str,
        patch: &UpdateInvoiceRequest,
    ) -> Result<Invoice, ApiError> {
        self.patch(&format!("/tutors/invoices/{}", invoice_id), patch)
            .await
    }

    async fn delete_invoice(&self, invoice_id: &str) -> Result<(), ApiError> {
        self.delete(&format!("/tutors/invoices/{}", invoice_id)).await
    }

    async fn send_invoice(&self, invoice_id: &str) -> Result<Invoice, ApiError> {
        self.post_action(&format!("/tutors/invoices/{}/send", invoice_id))
            .await
    }

    async fn cancel_invoice(&self, invoice_id: &str) -> Result<Invoice, ApiError> {
        self.post_action(&format!("/tutors/invoices/{}/cancel", invoice_id))
            .await
    }
}

impl ParentInvoiceApi for ApiClient {
    async fn parent_invoices(&self, filter: &InvoiceFilter) -> Result<Vec<Invoice>, ApiError> {
        self.get("/parents/invoices", &filter.to_query_params()).await
    }

    async fn parent_invoice_detail(&self, invoice_id: &str) -> Result<Invoice, ApiError> {
        self.get(&format!("/parents/invoices/{}", invoice_id), NO_QUERY)
            .await
    }

    async fn mark_invoice_viewed(&self, invoice_id: &str) -> Result<Invoice, ApiError> {
        self.post_action(&format!("/parents/invoices/{}/viewed", invoice_id))
            .await
    }

    async fn initiate_invoice_payment(&self, invoice_id: &str) -> Result<InvoicePayment, ApiError> {
        self.post_action(&format!("/parents/invoices/{}/payments", invoice_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = ApiClient::with_base_url("https://staging.lessonwise.app/v1/")
            .expect("Failed to build client");
        assert_eq!(
            client.url("/students/me/schedule"),
            "https://staging.lessonwise.app/v1/students/me/schedule"
        );
    }

    #[test]
    fn test_with_token_keeps_base_url() {
        let client = ApiClient::with_base_url("https://staging.lessonwise.app/v1")
            .expect("Failed to build client");
        let authed = client.with_token("tok-123".to_string());
        assert_eq!(authed.base_url, client.base_url);
        assert_eq!(authed.token.as_deref(), Some("tok-123"));
    }

    #[test]
    fn test_auth_headers_carry_bearer_token() {
        let client = ApiClient::new()
            .expect("Failed to build client")
            .with_token("tok-123".to_string());
        let headers = client.auth_headers().expect("headers");
        assert_eq!(
            headers.get(header::AUTHORIZATION).map(|v| v.as_bytes()),
            Some("Bearer tok-123".as_bytes())
        );
    }

    #[test]
    fn test_auth_headers_reject_invalid_token() {
        let client = ApiClient::new()
            .expect("Failed to build client")
            .with_token("bad\ntoken".to_string());
        assert!(matches!(
            client.auth_headers(),
            Err(ApiError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_parse_child_schedule_response() {
        let json = r#"{
            "student": {"id": "st-7", "name": "Ada Byron", "email": "ada@example.com"},
            "lessons": [
                {"id": 1, "subject_name": "Math", "is_upcoming": true, "status": "scheduled"},
                {"id": 2, "subject": "Art", "is_upcoming": false}
            ],
            "total_lessons": 2
        }"#;

        let resp: ChildScheduleResponse =
            serde_json::from_str(json).expect("Failed to parse schedule test JSON");
        assert_eq!(resp.total_lessons, 2);
        assert_eq!(resp.lessons.len(), 2);
        assert_eq!(resp.lessons[0].subject_label(), "Math");
        assert_eq!(resp.lessons[1].subject_label(), "Art");
    }
}
