//! HTTP client for the ordering backend API

use crate::{ClientConfig, ClientError, ClientResult};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use shared::models::order::{Order, OrderPatch};
use shared::response::{ApiResponse, ClearOrdersResponse};

/// HTTP client for making network requests to the ordering backend
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpClient {
    /// Create a new HTTP client from configuration
    pub fn new(config: &ClientConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: config.base_url.clone(),
            token: config.token.clone(),
        }
    }

    /// Set the authentication token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Get the current token
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Build authorization header value
    fn auth_header(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Bearer {}", t))
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let mut request = self.client.get(self.url(path));

        if let Some(auth) = self.auth_header() {
            request = request.header(reqwest::header::AUTHORIZATION, auth);
        }

        let response = request.send().await?;
        Self::handle_response(response).await
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let mut request = self.client.post(self.url(path)).json(body);

        if let Some(auth) = self.auth_header() {
            request = request.header(reqwest::header::AUTHORIZATION, auth);
        }

        let response = request.send().await?;
        Self::handle_response(response).await
    }

    /// Make a PUT request with JSON body
    pub async fn put<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let mut request = self.client.put(self.url(path)).json(body);

        if let Some(auth) = self.auth_header() {
            request = request.header(reqwest::header::AUTHORIZATION, auth);
        }

        let response = request.send().await?;
        Self::handle_response(response).await
    }

    /// Make a DELETE request
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let mut request = self.client.delete(self.url(path));

        if let Some(auth) = self.auth_header() {
            request = request.header(reqwest::header::AUTHORIZATION, auth);
        }

        let response = request.send().await?;
        Self::handle_response(response).await
    }

    /// Handle the HTTP response
    ///
    /// Non-2xx bodies carry an `ApiResponse` envelope whose message is
    /// surfaced verbatim to the user; a bare text body is passed through.
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await?;
            let message = serde_json::from_str::<ApiResponse<serde_json::Value>>(&text)
                .map(|r| r.message)
                .unwrap_or(text);
            return match status {
                StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
                StatusCode::FORBIDDEN => Err(ClientError::Forbidden(message)),
                StatusCode::NOT_FOUND => Err(ClientError::NotFound(message)),
                StatusCode::BAD_REQUEST => Err(ClientError::Validation(message)),
                _ => Err(ClientError::Internal(message)),
            };
        }

        response.json().await.map_err(Into::into)
    }

    // ========== Orders API ==========

    /// Point lookup of a single order by identifier
    pub async fn order(&self, id: &str) -> ClientResult<Order> {
        self.get::<ApiResponse<Order>>(&format!("/api/orders/{}", id))
            .await?
            .data
            .ok_or_else(|| ClientError::InvalidResponse("Missing order data".to_string()))
    }

    /// List all order records visible to the caller
    pub async fn orders(&self) -> ClientResult<Vec<Order>> {
        self.get::<ApiResponse<Vec<Order>>>("/api/orders")
            .await?
            .data
            .ok_or_else(|| ClientError::InvalidResponse("Missing orders data".to_string()))
    }

    /// Submit a new order
    pub async fn create_order(&self, order: &Order) -> ClientResult<Order> {
        self.post::<ApiResponse<Order>, _>("/api/orders", order)
            .await?
            .data
            .ok_or_else(|| ClientError::InvalidResponse("Missing order data".to_string()))
    }

    /// Apply a partial update (status, cancellation, payment state)
    pub async fn update_order(&self, id: &str, patch: &OrderPatch) -> ClientResult<Order> {
        self.put::<ApiResponse<Order>, _>(&format!("/api/orders/{}", id), patch)
            .await?
            .data
            .ok_or_else(|| ClientError::InvalidResponse("Missing order data".to_string()))
    }

    /// Bulk clear all orders, returning the removed-record count
    pub async fn clear_orders(&self) -> ClientResult<u64> {
        self.delete::<ApiResponse<ClearOrdersResponse>>("/api/orders")
            .await?
            .data
            .map(|r| r.removed)
            .ok_or_else(|| ClientError::InvalidResponse("Missing clear result".to_string()))
    }
}
