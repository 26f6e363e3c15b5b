//! HTTP implementation of the remote collection.
//!
//! - `GET {base}/todos?userId={user}`
//! - `POST {base}/todos` with a JSON [`NewItem`]
//! - `DELETE {base}/todos/{id}`

use super::{RemoteCollection, RemoteFuture};
use crate::error::RemoteError;
use crate::types::{Item, ItemId, NewItem, UserId};
use reqwest::{Client, Response};
use std::future::Future;
use std::time::{Duration, Instant};
use todomvc_runtime::metrics::RemoteMetrics;

/// Remote collection client over HTTP
#[derive(Clone, Debug)]
pub struct HttpCollection {
    client: Client,
    base_url: String,
}

impl HttpCollection {
    /// Base URL used when none is configured
    pub const DEFAULT_BASE_URL: &'static str = "https://mate.academy/students-api";

    /// Create a client with a per-request timeout
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Request`] if the HTTP client cannot be built
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Request(e.to_string()))?;

        Ok(Self::with_client(client, base_url))
    }

    /// Create a client around an existing `reqwest::Client`
    #[must_use]
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// Base URL requests are sent to
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch_list(&self, user: UserId) -> Result<Vec<Item>, RemoteError> {
        let response = self
            .client
            .get(format!("{}/todos", self.base_url))
            .query(&[("userId", user.get())])
            .send()
            .await
            .map_err(|e| RemoteError::Request(e.to_string()))?;

        check_status(response)
            .await?
            .json::<Vec<Item>>()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }

    async fn post_item(&self, draft: NewItem) -> Result<Item, RemoteError> {
        let response = self
            .client
            .post(format!("{}/todos", self.base_url))
            .json(&draft)
            .send()
            .await
            .map_err(|e| RemoteError::Request(e.to_string()))?;

        check_status(response)
            .await?
            .json::<Item>()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }

    async fn delete_item(&self, id: ItemId) -> Result<(), RemoteError> {
        let response = self
            .client
            .delete(format!("{}/todos/{id}", self.base_url))
            .send()
            .await
            .map_err(|e| RemoteError::Request(e.to_string()))?;

        check_status(response).await.map(drop)
    }
}

async fn check_status(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(RemoteError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Run a call, logging and recording its outcome
async fn observed<T>(
    operation: &'static str,
    call: impl Future<Output = Result<T, RemoteError>>,
) -> Result<T, RemoteError> {
    let start = Instant::now();
    let result = call.await;
    let elapsed = start.elapsed();

    RemoteMetrics::record_call(operation, elapsed, result.is_ok());
    match &result {
        Ok(_) => tracing::debug!(operation, ?elapsed, "Remote call succeeded"),
        Err(error) => tracing::warn!(operation, ?elapsed, %error, "Remote call failed"),
    }

    result
}

impl RemoteCollection for HttpCollection {
    fn list(&self, user: UserId) -> RemoteFuture<'_, Vec<Item>> {
        Box::pin(observed("list", self.fetch_list(user)))
    }

    fn create(&self, draft: NewItem) -> RemoteFuture<'_, Item> {
        Box::pin(observed("create", self.post_item(draft)))
    }

    fn delete(&self, id: ItemId) -> RemoteFuture<'_, ()> {
        Box::pin(observed("delete", self.delete_item(id)))
    }
}
