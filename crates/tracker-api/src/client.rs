//! HTTP client plumbing

use reqwest::header::AUTHORIZATION;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use url::Url;

use tracker_auth::stored_token;
use tracker_storage::Database;

use crate::error::ApiError;
use crate::Result;

pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    db: Database,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration, db: Database) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ApiError::new(format!("Invalid base URL {base_url}: {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::from)?;

        Ok(Self { http, base_url, db })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::new(format!("Invalid endpoint {path}: {e}")))
    }

    /// Bearer token from the stored session, re-read per request so a
    /// sign-in or logout takes effect without rebuilding the client.
    fn bearer(&self) -> Option<String> {
        stored_token(&self.db)
    }

    async fn request<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let mut request = self.http.request(method, url);

        if let Some(token) = self.bearer() {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, path, "Request failed");
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_response(status, &body));
        }

        response.json::<T>().await.map_err(ApiError::from)
    }

    pub(crate) async fn get<T>(&self, path: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.request::<(), T>(Method::GET, path, None).await
    }

    pub(crate) async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::POST, path, Some(body)).await
    }

    pub(crate) async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::PUT, path, Some(body)).await
    }

    pub(crate) async fn delete<T>(&self, path: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.request::<(), T>(Method::DELETE, path, None).await
    }
}

impl Clone for ApiClient {
    fn clone(&self) -> Self {
        Self {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            db: self.db.clone(),
        }
    }
}
