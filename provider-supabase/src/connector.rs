//! Supabase HTTP connector
//!
//! Shared request plumbing for the REST (PostgREST), Storage and Auth
//! (GoTrue) APIs of one project. Every request carries the project's anon
//! key in `apikey`; `Authorization` carries the signed-in user's token when
//! there is one, the anon key otherwise.

use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use core_library::query::TableQuery;
use core_runtime::config::BackendConfig;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::error::{Result, SupabaseError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// PostgREST write preferences.
const RETURN_REPRESENTATION: &str = "return=representation";
const RETURN_MINIMAL: &str = "return=minimal";
const UPSERT_REPRESENTATION: &str = "resolution=merge-duplicates,return=representation";

pub struct SupabaseClient {
    http_client: Arc<dyn HttpClient>,
    /// Project URL without a trailing slash.
    base_url: String,
    anon_key: String,
    access_token: RwLock<Option<String>>,
}

impl SupabaseClient {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        base_url: impl Into<String>,
        anon_key: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http_client,
            base_url,
            anon_key: anon_key.into(),
            access_token: RwLock::new(None),
        }
    }

    pub fn from_config(http_client: Arc<dyn HttpClient>, config: &BackendConfig) -> Self {
        Self::new(http_client, config.url.clone(), config.anon_key.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Authorize subsequent calls as a user, or revert to anonymous access.
    pub fn set_access_token(&self, token: Option<String>) {
        debug!(authenticated = token.is_some(), "Updating backend authorization");
        *self.access_token.write() = token;
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.read().is_some()
    }

    pub fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    pub fn storage_url(&self, path: &str) -> String {
        format!("{}/storage/v1/{}", self.base_url, path)
    }

    pub fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    /// Request authorized as the current user (or anonymously).
    pub fn request(&self, method: HttpMethod, url: impl Into<String>) -> HttpRequest {
        let token = self
            .access_token
            .read()
            .clone()
            .unwrap_or_else(|| self.anon_key.clone());
        self.request_with_token(method, url, &token)
    }

    /// Request authorized with the anon key regardless of the session.
    pub fn anon_request(&self, method: HttpMethod, url: impl Into<String>) -> HttpRequest {
        self.request_with_token(method, url, &self.anon_key)
    }

    pub fn request_with_token(
        &self,
        method: HttpMethod,
        url: impl Into<String>,
        token: &str,
    ) -> HttpRequest {
        HttpRequest::new(method, url)
            .header("apikey", self.anon_key.clone())
            .bearer_token(token)
            .header("Accept", "application/json")
            .timeout(REQUEST_TIMEOUT)
    }

    /// Send once and turn non-2xx responses into [`SupabaseError::Api`].
    #[instrument(skip(self, request), fields(method = ?request.method, url = %request.url))]
    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let response = self.http_client.execute(request).await?;

        if response.is_success() {
            debug!(status = response.status, "Request succeeded");
            Ok(response)
        } else {
            let error = SupabaseError::from_response(response.status, &response.body);
            warn!(status = response.status, error = %error, "Request failed");
            Err(error)
        }
    }

    pub fn parse<T: DeserializeOwned>(response: &HttpResponse) -> Result<T> {
        serde_json::from_slice(&response.body)
            .map_err(|e| SupabaseError::Parse(format!("Unexpected response body: {}", e)))
    }

    // ------------------------------------------------------------------
    // Table operations
    // ------------------------------------------------------------------

    pub async fn select<T: DeserializeOwned>(&self, query: &TableQuery) -> Result<Vec<T>> {
        let url = format!("{}?{}", self.rest_url(&query.table), query.to_query_string());
        let response = self.send(self.request(HttpMethod::Get, url)).await?;
        Self::parse(&response)
    }

    /// First row matching `query`, if any.
    pub async fn select_one<T: DeserializeOwned>(&self, query: TableQuery) -> Result<Option<T>> {
        let rows = self.select(&query.limit(1)).await?;
        Ok(rows.into_iter().next())
    }

    /// Insert one row or an array of rows and return what was stored.
    pub async fn insert<B, T>(&self, table: &str, body: &B) -> Result<Vec<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.write_rows(table, body, RETURN_REPRESENTATION).await
    }

    /// Insert or merge on the primary key and return what was stored.
    pub async fn upsert<B, T>(&self, table: &str, body: &B) -> Result<Vec<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.write_rows(table, body, UPSERT_REPRESENTATION).await
    }

    async fn write_rows<B, T>(&self, table: &str, body: &B, prefer: &str) -> Result<Vec<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self
            .request(HttpMethod::Post, self.rest_url(table))
            .header("Prefer", prefer)
            .json(body)?;
        let response = self.send(request).await?;
        Self::parse(&response)
    }

    /// Patch the rows matched by `query`'s filters.
    pub async fn update<B: Serialize + ?Sized>(&self, query: &TableQuery, body: &B) -> Result<()> {
        let url = format!("{}?{}", self.rest_url(&query.table), query.filter_string());
        let request = self
            .request(HttpMethod::Patch, url)
            .header("Prefer", RETURN_MINIMAL)
            .json(body)?;
        self.send(request).await?;
        Ok(())
    }

    /// Delete the rows matched by `query`'s filters.
    pub async fn delete(&self, query: &TableQuery) -> Result<()> {
        let url = format!("{}?{}", self.rest_url(&query.table), query.filter_string());
        self.send(self.request(HttpMethod::Delete, url)).await?;
        Ok(())
    }
}
