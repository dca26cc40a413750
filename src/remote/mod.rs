//! REST backend abstraction.
//!
//! This module provides:
//! - `RemoteClient` trait for issuing requests against the backend
//! - `RestRequest` describing a single GET or DELETE call
//! - `Session` holding the base URL and credentials every request needs
//! - `HttpRemote` implementation using reqwest (see [`http`])

pub mod http;

use std::future::Future;

use serde_json::Value;

use crate::error::ApiError;

pub use http::HttpRemote;

pub const API_KEY_HEADER: &str = "X-DreamFactory-Api-Key";
pub const SESSION_TOKEN_HEADER: &str = "X-DreamFactory-Session-Token";
pub const CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Delete => "DELETE",
        }
    }
}

/// A fully built request: URL, query pairs in insertion order and headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl RestRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
        }
    }

    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    pub fn header(mut self, key: &str, value: impl Into<String>) -> Self {
        self.headers.push((key.to_string(), value.into()));
        self
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn header_value(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

/// Trait for backend implementations
pub trait RemoteClient: Send + Sync {
    /// Issue a request and return the parsed JSON response body
    fn request(
        &self,
        request: &RestRequest,
    ) -> impl Future<Output = Result<Value, ApiError>> + Send;
}

/// Connection details and credentials, passed explicitly into every fetch
/// and delete instead of being read from process-wide state.
#[derive(Debug, Clone)]
pub struct Session {
    pub base_url: String,
    pub api_key: String,
    pub session_token: Option<String>,
    pub db_service: String,
    pub file_container: String,
}

impl Session {
    /// `{base}/{service}/{table}`
    pub fn table_url(&self, table: &str) -> String {
        format!("{}/{}/{}", self.base(), self.db_service.trim_matches('/'), table)
    }

    /// `{base}/files/{container}/{contact_id}/`. The trailing slash marks the
    /// path as a folder.
    pub fn folder_url(&self, contact_id: i64) -> String {
        format!(
            "{}/files/{}/{}/",
            self.base(),
            self.file_container.trim_matches('/'),
            contact_id
        )
    }

    /// Attach the API key and session token. Fails without touching the
    /// network if no usable token is present.
    pub fn authorize(&self, request: RestRequest) -> Result<RestRequest, ApiError> {
        let token = self
            .session_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(ApiError::MissingSession)?;

        Ok(request
            .header(API_KEY_HEADER, self.api_key.clone())
            .header(SESSION_TOKEN_HEADER, token))
    }

    fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}
