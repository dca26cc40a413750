//! HTTP client implementation using reqwest.

use reqwest::header::{HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE as CONTENT_TYPE_HEADER};
use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::error::ApiError;
use crate::remote::{Method, RemoteClient, RestRequest, CONTENT_TYPE};

const INVALID_RELATIONSHIP: &str = "Invalid relationship";

/// Backend reached over HTTP(S)
#[derive(Debug, Clone, Default)]
pub struct HttpRemote {
    client: Client,
}

impl HttpRemote {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl RemoteClient for HttpRemote {
    async fn request(&self, request: &RestRequest) -> Result<Value, ApiError> {
        log::debug!("{} {}", request.method.as_str(), request.url);

        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self
            .client
            .request(method, &request.url)
            .query(&request.query)
            .header(CONTENT_TYPE_HEADER, CONTENT_TYPE)
            .header(ACCEPT, CONTENT_TYPE);

        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ApiError::malformed(format!("invalid header name {name}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ApiError::malformed(format!("invalid header value: {e}")))?;
            builder = builder.header(name, value);
        }

        let transport = |source| ApiError::Transport {
            url: request.url.clone(),
            source,
        };

        let response = builder.send().await.map_err(transport)?;
        let status = response.status();
        let body = response.bytes().await.map_err(transport)?;

        if !status.is_success() {
            return Err(classify_error(status, &body));
        }

        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&body)
            .map_err(|e| ApiError::malformed(format!("response from {} is not JSON: {e}", request.url)))
    }
}

/// Turn a non-success response into an [`ApiError`].
///
/// Error bodies look like `{"error": {"code": 400, "message": "..."}}`; some
/// endpoints wrap the object in an array, in which case the first entry wins.
pub fn classify_error(status: StatusCode, body: &[u8]) -> ApiError {
    let message = error_message(body)
        .unwrap_or_else(|| String::from_utf8_lossy(body).trim().to_string());

    if status == StatusCode::BAD_REQUEST && message.contains(INVALID_RELATIONSHIP) {
        return ApiError::InvalidRelationship { message };
    }

    ApiError::Status {
        status: status.as_u16(),
        message,
    }
}

fn error_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let error = value.get("error")?;
    let error = match error {
        Value::Array(items) => items.first()?,
        other => other,
    };
    match error {
        Value::String(message) => Some(message.clone()),
        other => other.get("message")?.as_str().map(str::to_string),
    }
}
