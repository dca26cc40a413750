//! Error types shared by the fetch, readiness and delete paths.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Failure of a single request against the REST backend.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("no session token available; log in first")]
    MissingSession,

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The server rejected the `related` parameter. Relation names are case
    /// sensitive on the server side.
    #[error("invalid relationship in request: {message}")]
    InvalidRelationship { message: String },

    #[error("malformed payload: {0}")]
    Malformed(String),
}

impl ApiError {
    pub fn malformed(message: impl Into<String>) -> Self {
        ApiError::Malformed(message.into())
    }
}

/// Outcome of waiting on a [`crate::gate::ReadyGate`] that did not end in `Ready`.
#[derive(Debug, Clone, Error)]
pub enum GateError {
    #[error("wait requested before any prefetch was started")]
    NotPrefetched,

    #[error("prefetch was cancelled")]
    Cancelled,

    #[error("contact list failed to load: {0}")]
    Failed(Arc<ApiError>),
}

/// The four server-side resources removed for a contact, in dependency order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteStage {
    Relationships,
    ContactInfo,
    ImageFolder,
    Contact,
}

impl DeleteStage {
    pub const ORDER: [DeleteStage; 4] = [
        DeleteStage::Relationships,
        DeleteStage::ContactInfo,
        DeleteStage::ImageFolder,
        DeleteStage::Contact,
    ];

    /// 1-based position in the cascade.
    pub fn number(&self) -> usize {
        match self {
            DeleteStage::Relationships => 1,
            DeleteStage::ContactInfo => 2,
            DeleteStage::ImageFolder => 3,
            DeleteStage::Contact => 4,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DeleteStage::Relationships => "contact group relationships",
            DeleteStage::ContactInfo => "contact info",
            DeleteStage::ImageFolder => "profile image folder",
            DeleteStage::Contact => "contact record",
        }
    }
}

impl fmt::Display for DeleteStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stage {} ({})", self.number(), self.label())
    }
}

/// A cascading delete that stopped early. Stages before `stage` completed and
/// are not rolled back.
#[derive(Debug, Error)]
#[error("deleting contact {contact_id} failed at {stage}: {source}")]
pub struct DeleteError {
    pub contact_id: i64,
    pub stage: DeleteStage,
    #[source]
    pub source: ApiError,
}
