//! Page source contract and fetch errors.

use crate::model::page::{Page, PageRequest};
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type FetchResult<T> = Result<T, FetchError>;

/// Failure of one page fetch. Never retried automatically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Transport failure or non-2xx response.
    Network {
        status: Option<u16>,
        message: String,
    },
    /// Response body was not the expected JSON shape.
    Decode(String),
}

impl FetchError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            status: None,
            message: message.into(),
        }
    }

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Network {
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// Stable machine-readable code for logs and FFI envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Network { .. } => "network_error",
            Self::Decode(_) => "decode_error",
        }
    }
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network {
                status: Some(status),
                message,
            } => write!(f, "network error (status {status}): {message}"),
            Self::Network {
                status: None,
                message,
            } => write!(f, "network error: {message}"),
            Self::Decode(message) => write!(f, "decode error: {message}"),
        }
    }
}

impl Error for FetchError {}

impl From<serde_json::Error> for FetchError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value.to_string())
    }
}

/// One paged collection endpoint.
///
/// Implementations perform exactly one round-trip per call and must not
/// retry on their own.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, request: PageRequest) -> FetchResult<Page>;
}

#[async_trait]
impl<S: PageSource + ?Sized> PageSource for Arc<S> {
    async fn fetch_page(&self, request: PageRequest) -> FetchResult<Page> {
        (**self).fetch_page(request).await
    }
}
