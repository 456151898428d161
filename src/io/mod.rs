mod http;

pub use http::HttpTransport;

use async_trait::async_trait;

use crate::error::Result;

/// Credentials attached to a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Auth {
    Anonymous,
    /// HTTP basic auth with an empty user name and the token as password.
    Basic(String),
    Bearer(String),
}

/// A GET request issued by the retrieval flows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub url: String,
    pub auth: Auth,
    /// When `false`, a 3xx answer is returned as is instead of being followed.
    pub follow_redirects: bool,
}

impl Request {
    pub fn get(url: impl Into<String>, auth: Auth) -> Self {
        Self {
            url: url.into(),
            auth,
            follow_redirects: true,
        }
    }

    pub fn without_redirects(mut self) -> Self {
        self.follow_redirects = false;
        self
    }
}

/// A response with its body fully received
#[derive(Debug, Clone, Default)]
pub struct Response {
    pub status: u16,
    pub content_type: Option<String>,
    /// `Location` header, if any.
    pub location: Option<String>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for issuing HTTP requests on behalf of the GitHub client
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform the request and return the complete response.
    ///
    /// Non-2xx statuses are not errors at this level.
    async fn get(&self, request: Request) -> Result<Response>;
}
