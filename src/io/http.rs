use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::{CONTENT_TYPE, HeaderName, LOCATION};
use reqwest::{Client, redirect};
use std::time::Duration;

use super::{Auth, Request, Response, Transport};
use crate::error::Result;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Transport backed by `reqwest`
pub struct HttpTransport {
    client: Client,
    no_redirect_client: Client,
    max_retry: u32,
}

impl HttpTransport {
    /// Create a transport with a 30 second request timeout
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(30))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        let no_redirect_client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            no_redirect_client,
            max_retry: 10,
        })
    }

    /// Set how many attempts are made on timeouts and connection failures
    pub fn max_retry(mut self, max_retry: u32) -> Self {
        self.max_retry = max_retry.max(1);
        self
    }

    fn request(&self, request: &Request) -> reqwest::RequestBuilder {
        let client = if request.follow_redirects {
            &self.client
        } else {
            &self.no_redirect_client
        };

        let builder = client.get(&request.url);
        match &request.auth {
            Auth::Anonymous => builder,
            Auth::Basic(token) => builder.basic_auth("", Some(token)),
            Auth::Bearer(token) => builder.bearer_auth(token),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, request: Request) -> Result<Response> {
        let mut retry_count = 0;

        let resp = loop {
            debug!("GET {}", request.url);
            match self.request(&request).send().await {
                Ok(resp) => break resp,
                Err(e) if e.is_timeout() || e.is_connect() => {
                    retry_count += 1;
                    if retry_count >= self.max_retry {
                        return Err(e.into());
                    }
                    warn!(
                        "connection error, retry {}/{}: {}",
                        retry_count, self.max_retry, e
                    );
                    tokio::time::sleep(Duration::from_millis(500 * retry_count as u64)).await;
                }
                Err(e) => return Err(e.into()),
            }
        };

        let header = |name: HeaderName| {
            resp.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let status = resp.status().as_u16();
        let content_type = header(CONTENT_TYPE);
        let location = header(LOCATION);
        let body = resp.bytes().await?.to_vec();

        Ok(Response {
            status,
            content_type,
            location,
            body,
        })
    }
}
