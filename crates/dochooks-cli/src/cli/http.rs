//! HTTP client implementation using reqwest.
//!
//! The dead link check only needs a status code per URL, so this is a thin
//! blocking wrapper implementing the core `HttpClient` trait.

use dochooks_core::check::{HttpClient, ProbeError};
use std::time::Duration;
use tracing::trace;

/// A wrapper around `reqwest::blocking::Client` that implements `HttpClient`.
pub struct ReqwestClient(reqwest::blocking::Client);

impl ReqwestClient {
    /// Creates a client whose requests time out after `timeout`, or after
    /// reqwest's default when `None`.
    ///
    /// Redirects are not followed: a 3xx answer already means the link
    /// resolves.
    pub fn new(timeout: Option<Duration>) -> Result<Self, ProbeError> {
        let mut builder = reqwest::blocking::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("dochooks/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| ProbeError::Client(e.to_string()))?;
        Ok(Self(client))
    }
}

impl HttpClient for ReqwestClient {
    fn head(&self, url: &str) -> Result<u16, ProbeError> {
        let response = self.0.head(url).send().map_err(|e| ProbeError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        let status = response.status().as_u16();
        trace!("HEAD {} -> {}", url, status);
        Ok(status)
    }
}
