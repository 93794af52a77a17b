//! HTTP transport backed by `ureq`.
//!
//! Enable with the `http` feature flag (on by default).

use std::time::Duration;

use crate::error::LeaseError;
use crate::transport::{Exchange, Request, Transport};

/// A blocking HTTP session against one pool endpoint.
///
/// Every exchange is bounded by the configured timeout; expiry surfaces as
/// [`LeaseError::Connection`].
pub struct HttpTransport {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, LeaseError> {
        let base_url = base_url.trim_end_matches('/');
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(LeaseError::InvalidArgument(format!(
                "base URL '{}' must start with http:// or https://",
                base_url
            )));
        }

        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Ok(Self {
            agent,
            base_url: base_url.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Transport for HttpTransport {
    fn exchange(&mut self, request: &Request) -> Result<Exchange, LeaseError> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut req = self.agent.request(request.method.as_str(), &url);
        for (key, value) in &request.query {
            req = req.query(key, value);
        }

        let result = match &request.body {
            Some(body) => req.set("Content-Type", "application/json").send_string(body),
            None => req.call(),
        };

        let response = match result {
            Ok(response) => response,
            // Non-2xx statuses are still completed exchanges
            Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(e)) => return Err(LeaseError::Connection(e.to_string())),
        };

        let status = response.status();
        let body = response
            .into_string()
            .map_err(|e| LeaseError::Connection(format!("failed to read response body: {}", e)))?;
        Ok(Exchange::new(status, body))
    }
}
