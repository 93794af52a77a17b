use crate::error::LeaseError;

/// The synchronous request/response channel the leasing client runs over.
///
/// Implementations return every completed exchange as an [`Exchange`],
/// whatever its status code; only failures to complete the exchange at all
/// are errors, and those must be [`LeaseError::Connection`].
pub trait Transport {
    fn exchange(&mut self, request: &Request) -> Result<Exchange, LeaseError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    /// Path relative to the pool endpoint, e.g. `/licenses/borrow`
    pub path: String,
    pub query: Vec<(String, String)>,
    /// JSON body
    pub body: Option<String>,
}

impl Request {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: String) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }
}

/// A completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub status: u16,
    pub body: String,
}

impl Exchange {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}
