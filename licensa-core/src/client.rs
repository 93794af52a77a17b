//! Leasing client: borrow, return and status queries against one pool
//! endpoint, translating exchange outcomes into [`LeaseError`]s.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{LeaseError, Result};
use crate::handle::LicenseHandle;
use crate::transport::{Exchange, Request, Transport};
use crate::types::{BorrowRecord, LicenseStatus, OverageCharge};
use crate::wire::{
    self, BorrowRequest, BorrowResponse, OverageChargesResponse, ReturnRequest, VersionResponse,
};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Where the pool lives and how long one exchange may take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// State reachable from both the client and the handles it issued.
pub(crate) struct ClientShared {
    // One in-flight exchange per client; concurrent callers queue here
    transport: Mutex<Box<dyn Transport + Send>>,
}

impl ClientShared {
    fn exchange(&self, request: &Request) -> Result<Exchange> {
        // A panic mid-exchange leaves no partial state in the transport
        let mut transport = self.transport.lock().unwrap_or_else(PoisonError::into_inner);

        debug!(method = request.method.as_str(), path = %request.path, "Sending request");
        let exchange = transport.exchange(request)?;
        debug!(path = %request.path, status = exchange.status, "Received response");
        Ok(exchange)
    }

    pub(crate) fn return_lease(&self, handle: &mut LicenseHandle) -> Result<()> {
        if !handle.is_valid() {
            return Err(LeaseError::InvalidHandle);
        }

        let body = wire::encode(&ReturnRequest {
            id: handle.id().to_string(),
        })?;
        let exchange = self.exchange(&Request::post(wire::RETURN_PATH, body))?;
        expect_ok(&exchange)?;

        handle.invalidate();
        info!(lease_id = %handle.id(), tool = %handle.tool(), "License returned");
        Ok(())
    }
}

/// Single entry point for one pool endpoint.
///
/// The client is `Send + Sync`; calls from several threads are serialized
/// so that at most one exchange is in flight at a time. Nothing is retried:
/// every failure is reported to the caller as it happens.
pub struct LeasingClient {
    shared: Arc<ClientShared>,
}

impl LeasingClient {
    pub fn new<T: Transport + Send + 'static>(transport: T) -> Self {
        Self {
            shared: Arc::new(ClientShared {
                transport: Mutex::new(Box::new(transport)),
            }),
        }
    }

    /// Open an HTTP session to the pool described by `config`.
    #[cfg(feature = "http")]
    pub fn connect(config: &ClientConfig) -> Result<Self> {
        let transport = crate::transport_http::HttpTransport::new(&config.base_url, config.timeout)?;
        Ok(Self::new(transport))
    }

    /// Borrow one license for `tool` on behalf of `user`.
    pub fn borrow(&self, tool: &str, user: &str) -> Result<LicenseHandle> {
        validate_tool(tool)?;
        validate_user(user)?;

        let body = wire::encode(&BorrowRequest {
            tool: tool.to_string(),
            user: user.to_string(),
        })?;
        let exchange = self.shared.exchange(&Request::post(wire::BORROW_PATH, body))?;

        match exchange.status {
            wire::STATUS_OK => {}
            wire::STATUS_CONFLICT => {
                info!(tool, user, "Pool exhausted");
                return Err(LeaseError::NoLicensesAvailable(tool.to_string()));
            }
            code => return Err(LeaseError::Transport(code)),
        }

        let response: BorrowResponse = wire::decode(&exchange.body, "borrow")?;
        if response.id.trim().is_empty() {
            return Err(LeaseError::Protocol(
                "borrow response carried an empty lease id".to_string(),
            ));
        }

        info!(lease_id = %response.id, tool, user, overage = response.is_overage, "License borrowed");
        Ok(LicenseHandle::new(
            response.id,
            tool.to_string(),
            user.to_string(),
            &self.shared,
        ))
    }

    /// Return a borrowed license.
    ///
    /// Fails with [`LeaseError::InvalidHandle`] if the handle was already
    /// returned, detached, or issued by another client. On any other failure
    /// the handle stays valid so the return can be retried.
    pub fn return_license(&self, handle: &mut LicenseHandle) -> Result<()> {
        if !handle.is_owned_by(&self.shared) {
            return Err(LeaseError::InvalidHandle);
        }
        self.shared.return_lease(handle)
    }

    pub fn get_status(&self, tool: &str) -> Result<LicenseStatus> {
        validate_tool(tool)?;
        validate_path_segment(tool)?;
        let exchange = self.shared.exchange(&Request::get(wire::status_path(tool)))?;
        expect_ok(&exchange)?;
        wire::decode(&exchange.body, "status")
    }

    /// Status of every tool, in the order the pool reports them.
    /// A single malformed record fails the whole call.
    pub fn get_all_statuses(&self) -> Result<Vec<LicenseStatus>> {
        let exchange = self.shared.exchange(&Request::get(wire::STATUS_ALL_PATH))?;
        expect_ok(&exchange)?;
        wire::decode(&exchange.body, "status list")
    }

    /// Outstanding leases known to the pool, optionally for one user.
    pub fn list_borrows(&self, user: Option<&str>) -> Result<Vec<BorrowRecord>> {
        let mut request = Request::get(wire::BORROWS_PATH);
        if let Some(user) = user {
            validate_user(user)?;
            request = request.with_query("user", user);
        }
        let exchange = self.shared.exchange(&request)?;
        expect_ok(&exchange)?;
        wire::decode(&exchange.body, "borrow list")
    }

    /// Every overage charge the pool has recorded, oldest first.
    pub fn overage_charges(&self) -> Result<Vec<OverageCharge>> {
        let exchange = self.shared.exchange(&Request::get(wire::OVERAGE_CHARGES_PATH))?;
        expect_ok(&exchange)?;
        let response: OverageChargesResponse = wire::decode(&exchange.body, "overage charges")?;
        Ok(response.charges)
    }

    pub fn server_version(&self) -> Result<String> {
        let exchange = self.shared.exchange(&Request::get(wire::VERSION_PATH))?;
        expect_ok(&exchange)?;
        let response: VersionResponse = wire::decode(&exchange.body, "version")?;
        Ok(response.version)
    }

    /// Take ownership of a lease borrowed elsewhere, e.g. by an earlier
    /// process, so it can be returned through this client.
    ///
    /// No exchange happens here; the pool only checks the id on return.
    pub fn adopt(&self, id: &str, tool: &str, user: &str) -> Result<LicenseHandle> {
        if id.trim().is_empty() {
            return Err(LeaseError::InvalidArgument("lease id is required".to_string()));
        }
        Ok(LicenseHandle::new(
            id.to_string(),
            tool.to_string(),
            user.to_string(),
            &self.shared,
        ))
    }
}

fn expect_ok(exchange: &Exchange) -> Result<()> {
    match exchange.status {
        wire::STATUS_OK => Ok(()),
        code => Err(LeaseError::Transport(code)),
    }
}

fn validate_tool(tool: &str) -> Result<()> {
    if tool.is_empty() {
        return Err(LeaseError::InvalidArgument("tool is required".to_string()));
    }
    Ok(())
}

// Status queries carry the tool name unencoded in the path
fn validate_path_segment(tool: &str) -> Result<()> {
    if tool
        .chars()
        .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '/' | '?' | '#' | '%'))
    {
        return Err(LeaseError::InvalidArgument(format!(
            "tool '{}' cannot be sent as a path segment",
            tool
        )));
    }
    Ok(())
}

fn validate_user(user: &str) -> Result<()> {
    if user.trim().is_empty() {
        return Err(LeaseError::InvalidArgument("user is required".to_string()));
    }
    Ok(())
}
