use std::fmt;
use std::sync::{Arc, Weak};

use tracing::warn;

use crate::client::ClientShared;
use crate::error::{LeaseError, Result};

/// Exclusive ownership of one outstanding lease.
///
/// A handle is created only by a successful [`crate::LeasingClient::borrow`]
/// (or [`crate::LeasingClient::adopt`]) and is move-only: there is no `Clone`,
/// so at most one owner can ever try to return the lease.
///
/// Validity only goes `true -> false`. It flips after a successful return,
/// on [`LicenseHandle::detach`], or when the handle is dropped. A failed
/// return leaves the handle valid so it can be retried.
///
/// Dropping a valid handle returns it through the client that issued it.
/// Failures there are logged and swallowed. If that client is already gone
/// the lease cannot be returned and is logged as leaked.
pub struct LicenseHandle {
    id: String,
    tool: String,
    user: String,
    valid: bool,
    owner: Weak<ClientShared>,
}

impl LicenseHandle {
    pub(crate) fn new(id: String, tool: String, user: String, owner: &Arc<ClientShared>) -> Self {
        Self {
            id,
            tool,
            user,
            valid: true,
            owner: Arc::downgrade(owner),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Return the lease through the client that issued this handle.
    pub fn release(&mut self) -> Result<()> {
        if !self.valid {
            return Err(LeaseError::InvalidHandle);
        }
        let owner = self
            .owner
            .upgrade()
            .ok_or_else(|| LeaseError::Connection("owning client has been dropped".to_string()))?;
        owner.return_lease(self)
    }

    /// Give up ownership without returning the lease.
    ///
    /// The caller becomes responsible for the returned id; dropping the
    /// handle afterwards does nothing.
    pub fn detach(mut self) -> String {
        self.valid = false;
        std::mem::take(&mut self.id)
    }

    pub(crate) fn invalidate(&mut self) {
        self.valid = false;
    }

    pub(crate) fn is_owned_by(&self, shared: &Arc<ClientShared>) -> bool {
        std::ptr::eq(self.owner.as_ptr(), Arc::as_ptr(shared))
    }
}

impl fmt::Debug for LicenseHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LicenseHandle")
            .field("id", &self.id)
            .field("tool", &self.tool)
            .field("user", &self.user)
            .field("valid", &self.valid)
            .finish()
    }
}

impl Drop for LicenseHandle {
    fn drop(&mut self) {
        if !self.valid {
            return;
        }

        match self.owner.upgrade() {
            Some(owner) => {
                if let Err(e) = owner.return_lease(self) {
                    warn!(
                        lease_id = %self.id,
                        tool = %self.tool,
                        error = %e,
                        "Implicit license return failed"
                    );
                }
            }
            None => {
                warn!(
                    lease_id = %self.id,
                    tool = %self.tool,
                    "Owning client dropped before handle; lease leaked"
                );
            }
        }
        self.valid = false;
    }
}
