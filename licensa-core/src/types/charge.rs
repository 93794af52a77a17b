use serde::{Deserialize, Serialize};

/// A charge recorded when a borrow lands in a tool's overage band.
///
/// Charges stay in the ledger after the lease is returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverageCharge {
    pub tool: String,
    pub user: String,
    /// Lease id of the borrow that incurred the charge
    pub borrow_id: String,
    pub amount: f64,
    /// Charge time in milliseconds since the epoch
    pub charged_at: u64,
}
