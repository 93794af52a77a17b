use serde::{Deserialize, Serialize};

/// One outstanding lease as tracked by the pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowRecord {
    /// Lease id assigned at borrow time
    pub id: String,
    pub tool: String,
    pub user: String,
    /// Borrow time in milliseconds since the epoch
    pub borrowed_at: u64,
    /// Borrowed while the tool was already at or beyond its commit
    #[serde(default)]
    pub is_overage: bool,
}
