use serde::{Deserialize, Serialize};

/// Snapshot of one tool's pool capacity as reported by the pool.
///
/// `tool`, `total`, `borrowed` and `available` are required on the wire.
/// The accounting and cost fields default when absent so that pools
/// without commit/overage terms or pricing still parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LicenseStatus {
    /// Tool name
    pub tool: String,
    /// Licenses provisioned for this tool
    pub total: u32,
    /// Currently outstanding leases
    pub borrowed: u32,
    /// Leases that can still be borrowed, as reported by the pool
    pub available: u32,
    /// Guaranteed allocation within `total`
    #[serde(default)]
    pub commit: u32,
    /// Ceiling on how far `borrowed` may exceed `commit`
    #[serde(default)]
    pub max_overage: u32,
    /// Amount by which `borrowed` currently exceeds `commit`
    #[serde(default)]
    pub overage: u32,
    /// True while `borrowed <= commit`
    #[serde(default = "default_in_commit")]
    pub in_commit: bool,
    /// Flat price of the committed block
    #[serde(default)]
    pub commit_price: f64,
    /// Price of the leases currently in the overage band
    #[serde(default)]
    pub current_overage_cost: f64,
    /// `commit_price + current_overage_cost`
    #[serde(default)]
    pub total_cost: f64,
}

fn default_in_commit() -> bool {
    true
}

impl LicenseStatus {
    /// Whether the pool advertises commit/overage terms for this tool.
    pub fn has_overage_terms(&self) -> bool {
        self.max_overage > 0
    }

    /// Whether the pool reports no remaining capacity.
    pub fn is_exhausted(&self) -> bool {
        self.available == 0
    }
}
