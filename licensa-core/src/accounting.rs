//! Capacity accounting rules shared by the client and the pool.
//!
//! A tool is provisioned with `total` licenses of which `commit` are the
//! guaranteed allocation. Borrowing may continue past `commit` into the
//! overage band, up to `max_overage` more, but never past `total`.
//!
//! Pricing is optional. `commit_price` is a flat charge for the committed
//! block; each borrow that lands in the overage band costs `overage_price`.

use crate::error::PoolError;
use crate::types::LicenseStatus;
use serde::{Deserialize, Serialize};

/// Provisioning terms for one tool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub total: u32,
    pub commit: u32,
    pub max_overage: u32,
    #[serde(default)]
    pub commit_price: f64,
    /// Charged once per borrow that lands in the overage band
    #[serde(default)]
    pub overage_price: f64,
}

impl Allocation {
    /// A pool with no overage band: every license is committed.
    pub fn fixed(total: u32) -> Self {
        Self {
            total,
            commit: total,
            max_overage: 0,
            commit_price: 0.0,
            overage_price: 0.0,
        }
    }

    /// A pool with explicit commit terms.
    pub fn with_commit(total: u32, commit: u32, max_overage: u32) -> Result<Self, PoolError> {
        match commit.checked_add(max_overage) {
            Some(ceiling) if ceiling <= total => Ok(Self {
                total,
                commit,
                max_overage,
                commit_price: 0.0,
                overage_price: 0.0,
            }),
            _ => Err(PoolError::InvalidAllocation(format!(
                "commit ({}) + max_overage ({}) exceeds total ({})",
                commit, max_overage, total
            ))),
        }
    }

    /// Attach pricing terms. Prices must be finite and non-negative.
    pub fn with_pricing(mut self, commit_price: f64, overage_price: f64) -> Result<Self, PoolError> {
        for (name, price) in [("commit_price", commit_price), ("overage_price", overage_price)] {
            if !price.is_finite() || price < 0.0 {
                return Err(PoolError::InvalidAllocation(format!(
                    "{} must be a non-negative amount, got {}",
                    name, price
                )));
            }
        }
        self.commit_price = commit_price;
        self.overage_price = overage_price;
        Ok(self)
    }

    /// Cost of the leases currently in the overage band.
    pub fn overage_cost(&self, borrowed: u32) -> f64 {
        f64::from(self.overage(borrowed)) * self.overage_price
    }

    /// Highest `borrowed` count the pool will accept.
    pub fn ceiling(&self) -> u32 {
        self.commit.saturating_add(self.max_overage).min(self.total)
    }

    pub fn available(&self, borrowed: u32) -> u32 {
        self.ceiling().saturating_sub(borrowed)
    }

    pub fn overage(&self, borrowed: u32) -> u32 {
        borrowed.saturating_sub(self.commit)
    }

    pub fn in_commit(&self, borrowed: u32) -> bool {
        borrowed <= self.commit
    }

    /// Whether one more borrow fits, given `borrowed` outstanding.
    pub fn admits(&self, borrowed: u32) -> bool {
        borrowed < self.ceiling()
    }

    /// Whether the next borrow lands in the overage band.
    pub fn next_is_overage(&self, borrowed: u32) -> bool {
        borrowed >= self.commit
    }

    /// Report this allocation's capacity with `borrowed` leases outstanding.
    pub fn snapshot(&self, tool: &str, borrowed: u32) -> LicenseStatus {
        LicenseStatus {
            tool: tool.to_string(),
            total: self.total,
            borrowed,
            available: self.available(borrowed),
            commit: self.commit,
            max_overage: self.max_overage,
            overage: self.overage(borrowed),
            in_commit: self.in_commit(borrowed),
            commit_price: self.commit_price,
            current_overage_cost: self.overage_cost(borrowed),
            total_cost: self.commit_price + self.overage_cost(borrowed),
        }
    }
}
