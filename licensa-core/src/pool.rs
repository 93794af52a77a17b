//! In-process license pool: the authority on capacity per tool.
//!
//! Backs both the `licensa serve` HTTP server and [`crate::transport_in_memory`].

use crate::accounting::Allocation;
use crate::error::PoolError;
use crate::types::{BorrowRecord, LicenseStatus, OverageCharge};
use std::collections::{BTreeMap, HashMap};
use std::time::{SystemTime, UNIX_EPOCH};

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

struct ToolPool {
    allocation: Allocation,
    borrowed: u32,
}

pub struct LicensePool {
    // Tool name -> allocation and outstanding count, ordered by name
    tools: BTreeMap<String, ToolPool>,
    // Lease ID -> borrow record
    borrows: HashMap<String, BorrowRecord>,
    // Overage charges in the order they were incurred
    charges: Vec<OverageCharge>,
}

/// `user` filter value that lists every user's leases.
pub const ALL_USERS: &str = "all";

impl LicensePool {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
            borrows: HashMap::new(),
            charges: Vec::new(),
        }
    }

    /// Builder-style variant of [`LicensePool::provision`].
    pub fn with_tool(mut self, tool: &str, allocation: Allocation) -> Self {
        self.provision(tool, allocation);
        self
    }

    /// Add a tool or replace its allocation. Outstanding leases are kept,
    /// even if the new ceiling is below them; further borrows are refused
    /// until enough are returned.
    pub fn provision(&mut self, tool: &str, allocation: Allocation) {
        self.tools
            .entry(tool.to_string())
            .and_modify(|p| p.allocation = allocation)
            .or_insert(ToolPool {
                allocation,
                borrowed: 0,
            });
    }

    pub fn borrow(&mut self, tool: &str, user: &str, now: u64) -> Result<BorrowRecord, PoolError> {
        if user.is_empty() {
            return Err(PoolError::InvalidRequest("user is required".to_string()));
        }
        let pool = self
            .tools
            .get_mut(tool)
            .ok_or_else(|| PoolError::UnknownTool(tool.to_string()))?;

        if !pool.allocation.admits(pool.borrowed) {
            return Err(PoolError::Exhausted(tool.to_string()));
        }

        let record = BorrowRecord {
            id: nanoid::nanoid!(),
            tool: tool.to_string(),
            user: user.to_string(),
            borrowed_at: now,
            is_overage: pool.allocation.next_is_overage(pool.borrowed),
        };
        if record.is_overage {
            self.charges.push(OverageCharge {
                tool: record.tool.clone(),
                user: record.user.clone(),
                borrow_id: record.id.clone(),
                amount: pool.allocation.overage_price,
                charged_at: now,
            });
        }
        pool.borrowed += 1;
        self.borrows.insert(record.id.clone(), record.clone());

        Ok(record)
    }

    pub fn return_lease(&mut self, lease_id: &str) -> Result<BorrowRecord, PoolError> {
        let record = self
            .borrows
            .remove(lease_id)
            .ok_or_else(|| PoolError::UnknownLease(lease_id.to_string()))?;

        if let Some(pool) = self.tools.get_mut(&record.tool) {
            pool.borrowed = pool.borrowed.saturating_sub(1);
        }
        Ok(record)
    }

    pub fn status(&self, tool: &str) -> Result<LicenseStatus, PoolError> {
        self.tools
            .get(tool)
            .map(|p| p.allocation.snapshot(tool, p.borrowed))
            .ok_or_else(|| PoolError::UnknownTool(tool.to_string()))
    }

    /// Status of every tool, ordered by tool name.
    pub fn statuses(&self) -> Vec<LicenseStatus> {
        self.tools
            .iter()
            .map(|(tool, p)| p.allocation.snapshot(tool, p.borrowed))
            .collect()
    }

    /// Outstanding leases, oldest first, optionally for one user.
    /// [`ALL_USERS`] is the same as no filter.
    pub fn borrows(&self, user: Option<&str>) -> Vec<BorrowRecord> {
        let user = user.filter(|u| *u != ALL_USERS);
        let mut records: Vec<BorrowRecord> = self
            .borrows
            .values()
            .filter(|b| user.is_none_or(|u| b.user == u))
            .cloned()
            .collect();
        records.sort_by(|a, b| a.borrowed_at.cmp(&b.borrowed_at).then_with(|| a.id.cmp(&b.id)));
        records
    }

    pub fn overage_charges(&self) -> &[OverageCharge] {
        &self.charges
    }

    pub fn outstanding(&self) -> usize {
        self.borrows.len()
    }
}

impl Default for LicensePool {
    fn default() -> Self {
        Self::new()
    }
}
