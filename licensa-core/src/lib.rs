//! # licensa-core
//!
//! The leasing protocol for shared tool licenses.
//! Provides the client-side lease lifecycle (borrow, hold, return),
//! commit/overage capacity accounting, and an in-process reference pool.

pub mod accounting;
pub mod client;
pub mod error;
pub mod handle;
pub mod pool;
pub mod transport;
#[path = "transport_in_memory.rs"]
pub mod transport_in_memory;
#[cfg(feature = "http")]
#[path = "transport_http.rs"]
pub mod transport_http;
pub mod types;
pub mod wire;

pub use client::{ClientConfig, LeasingClient};
pub use error::{LeaseError, PoolError, Result};
pub use handle::LicenseHandle;
pub use types::{BorrowRecord, LicenseStatus, OverageCharge};

#[cfg(test)]
mod accounting_test;
#[cfg(test)]
#[path = "transport_test.rs"]
mod transport_test;
