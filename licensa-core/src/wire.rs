//! Wire contract between the leasing client and a pool endpoint.
//!
//! Bodies are flat JSON objects; field names are part of the protocol.

use crate::error::LeaseError;
use crate::types::OverageCharge;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub const STATUS_OK: u16 = 200;
/// Pool exhausted on borrow.
pub const STATUS_CONFLICT: u16 = 409;

pub const BORROW_PATH: &str = "/licenses/borrow";
pub const RETURN_PATH: &str = "/licenses/return";
pub const STATUS_ALL_PATH: &str = "/licenses/status";
pub const BORROWS_PATH: &str = "/borrows";
pub const VERSION_PATH: &str = "/version";
pub const OVERAGE_CHARGES_PATH: &str = "/overage-charges";

pub fn status_path(tool: &str) -> String {
    format!("/licenses/{}/status", tool)
}

// ─── Request Types ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct BorrowRequest {
    pub tool: String,
    pub user: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReturnRequest {
    pub id: String,
}

// ─── Response Types ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct BorrowResponse {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default)]
    pub is_overage: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReturnResponse {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VersionResponse {
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OverageChargesResponse {
    pub charges: Vec<OverageCharge>,
    /// Sum of `charges[].amount`
    #[serde(default)]
    pub total: f64,
}

impl OverageChargesResponse {
    pub fn new(charges: Vec<OverageCharge>) -> Self {
        let total = charges.iter().map(|c| c.amount).sum();
        Self { charges, total }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { error: msg.into() }
    }
}

// ─── Codec ──────────────────────────────────────────────────────────────────

pub fn encode<T: Serialize>(value: &T) -> Result<String, LeaseError> {
    serde_json::to_string(value).map_err(|e| LeaseError::Protocol(format!("encode failed: {}", e)))
}

/// Decode a response body, naming `what` in the error on failure.
pub fn decode<T: DeserializeOwned>(body: &str, what: &str) -> Result<T, LeaseError> {
    serde_json::from_str(body)
        .map_err(|e| LeaseError::Protocol(format!("malformed {} response: {}", what, e)))
}
