//! Routes client requests straight into an in-process [`LicensePool`],
//! with the same paths and status codes as `licensa serve`.

use crate::error::{LeaseError, PoolError};
use crate::pool::{now_ms, LicensePool};
use crate::transport::{Exchange, Method, Request, Transport};
use crate::wire::{self, BorrowRequest, BorrowResponse, ErrorResponse, ReturnRequest, ReturnResponse};
use serde::Serialize;
use std::sync::{Arc, Mutex};

pub struct InMemoryTransport {
    pool: Arc<Mutex<LicensePool>>,
}

impl InMemoryTransport {
    pub fn new(pool: LicensePool) -> Self {
        Self::shared(Arc::new(Mutex::new(pool)))
    }

    /// Share a pool with other transports or with the caller.
    pub fn shared(pool: Arc<Mutex<LicensePool>>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> Arc<Mutex<LicensePool>> {
        Arc::clone(&self.pool)
    }

    fn route(pool: &mut LicensePool, request: &Request) -> Result<Exchange, PoolError> {
        let body = request.body.as_deref().unwrap_or_default();

        match (request.method, request.path.as_str()) {
            (Method::Post, wire::BORROW_PATH) => {
                let req: BorrowRequest = parse_body(body)?;
                let record = pool.borrow(&req.tool, &req.user, now_ms())?;
                ok(&BorrowResponse {
                    id: record.id,
                    tool: Some(record.tool),
                    user: Some(record.user),
                    is_overage: record.is_overage,
                })
            }
            (Method::Post, wire::RETURN_PATH) => {
                let req: ReturnRequest = parse_body(body)?;
                let record = pool.return_lease(&req.id)?;
                ok(&ReturnResponse {
                    id: record.id,
                    tool: Some(record.tool),
                })
            }
            (Method::Get, wire::STATUS_ALL_PATH) => ok(&pool.statuses()),
            (Method::Get, wire::BORROWS_PATH) => {
                let user = request
                    .query
                    .iter()
                    .find(|(k, _)| k == "user")
                    .map(|(_, v)| v.as_str());
                ok(&pool.borrows(user))
            }
            (Method::Get, wire::OVERAGE_CHARGES_PATH) => ok(&wire::OverageChargesResponse::new(
                pool.overage_charges().to_vec(),
            )),
            (Method::Get, wire::VERSION_PATH) => ok(&wire::VersionResponse {
                version: env!("CARGO_PKG_VERSION").to_string(),
            }),
            (Method::Get, path) => {
                let tool = path
                    .strip_prefix("/licenses/")
                    .and_then(|rest| rest.strip_suffix("/status"))
                    .ok_or_else(|| PoolError::InvalidRequest(format!("no route for GET {}", path)))?;
                ok(&pool.status(tool)?)
            }
            (method, path) => Err(PoolError::InvalidRequest(format!(
                "no route for {} {}",
                method.as_str(),
                path
            ))),
        }
    }
}

impl Transport for InMemoryTransport {
    fn exchange(&mut self, request: &Request) -> Result<Exchange, LeaseError> {
        let mut pool = self
            .pool
            .lock()
            .map_err(|_| LeaseError::Connection("in-memory pool lock poisoned".to_string()))?;

        Ok(Self::route(&mut pool, request).unwrap_or_else(|e| {
            let body = serde_json::to_string(&ErrorResponse::new(e.to_string())).unwrap_or_default();
            Exchange::new(e.status_code(), body)
        }))
    }
}

fn parse_body<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, PoolError> {
    serde_json::from_str(body).map_err(|e| PoolError::InvalidRequest(e.to_string()))
}

fn ok<T: Serialize>(value: &T) -> Result<Exchange, PoolError> {
    serde_json::to_string(value)
        .map(|body| Exchange::new(wire::STATUS_OK, body))
        .map_err(|e| PoolError::InvalidRequest(e.to_string()))
}
