use serde::{Deserialize, Serialize};

use licensa_core::accounting::Allocation;
use licensa_core::wire::{BorrowRequest, ReturnRequest};

// ─── Pool Provisioning ──────────────────────────────────────────────────────

/// One `--tool NAME=TOTAL[:COMMIT:MAX_OVERAGE[:COMMIT_PRICE:OVERAGE_PRICE]]` argument.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub allocation: Allocation,
}

const TOOL_SPEC_FORMAT: &str = "NAME=TOTAL[:COMMIT:MAX_OVERAGE[:COMMIT_PRICE:OVERAGE_PRICE]]";

pub fn parse_tool_spec(s: &str) -> Result<ToolSpec, String> {
    let (name, terms) = s
        .split_once('=')
        .ok_or_else(|| format!("'{}' must look like {}", s, TOOL_SPEC_FORMAT))?;
    let name = name.trim();
    validate_tool_name(name)?;

    let terms: Vec<&str> = terms.split(':').map(str::trim).collect();
    let count = |n: &str| n.parse::<u32>().map_err(|e| format!("'{}' in '{}': {}", n, s, e));
    let price = |n: &str| n.parse::<f64>().map_err(|e| format!("'{}' in '{}': {}", n, s, e));
    let invalid = |e: licensa_core::PoolError| format!("{}: {}", name, e);

    let allocation = match terms.as_slice() {
        &[total] => Allocation::fixed(count(total)?),
        &[total, commit, max_overage] => {
            Allocation::with_commit(count(total)?, count(commit)?, count(max_overage)?).map_err(invalid)?
        }
        &[total, commit, max_overage, commit_price, overage_price] => {
            let (commit_price, overage_price) = (price(commit_price)?, price(overage_price)?);
            Allocation::with_commit(count(total)?, count(commit)?, count(max_overage)?)
                .and_then(|a| a.with_pricing(commit_price, overage_price))
                .map_err(invalid)?
        }
        _ => return Err(format!("'{}' must look like {}", s, TOOL_SPEC_FORMAT)),
    };

    Ok(ToolSpec {
        name: name.to_string(),
        allocation,
    })
}

// ─── Validation Helpers ─────────────────────────────────────────────────────

pub fn validate_tool_name(tool: &str) -> Result<(), String> {
    if tool.is_empty() {
        return Err("tool is required".to_string());
    }
    if tool
        .chars()
        .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '/' | '?' | '#' | '%'))
    {
        return Err(format!("tool '{}' is not a valid identifier", tool));
    }
    Ok(())
}

pub fn validate_borrow(req: &BorrowRequest) -> Result<(), String> {
    // Unknown names are the pool's call (404), not a validation error
    if req.tool.is_empty() {
        return Err("tool is required".to_string());
    }
    if req.user.trim().is_empty() {
        return Err("user is required".to_string());
    }
    Ok(())
}

pub fn validate_return(req: &ReturnRequest) -> Result<(), String> {
    if req.id.trim().is_empty() {
        return Err("id is required".to_string());
    }
    Ok(())
}

// ─── Query / Response Types ─────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct BorrowsQuery {
    pub user: Option<String>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub tools: usize,
    pub outstanding: usize,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fixed_tool() {
        let spec = parse_tool_spec("cad_tool=2").unwrap();
        assert_eq!(spec.name, "cad_tool");
        assert_eq!(spec.allocation, Allocation::fixed(2));
    }

    #[test]
    fn test_parse_commit_tool() {
        let spec = parse_tool_spec("davinci-se=20:5:15").unwrap();
        assert_eq!(spec.allocation.total, 20);
        assert_eq!(spec.allocation.commit, 5);
        assert_eq!(spec.allocation.max_overage, 15);
    }

    #[test]
    fn test_parse_rejects_bad_specs() {
        assert!(parse_tool_spec("cad_tool").is_err());
        assert!(parse_tool_spec("=2").is_err());
        assert!(parse_tool_spec("cad_tool=two").is_err());
        assert!(parse_tool_spec("cad_tool=2:1").is_err());
        assert!(parse_tool_spec("cad_tool=5:4:2").is_err());
        assert!(parse_tool_spec("cad/tool=2").is_err());
        assert!(parse_tool_spec("davinci=20:5:15:5000").is_err());
        assert!(parse_tool_spec("davinci=20:5:15:5000:cheap").is_err());
        assert!(parse_tool_spec("davinci=20:5:15:-1:500").is_err());
    }

    #[test]
    fn test_parse_priced_tool() {
        let spec = parse_tool_spec("davinci-se=20:5:15:5000:500.5").unwrap();
        assert_eq!(spec.allocation.commit, 5);
        assert_eq!(spec.allocation.commit_price, 5000.0);
        assert_eq!(spec.allocation.overage_price, 500.5);
    }

    #[test]
    fn test_validate_requests() {
        let ok = BorrowRequest {
            tool: "cad_tool".to_string(),
            user: "alice".to_string(),
        };
        assert!(validate_borrow(&ok).is_ok());

        let no_user = BorrowRequest {
            tool: "cad_tool".to_string(),
            user: "".to_string(),
        };
        assert!(validate_borrow(&no_user).is_err());
        assert!(validate_return(&ReturnRequest { id: " ".to_string() }).is_err());
    }
}
