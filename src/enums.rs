use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

// ─── AlertStatus ─────────────────────────────────────────────────────

/// Lifecycle state of an alert row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertStatus {
    Active,
    Triggered,
    Expired,
}

impl AlertStatus {
    /// Canonical string stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Active => "active",
            AlertStatus::Triggered => "triggered",
            AlertStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(AlertStatus::Active),
            "triggered" => Ok(AlertStatus::Triggered),
            "expired" => Ok(AlertStatus::Expired),
            _ => Err(AppError::InvalidInput(format!(
                "Invalid alert status: {}. Supported: active, triggered, expired",
                s
            ))),
        }
    }
}

// ─── AlertKind ───────────────────────────────────────────────────────

/// Which quantity an alert watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertKind {
    Price,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Price => "price",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "price" => Ok(AlertKind::Price),
            _ => Err(AppError::InvalidInput(format!(
                "Invalid alert type: {}. Supported: price",
                s
            ))),
        }
    }
}

// ─── AlertOp ─────────────────────────────────────────────────────────

/// Comparison applied between the computed price and the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertOp {
    Gte,
    Lte,
    Gt,
    Lt,
}

impl AlertOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertOp::Gte => "gte",
            AlertOp::Lte => "lte",
            AlertOp::Gt => "gt",
            AlertOp::Lt => "lt",
        }
    }

    /// Evaluates `price <op> threshold`.
    pub fn compare(&self, price: f64, threshold: f64) -> bool {
        match self {
            AlertOp::Gte => price >= threshold,
            AlertOp::Lte => price <= threshold,
            AlertOp::Gt => price > threshold,
            AlertOp::Lt => price < threshold,
        }
    }
}

impl fmt::Display for AlertOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertOp {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // "above" and "below" are the wire aliases older clients send.
        match s.to_lowercase().as_str() {
            "gte" | "above" => Ok(AlertOp::Gte),
            "lte" | "below" => Ok(AlertOp::Lte),
            "gt" => Ok(AlertOp::Gt),
            "lt" => Ok(AlertOp::Lt),
            _ => Err(AppError::InvalidInput(format!(
                "Invalid alert option: {}. Supported: gte, lte, gt, lt, above, below",
                s
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_storage_form() {
        for status in [AlertStatus::Active, AlertStatus::Triggered, AlertStatus::Expired] {
            assert_eq!(status.as_str().parse::<AlertStatus>().unwrap(), status);
        }
    }

    #[test]
    fn op_accepts_wire_aliases() {
        assert_eq!("above".parse::<AlertOp>().unwrap(), AlertOp::Gte);
        assert_eq!("below".parse::<AlertOp>().unwrap(), AlertOp::Lte);
        assert_eq!("GTE".parse::<AlertOp>().unwrap(), AlertOp::Gte);
    }

    #[test]
    fn op_rejects_unknown_value() {
        assert!("sideways".parse::<AlertOp>().is_err());
    }

    #[test]
    fn compare_covers_boundaries() {
        assert!(AlertOp::Gte.compare(1.5, 1.5));
        assert!(!AlertOp::Gt.compare(1.5, 1.5));
        assert!(AlertOp::Lte.compare(1.5, 1.5));
        assert!(!AlertOp::Lt.compare(1.5, 1.5));
        assert!(AlertOp::Gte.compare(2.0, 1.5));
        assert!(AlertOp::Lt.compare(1.0, 1.5));
    }
}
