//! HTTP Handlers
//!
//! Request handlers for all HTTP endpoints.

pub mod category;
pub mod health;
pub mod payout;
pub mod review;
pub mod seller;
pub mod service;
pub mod subscription;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::shared::error::AppError;

/// Parse a snowflake ID sent as a string in a path or body.
pub(crate) fn parse_id(value: &str, what: &str) -> Result<i64, AppError> {
    value
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid {} ID", what)))
}

/// Convert a JSON number into a currency Decimal (2 dp, half-up).
pub(crate) fn to_money(value: f64) -> Result<Decimal, AppError> {
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
        .ok_or_else(|| AppError::BadRequest("Invalid numeric amount".into()))
}
