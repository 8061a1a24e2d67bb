//! Spreadsheet row → product mapping.
//!
//! Rows arrive as raw text cells (the CSV codec lives in infra). A row is
//! skipped when it has no name or no stock cell; a row whose stock is not a
//! whole non-negative number fails on its own without stopping the batch.

use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use thiserror::Error;

use crate::product::NewProduct;

/// Raw cells of one spreadsheet row. `line` is the 1-based line in the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductRow {
    pub line: usize,
    pub name: Option<String>,
    pub stock: Option<String>,
    pub minimum_stock: Option<String>,
    pub unit_price: Option<String>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[error("line {line}: {reason}")]
pub struct ImportRowError {
    pub line: usize,
    pub reason: String,
}

impl ImportRowError {
    pub fn new(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line,
            reason: reason.into(),
        }
    }
}

/// Outcome of one import batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub created: usize,
    pub skipped: usize,
    pub failures: Vec<ImportRowError>,
}

/// Map a row to a product, `Ok(None)` when the row is to be skipped.
pub fn parse_row(row: &ProductRow) -> Result<Option<NewProduct>, ImportRowError> {
    let Some(name) = cell(&row.name) else {
        return Ok(None);
    };
    let Some(stock_raw) = cell(&row.stock) else {
        return Ok(None);
    };

    let stock_on_hand = parse_whole(stock_raw)
        .ok_or_else(|| ImportRowError::new(row.line, format!("stock is not a whole number: '{stock_raw}'")))?;
    if stock_on_hand < 0 {
        return Err(ImportRowError::new(row.line, "stock cannot be negative"));
    }

    let minimum_stock = cell(&row.minimum_stock).and_then(parse_whole).unwrap_or(0);
    let unit_price = cell(&row.unit_price)
        .and_then(|raw| Decimal::from_str(raw).ok())
        .unwrap_or(Decimal::ZERO);

    Ok(Some(NewProduct {
        name: name.to_string(),
        stock_on_hand,
        minimum_stock,
        unit_price,
    }))
}

/// Trimmed, non-empty cell text. Spreadsheet tools write `nan` for empty numeric cells.
fn cell(raw: &Option<String>) -> Option<&str> {
    raw.as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("nan"))
}

/// Integers, also accepting `10.0` as written by spreadsheet exports.
fn parse_whole(raw: &str) -> Option<i64> {
    if let Ok(v) = raw.parse::<i64>() {
        return Some(v);
    }
    let d = Decimal::from_str(raw).ok()?;
    if d.fract().is_zero() { d.to_i64() } else { None }
}
