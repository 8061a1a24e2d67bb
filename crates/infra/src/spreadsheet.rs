//! CSV spreadsheet codec for product import and the two exports.
//!
//! Import header names are matched trimmed and case-insensitively; the
//! Portuguese column names used by older sheets are accepted as aliases.

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use stockroom_core::ProductId;
use stockroom_inventory::{Product, ProductRow, Requisition};

const NAME: &[&str] = &["name", "nome"];
const STOCK: &[&str] = &["stock", "estoque"];
const MINIMUM_STOCK: &[&str] = &["minimum stock", "estoque minimo", "estoque mínimo"];
const UNIT_PRICE: &[&str] = &["unit price", "preço unitario", "preço unitário", "preco unitario"];

const DATE_FORMAT: &str = "%d/%m/%Y %H:%M";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SpreadsheetError {
    #[error("missing column: {0}")]
    MissingColumn(&'static str),

    #[error("unreadable spreadsheet: {0}")]
    Read(String),

    #[error("failed to write spreadsheet: {0}")]
    Write(String),
}

impl From<csv::Error> for SpreadsheetError {
    fn from(value: csv::Error) -> Self {
        Self::Read(value.to_string())
    }
}

/// A rendered table plus the filename it is offered under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sheet {
    pub filename: &'static str,
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn to_csv(&self) -> Result<String, SpreadsheetError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(&self.headers)
            .map_err(|e| SpreadsheetError::Write(e.to_string()))?;
        for row in &self.rows {
            writer
                .write_record(row)
                .map_err(|e| SpreadsheetError::Write(e.to_string()))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| SpreadsheetError::Write(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| SpreadsheetError::Write(e.to_string()))
    }
}

/// Read the raw product rows of an import sheet.
///
/// `Name` and `Stock` columns must exist; the other two are optional. Cell
/// contents are not interpreted here, see [`stockroom_inventory::parse_row`].
pub fn read_product_rows(input: &str) -> Result<Vec<ProductRow>, SpreadsheetError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(input.as_bytes());

    let headers = reader.headers()?.clone();
    let column = |aliases: &[&str]| {
        headers
            .iter()
            .position(|h| aliases.contains(&h.trim().to_lowercase().as_str()))
    };

    let name = column(NAME).ok_or(SpreadsheetError::MissingColumn("Name"))?;
    let stock = column(STOCK).ok_or(SpreadsheetError::MissingColumn("Stock"))?;
    let minimum_stock = column(MINIMUM_STOCK);
    let unit_price = column(UNIT_PRICE);

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let cell = |idx: Option<usize>| idx.and_then(|i| record.get(i)).map(str::to_string);
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(index + 2);

        rows.push(ProductRow {
            line,
            name: cell(Some(name)),
            stock: cell(Some(stock)),
            minimum_stock: cell(minimum_stock),
            unit_price: cell(unit_price),
        });
    }
    Ok(rows)
}

/// Stock report: one row per product, in the order given.
pub fn products_sheet(products: &[Product]) -> Sheet {
    Sheet {
        filename: "stock.csv",
        headers: vec!["Product", "Stock", "Unit Price"],
        rows: products
            .iter()
            .map(|p| {
                vec![
                    p.name.clone(),
                    p.stock_on_hand.to_string(),
                    format!("{:.2}", p.unit_price),
                ]
            })
            .collect(),
    }
}

/// Requisition report. Products that no longer resolve are shown by id.
pub fn requisitions_sheet(requisitions: &[Requisition], products: &[Product]) -> Sheet {
    let names: HashMap<ProductId, &str> = products.iter().map(|p| (p.id, p.name.as_str())).collect();

    Sheet {
        filename: "requisitions.csv",
        headers: vec!["Code", "Product", "User", "Quantity", "Status", "Date"],
        rows: requisitions
            .iter()
            .map(|r| {
                vec![
                    r.code.to_string(),
                    names
                        .get(&r.product_id)
                        .map(|n| n.to_string())
                        .unwrap_or_else(|| r.product_id.to_string()),
                    r.requester.username.clone(),
                    r.quantity.to_string(),
                    r.status.label().to_string(),
                    r.requested_at.format(DATE_FORMAT).to_string(),
                ]
            })
            .collect(),
    }
}
