use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, Entity, ProductId};

pub const MAX_NAME_LEN: usize = 100;

/// Largest storable unit price, 99 999 999.99 (the `NUMERIC(10, 2)` column).
pub const MAX_UNIT_PRICE: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

/// Catalog product with its physical stock.
///
/// `stock_on_hand` is set once at creation; afterwards only the ledger
/// (movements and approved requisitions) changes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub stock_on_hand: i64,
    pub minimum_stock: i64,
    pub unit_price: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Stock at or below the configured minimum.
    pub fn is_critical(&self) -> bool {
        self.stock_on_hand <= self.minimum_stock
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Input for creating a product (form submission or spreadsheet row).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub stock_on_hand: i64,
    #[serde(default)]
    pub minimum_stock: i64,
    #[serde(default)]
    pub unit_price: Decimal,
}

impl NewProduct {
    /// Validate and build the product record.
    pub fn into_product(self, id: ProductId, created_at: DateTime<Utc>) -> DomainResult<Product> {
        let name = validate_name(&self.name)?;
        if self.stock_on_hand < 0 {
            return Err(DomainError::validation("stock cannot be negative"));
        }
        validate_minimum(self.minimum_stock)?;
        let unit_price = validate_price(self.unit_price)?;

        Ok(Product {
            id,
            name,
            stock_on_hand: self.stock_on_hand,
            minimum_stock: self.minimum_stock,
            unit_price,
            created_at,
        })
    }
}

/// Partial update of the descriptive fields. Stock is not editable here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub minimum_stock: Option<i64>,
    pub unit_price: Option<Decimal>,
}

impl ProductUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.minimum_stock.is_none() && self.unit_price.is_none()
    }

    /// Return the updated product, leaving `stock_on_hand` untouched.
    pub fn apply_to(&self, product: &Product) -> DomainResult<Product> {
        let mut next = product.clone();
        if let Some(name) = &self.name {
            next.name = validate_name(name)?;
        }
        if let Some(min) = self.minimum_stock {
            validate_minimum(min)?;
            next.minimum_stock = min;
        }
        if let Some(price) = self.unit_price {
            next.unit_price = validate_price(price)?;
        }
        Ok(next)
    }
}

fn validate_name(name: &str) -> DomainResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::validation("name cannot be empty"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(DomainError::validation(format!(
            "name cannot exceed {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

fn validate_minimum(minimum_stock: i64) -> DomainResult<()> {
    if minimum_stock < 0 {
        return Err(DomainError::validation("minimum stock cannot be negative"));
    }
    Ok(())
}

fn validate_price(price: Decimal) -> DomainResult<Decimal> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(DomainError::validation("unit price cannot be negative"));
    }
    let price = price.round_dp(2);
    if price > MAX_UNIT_PRICE {
        return Err(DomainError::validation(format!(
            "unit price cannot exceed {MAX_UNIT_PRICE}"
        )));
    }
    Ok(price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn new_product(name: &str, stock: i64, min: i64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            stock_on_hand: stock,
            minimum_stock: min,
            unit_price: Decimal::from_str("12.345").unwrap(),
        }
    }

    #[test]
    fn create_trims_name_and_rounds_price() {
        let p = new_product("  Safety gloves ", 10, 2)
            .into_product(ProductId::new(), Utc::now())
            .unwrap();
        assert_eq!(p.name, "Safety gloves");
        assert_eq!(p.unit_price, Decimal::from_str("12.35").unwrap());
    }

    #[test]
    fn create_rejects_bad_values() {
        for np in [
            new_product("   ", 1, 0),
            new_product("Helmet", -1, 0),
            new_product("Helmet", 1, -3),
        ] {
            let err = np.into_product(ProductId::new(), Utc::now()).unwrap_err();
            assert!(matches!(err, DomainError::Validation(_)), "got {err:?}");
        }
    }

    #[test]
    fn price_is_bounded_by_storage_precision() {
        assert_eq!(MAX_UNIT_PRICE, Decimal::from_str("99999999.99").unwrap());
        assert_eq!(validate_price(MAX_UNIT_PRICE).unwrap(), MAX_UNIT_PRICE);
        assert_eq!(
            validate_price(Decimal::from_str("99999999.994").unwrap()).unwrap(),
            MAX_UNIT_PRICE
        );

        let mut np = new_product("Forklift", 1, 0);
        np.unit_price = Decimal::from(100_000_000);
        let err = np.into_product(ProductId::new(), Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)), "got {err:?}");
    }

    #[test]
    fn critical_when_at_or_below_minimum() {
        let mut p = new_product("Mask", 2, 2)
            .into_product(ProductId::new(), Utc::now())
            .unwrap();
        assert!(p.is_critical());
        p.stock_on_hand = 3;
        assert!(!p.is_critical());
    }

    #[test]
    fn update_never_touches_stock() {
        let p = new_product("Boots", 7, 1)
            .into_product(ProductId::new(), Utc::now())
            .unwrap();
        let update = ProductUpdate {
            name: Some("Steel-toe boots".to_string()),
            minimum_stock: Some(4),
            unit_price: None,
        };
        let next = update.apply_to(&p).unwrap();
        assert_eq!(next.name, "Steel-toe boots");
        assert_eq!(next.minimum_stock, 4);
        assert_eq!(next.stock_on_hand, 7);
        assert_eq!(next.unit_price, p.unit_price);
    }

    #[test]
    fn update_rejects_negative_price() {
        let p = new_product("Boots", 7, 1)
            .into_product(ProductId::new(), Utc::now())
            .unwrap();
        let update = ProductUpdate {
            unit_price: Some(Decimal::from(-1)),
            ..ProductUpdate::default()
        };
        assert!(matches!(update.apply_to(&p), Err(DomainError::Validation(_))));
    }
}
