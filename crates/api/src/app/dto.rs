use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use stockroom_core::{DomainError, ProductId};
use stockroom_inventory::{MovementFilter, MovementKind, NewProduct, ProductUpdate, RequisitionKind};
use stockroom_infra::Command;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub stock_on_hand: i64,
    #[serde(default)]
    pub minimum_stock: i64,
    #[serde(default)]
    pub unit_price: Decimal,
}

impl From<CreateProductRequest> for Command {
    fn from(body: CreateProductRequest) -> Self {
        Command::CreateProduct(NewProduct {
            name: body.name,
            stock_on_hand: body.stock_on_hand,
            minimum_stock: body.minimum_stock,
            unit_price: body.unit_price,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub minimum_stock: Option<i64>,
    pub unit_price: Option<Decimal>,
}

impl UpdateProductRequest {
    pub fn into_command(self, id: ProductId) -> Command {
        Command::UpdateProduct {
            id,
            update: ProductUpdate {
                name: self.name,
                minimum_stock: self.minimum_stock,
                unit_price: self.unit_price,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RecordMovementRequest {
    pub product_id: String,
    /// `inbound`/`outbound` (short forms accepted).
    pub kind: String,
    pub quantity: i64,
}

impl TryFrom<RecordMovementRequest> for Command {
    type Error = DomainError;

    fn try_from(body: RecordMovementRequest) -> Result<Self, Self::Error> {
        Ok(Command::RecordMovement {
            product_id: body.product_id.parse()?,
            kind: body.kind.parse()?,
            quantity: body.quantity,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateRequisitionRequest {
    pub product_id: String,
    pub quantity: i64,
    /// `withdrawal` (default) or `service_order`.
    pub kind: Option<String>,
    pub note: Option<String>,
}

impl TryFrom<CreateRequisitionRequest> for Command {
    type Error = DomainError;

    fn try_from(body: CreateRequisitionRequest) -> Result<Self, Self::Error> {
        let kind = match body.kind.as_deref().map(str::trim) {
            None | Some("") => RequisitionKind::default(),
            Some(raw) => raw.parse()?,
        };
        Ok(Command::RequestRequisition {
            kind,
            product_id: body.product_id.parse()?,
            quantity: body.quantity,
            note: body.note,
        })
    }
}

/// `?from=YYYY-MM-DD&to=YYYY-MM-DD&kind=inbound|outbound`, all optional.
#[derive(Debug, Default, Deserialize)]
pub struct MovementQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub kind: Option<String>,
}

impl TryFrom<MovementQuery> for MovementFilter {
    type Error = DomainError;

    fn try_from(query: MovementQuery) -> Result<Self, Self::Error> {
        if let (Some(from), Some(to)) = (query.from, query.to) {
            if from > to {
                return Err(DomainError::validation("'from' must not be after 'to'"));
            }
        }
        let kind = match query.kind.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<MovementKind>()?),
        };
        Ok(MovementFilter {
            from: query.from,
            to: query.to,
            kind,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requisition_kind_defaults_to_withdrawal() {
        let id = ProductId::new();
        let cmd = Command::try_from(CreateRequisitionRequest {
            product_id: id.to_string(),
            quantity: 2,
            kind: None,
            note: Some("line 3".to_string()),
        })
        .unwrap();
        assert_eq!(
            cmd,
            Command::RequestRequisition {
                kind: RequisitionKind::Withdrawal,
                product_id: id,
                quantity: 2,
                note: Some("line 3".to_string()),
            }
        );
    }

    #[test]
    fn bad_ids_and_kinds_are_validation_errors() {
        let err = Command::try_from(RecordMovementRequest {
            product_id: "not-a-uuid".to_string(),
            kind: "inbound".to_string(),
            quantity: 1,
        })
        .unwrap_err();
        assert!(matches!(err, DomainError::InvalidId(_)));

        let err = Command::try_from(RecordMovementRequest {
            product_id: ProductId::new().to_string(),
            kind: "sideways".to_string(),
            quantity: 1,
        })
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn movement_query_maps_to_filter() {
        let filter = MovementFilter::try_from(MovementQuery {
            from: NaiveDate::from_ymd_opt(2024, 1, 1),
            to: NaiveDate::from_ymd_opt(2024, 1, 31),
            kind: Some("out".to_string()),
        })
        .unwrap();
        assert_eq!(filter.kind, Some(MovementKind::Outbound));

        assert!(
            MovementFilter::try_from(MovementQuery {
                from: NaiveDate::from_ymd_opt(2024, 2, 1),
                to: NaiveDate::from_ymd_opt(2024, 1, 1),
                kind: None,
            })
            .is_err()
        );
    }
}
