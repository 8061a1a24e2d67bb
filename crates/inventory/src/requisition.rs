use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use stockroom_core::{DomainError, DomainResult, Entity, ProductId, RequisitionId, UserId};

/// What the requisition is for. Both kinds share one approval lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequisitionKind {
    /// Ad-hoc request to withdraw stock, optionally with a note.
    #[default]
    Withdrawal,
    /// Material requested against a service order.
    ServiceOrder,
}

impl RequisitionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RequisitionKind::Withdrawal => "withdrawal",
            RequisitionKind::ServiceOrder => "service_order",
        }
    }
}

impl core::str::FromStr for RequisitionKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "withdrawal" => Ok(RequisitionKind::Withdrawal),
            "service_order" => Ok(RequisitionKind::ServiceOrder),
            other => Err(DomainError::validation(format!("unknown requisition kind '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequisitionStatus {
    Pending,
    Approved,
    Denied,
}

impl RequisitionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RequisitionStatus::Pending => "pending",
            RequisitionStatus::Approved => "approved",
            RequisitionStatus::Denied => "denied",
        }
    }

    /// Human-facing label used in spreadsheet exports.
    pub fn label(self) -> &'static str {
        match self {
            RequisitionStatus::Pending => "Pending",
            RequisitionStatus::Approved => "Approved",
            RequisitionStatus::Denied => "Denied",
        }
    }
}

impl core::fmt::Display for RequisitionStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for RequisitionStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RequisitionStatus::Pending),
            "approved" => Ok(RequisitionStatus::Approved),
            "denied" => Ok(RequisitionStatus::Denied),
            other => Err(DomainError::validation(format!("unknown requisition status '{other}'"))),
        }
    }
}

/// Unique external code printed on the paper slip: 12 uppercase hex digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RequisitionCode(String);

impl RequisitionCode {
    pub const LEN: usize = 12;

    pub fn generate() -> Self {
        let hex = Uuid::new_v4().simple().to_string().to_ascii_uppercase();
        Self(hex[..Self::LEN].to_string())
    }

    pub fn parse(raw: &str) -> DomainResult<Self> {
        let raw = raw.trim();
        let raw = raw.strip_prefix("OS-").unwrap_or(raw);
        if raw.len() != Self::LEN || !raw.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DomainError::validation(format!(
                "requisition code must be {} hex digits",
                Self::LEN
            )));
        }
        Ok(Self(raw.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for RequisitionCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "OS-{}", self.0)
    }
}

impl TryFrom<String> for RequisitionCode {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RequisitionCode> for String {
    fn from(value: RequisitionCode) -> Self {
        value.0
    }
}

/// Who asked for (or reviewed) a requisition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requester {
    pub user_id: UserId,
    pub username: String,
}

/// Request to take stock out, pending review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requisition {
    pub id: RequisitionId,
    pub code: RequisitionCode,
    pub kind: RequisitionKind,
    pub product_id: ProductId,
    pub requester: Requester,
    pub quantity: i64,
    pub status: RequisitionStatus,
    pub note: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<Requester>,
}

impl Requisition {
    pub fn is_pending(&self) -> bool {
        self.status == RequisitionStatus::Pending
    }

    pub(crate) fn ensure_pending(&self) -> DomainResult<()> {
        if self.is_pending() {
            Ok(())
        } else {
            Err(DomainError::already_processed(self.status))
        }
    }
}

impl Entity for Requisition {
    type Id = RequisitionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Input for opening a requisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRequisition {
    pub kind: RequisitionKind,
    pub product_id: ProductId,
    pub requester: Requester,
    pub quantity: i64,
    pub note: Option<String>,
}

impl NewRequisition {
    /// Validate and build a Pending requisition. Stock is not checked here;
    /// availability is decided at approval time.
    pub fn into_requisition(
        self,
        id: RequisitionId,
        code: RequisitionCode,
        requested_at: DateTime<Utc>,
    ) -> DomainResult<Requisition> {
        if self.quantity <= 0 {
            return Err(DomainError::validation("quantity must be greater than zero"));
        }
        let note = self
            .note
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        Ok(Requisition {
            id,
            code,
            kind: self.kind,
            product_id: self.product_id,
            requester: self.requester,
            quantity: self.quantity,
            status: RequisitionStatus::Pending,
            note,
            requested_at,
            resolved_at: None,
            resolved_by: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requester() -> Requester {
        Requester {
            user_id: UserId::new(),
            username: "carla".to_string(),
        }
    }

    #[test]
    fn generated_codes_are_twelve_hex_digits() {
        let code = RequisitionCode::generate();
        assert_eq!(code.as_str().len(), RequisitionCode::LEN);
        assert!(code.as_str().chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
        assert_eq!(code.to_string(), format!("OS-{}", code.as_str()));
    }

    #[test]
    fn parse_accepts_display_form() {
        let code = RequisitionCode::parse("OS-0a1b2c3d4e5f").unwrap();
        assert_eq!(code.as_str(), "0A1B2C3D4E5F");
        assert!(RequisitionCode::parse("OS-123").is_err());
        assert!(RequisitionCode::parse("ZZZZZZZZZZZZ").is_err());
    }

    #[test]
    fn new_requisition_starts_pending_and_drops_blank_notes() {
        let req = NewRequisition {
            kind: RequisitionKind::Withdrawal,
            product_id: ProductId::new(),
            requester: requester(),
            quantity: 3,
            note: Some("   ".to_string()),
        }
        .into_requisition(RequisitionId::new(), RequisitionCode::generate(), Utc::now())
        .unwrap();

        assert_eq!(req.status, RequisitionStatus::Pending);
        assert_eq!(req.note, None);
        assert!(req.resolved_at.is_none());
    }

    #[test]
    fn new_requisition_rejects_non_positive_quantity() {
        for quantity in [0, -2] {
            let err = NewRequisition {
                kind: RequisitionKind::ServiceOrder,
                product_id: ProductId::new(),
                requester: requester(),
                quantity,
                note: None,
            }
            .into_requisition(RequisitionId::new(), RequisitionCode::generate(), Utc::now())
            .unwrap_err();
            assert!(matches!(err, DomainError::Validation(_)));
        }
    }
}
