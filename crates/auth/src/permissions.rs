use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are modeled as opaque strings (e.g. "catalog.read").
/// A special wildcard permission `"*"` grants everything; it is what the
/// `admin` role maps to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const WILDCARD: Permission = Permission(Cow::Borrowed("*"));

    /// View products, movements and the dashboard.
    pub const CATALOG_READ: Permission = Permission(Cow::Borrowed("catalog.read"));
    /// Create/update products and import spreadsheets.
    pub const CATALOG_WRITE: Permission = Permission(Cow::Borrowed("catalog.write"));
    /// Register inbound/outbound movements directly.
    pub const MOVEMENTS_WRITE: Permission = Permission(Cow::Borrowed("movements.write"));
    /// Open a requisition for oneself.
    pub const REQUISITIONS_CREATE: Permission = Permission(Cow::Borrowed("requisitions.create"));
    /// List, approve and deny requisitions.
    pub const REQUISITIONS_REVIEW: Permission = Permission(Cow::Borrowed("requisitions.review"));
    /// Download spreadsheet exports.
    pub const EXPORTS_READ: Permission = Permission(Cow::Borrowed("exports.read"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
