use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::Permission;

/// Role identifier used for RBAC.
///
/// Roles arrive as opaque strings in token claims; `permissions()` is the
/// single place where a role is turned into capabilities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    /// Superuser: everything.
    pub const ADMIN: Role = Role(Cow::Borrowed("admin"));
    /// Storeroom staff: reviews requisitions.
    pub const STAFF: Role = Role(Cow::Borrowed("staff"));
    /// Any authenticated employee.
    pub const USER: Role = Role(Cow::Borrowed("user"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Permissions granted by this role. Unknown roles grant nothing.
    pub fn permissions(&self) -> Vec<Permission> {
        match self.as_str() {
            "admin" => vec![Permission::WILDCARD],
            "staff" => vec![
                Permission::CATALOG_READ,
                Permission::REQUISITIONS_CREATE,
                Permission::REQUISITIONS_REVIEW,
            ],
            "user" => vec![Permission::CATALOG_READ, Permission::REQUISITIONS_CREATE],
            _ => Vec::new(),
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Union of the permissions granted by `roles`, without duplicates.
pub fn permissions_from_roles(roles: &[Role]) -> Vec<Permission> {
    let mut perms: Vec<Permission> = Vec::new();
    for perm in roles.iter().flat_map(Role::permissions) {
        if !perms.contains(&perm) {
            perms.push(perm);
        }
    }
    perms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_maps_to_wildcard() {
        assert_eq!(Role::ADMIN.permissions(), vec![Permission::WILDCARD]);
    }

    #[test]
    fn unknown_role_grants_nothing() {
        assert!(Role::new("viewer").permissions().is_empty());
    }

    #[test]
    fn union_is_deduplicated() {
        let perms = permissions_from_roles(&[Role::USER, Role::STAFF]);
        let reads = perms.iter().filter(|p| **p == Permission::CATALOG_READ).count();
        assert_eq!(reads, 1);
        assert!(perms.contains(&Permission::REQUISITIONS_REVIEW));
    }
}
