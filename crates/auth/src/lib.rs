//! `stockroom-auth`: pure authentication/authorization boundary.
//!
//! This crate is decoupled from HTTP and storage: it knows how to
//! validate bearer-token claims, map roles to permissions, and answer one
//! question, "may this principal run this command?".

pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod permissions;
pub mod principal;
pub mod roles;

pub use authorize::{AuthzError, CommandAuthorization, Principal, authorize, authorize_command};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256JwtValidator, JwtError, JwtValidator};
pub use permissions::Permission;
pub use principal::PrincipalId;
pub use roles::{Role, permissions_from_roles};
