//! Auth provider contract and role hierarchy.
//!
//! # Responsibility
//! - Model the acting principal resolved by the external auth provider.
//! - Provide one total order over roles so minimum-role checks stay consistent.
//!
//! # Invariants
//! - `Role` ordering is the declaration order; `has_min_role` is transitive.

use crate::error::{CoreError, CoreResult};
use crate::model::UserId;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Ordered role hierarchy, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Public,
    Delegate,
    CommitteeMember,
    CommitteeChair,
    Staff,
    Admin,
    SuperAdmin,
}

impl Role {
    pub const ALL: [Role; 7] = [
        Self::Public,
        Self::Delegate,
        Self::CommitteeMember,
        Self::CommitteeChair,
        Self::Staff,
        Self::Admin,
        Self::SuperAdmin,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => "PUBLIC",
            Self::Delegate => "DELEGATE",
            Self::CommitteeMember => "COMMITTEE_MEMBER",
            Self::CommitteeChair => "COMMITTEE_CHAIR",
            Self::Staff => "STAFF",
            Self::Admin => "ADMIN",
            Self::SuperAdmin => "SUPER_ADMIN",
        }
    }

    /// Parses a role name case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == normalized)
    }

    pub fn has_min_role(self, min: Role) -> bool {
        self >= min
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Total-order role comparison.
pub fn has_min_role(role: Role, min: Role) -> bool {
    role.has_min_role(min)
}

/// Authenticated actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: UserId,
    pub role: Role,
}

impl Principal {
    pub fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    /// Fails with `AuthorizationDenied` when the role is below `min`.
    pub fn require(&self, min: Role) -> CoreResult<()> {
        if self.role.has_min_role(min) {
            return Ok(());
        }
        Err(CoreError::AuthorizationDenied {
            required: min,
            actual: self.role,
        })
    }

    /// Passes for the owning user or for anyone at `min` or above.
    pub fn require_owner_or(&self, owner: UserId, min: Role) -> CoreResult<()> {
        if self.id == owner {
            return Ok(());
        }
        self.require(min)
    }
}

/// Resolves the principal acting on the current request.
pub trait AuthProvider {
    fn current_principal(&self) -> Option<Principal>;

    /// Resolves the principal or fails with `AuthenticationRequired`.
    fn require_principal(&self) -> CoreResult<Principal> {
        self.current_principal()
            .ok_or(CoreError::AuthenticationRequired)
    }
}

/// Auth provider returning a fixed principal; used by tests and the CLI.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticAuthProvider {
    principal: Option<Principal>,
}

impl StaticAuthProvider {
    pub fn authenticated(principal: Principal) -> Self {
        Self {
            principal: Some(principal),
        }
    }

    pub fn anonymous() -> Self {
        Self { principal: None }
    }
}

impl AuthProvider for StaticAuthProvider {
    fn current_principal(&self) -> Option<Principal> {
        self.principal
    }
}

#[cfg(test)]
mod tests {
    use super::{has_min_role, AuthProvider, Principal, Role, StaticAuthProvider};
    use crate::error::CoreError;
    use uuid::Uuid;

    #[test]
    fn role_order_is_total_and_transitive() {
        for (i, low) in Role::ALL.iter().enumerate() {
            for (j, high) in Role::ALL.iter().enumerate() {
                assert_eq!(has_min_role(*high, *low), j >= i);
            }
        }
    }

    #[test]
    fn parses_role_names_case_insensitively() {
        assert_eq!(Role::parse("committee_chair"), Some(Role::CommitteeChair));
        assert_eq!(Role::parse(" SUPER_ADMIN "), Some(Role::SuperAdmin));
        assert_eq!(Role::parse("root"), None);
    }

    #[test]
    fn require_reports_required_and_actual_roles() {
        let principal = Principal::new(Uuid::new_v4(), Role::Delegate);
        let err = principal.require(Role::Staff).unwrap_err();
        assert!(matches!(
            err,
            CoreError::AuthorizationDenied {
                required: Role::Staff,
                actual: Role::Delegate
            }
        ));
    }

    #[test]
    fn owner_passes_without_elevated_role() {
        let owner = Uuid::new_v4();
        let principal = Principal::new(owner, Role::Public);
        assert!(principal.require_owner_or(owner, Role::Staff).is_ok());
        assert!(principal
            .require_owner_or(Uuid::new_v4(), Role::Staff)
            .is_err());
    }

    #[test]
    fn anonymous_provider_requires_authentication() {
        let err = StaticAuthProvider::anonymous()
            .require_principal()
            .unwrap_err();
        assert!(matches!(err, CoreError::AuthenticationRequired));
    }
}
