use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Admin,
    SuperAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::SuperAdmin => "super_admin",
        }
    }

    pub fn can_manage_venues(self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin)
    }

    pub fn can_manage_admins(self) -> bool {
        self == Role::SuperAdmin
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            "super_admin" => Ok(Role::SuperAdmin),
            other => Err(CoreError::validation(format!("Unknown role: {}", other))),
        }
    }
}

/// The verified caller behind a request: the `{id, role}` pair a token resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub role: Role,
}

impl Identity {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }

    pub fn is_super_admin(&self) -> bool {
        self.role == Role::SuperAdmin
    }

    pub fn can_modify_venue(&self, owner_id: Uuid) -> bool {
        match self.role {
            Role::SuperAdmin => true,
            Role::Admin => self.id == owner_id,
            Role::User => false,
        }
    }

    /// Super-admins read any admin profile; everyone else only their own.
    pub fn can_access_admin(&self, admin_id: Uuid) -> bool {
        self.is_super_admin() || self.id == admin_id
    }

    pub fn ensure_venue_manager(&self) -> CoreResult<()> {
        if self.role.can_manage_venues() {
            Ok(())
        } else {
            Err(CoreError::forbidden("Venue management requires an admin account"))
        }
    }

    pub fn ensure_super_admin(&self) -> CoreResult<()> {
        if self.role.can_manage_admins() {
            Ok(())
        } else {
            Err(CoreError::forbidden("Super-admin privileges required"))
        }
    }

    pub fn ensure_can_modify_venue(&self, owner_id: Uuid) -> CoreResult<()> {
        if self.can_modify_venue(owner_id) {
            Ok(())
        } else {
            Err(CoreError::forbidden("Venue belongs to another admin"))
        }
    }
}

#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Resolve an opaque bearer token to the caller it was issued for.
    async fn verify(&self, token: &str) -> CoreResult<Identity>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_str() {
        for role in [Role::User, Role::Admin, Role::SuperAdmin] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn test_venue_modification_rules() {
        let owner = Uuid::new_v4();
        let admin = Identity::new(owner, Role::Admin);
        let other_admin = Identity::new(Uuid::new_v4(), Role::Admin);
        let super_admin = Identity::new(Uuid::new_v4(), Role::SuperAdmin);
        let user = Identity::new(owner, Role::User);

        assert!(admin.can_modify_venue(owner));
        assert!(!other_admin.can_modify_venue(owner));
        assert!(super_admin.can_modify_venue(owner));
        assert!(!user.can_modify_venue(owner));
        assert!(matches!(
            other_admin.ensure_can_modify_venue(owner),
            Err(CoreError::Forbidden(_))
        ));
    }

    #[test]
    fn test_capabilities() {
        assert!(!Role::User.can_manage_venues());
        assert!(Role::Admin.can_manage_venues());
        assert!(!Role::Admin.can_manage_admins());
        assert!(Role::SuperAdmin.can_manage_admins());
        assert!(Identity::new(Uuid::new_v4(), Role::Admin).ensure_super_admin().is_err());
    }
}
