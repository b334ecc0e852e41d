//! Authenticated caller identity

use serde::{Deserialize, Serialize};

/// Caller role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

crate::impl_status_conversions!(Role {
    User => "user",
    Admin => "admin",
});

/// The user on whose behalf a request runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub role: Role,
}

impl Caller {
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }

    /// Owners and admins may modify a record.
    pub fn can_manage(&self, owner_id: &str) -> bool {
        self.is_admin() || self.id == owner_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(id: &str, role: Role) -> Caller {
        Caller { id: id.into(), name: "Sam".into(), email: None, role }
    }

    #[test]
    fn owner_can_manage_own_records() {
        assert!(caller("u-1", Role::User).can_manage("u-1"));
        assert!(!caller("u-2", Role::User).can_manage("u-1"));
    }

    #[test]
    fn admin_can_manage_anything() {
        assert!(caller("admin-1", Role::Admin).can_manage("u-1"));
    }
}
