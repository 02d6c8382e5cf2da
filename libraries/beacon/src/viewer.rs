//! Who a session belongs to, and what they may do.

use std::collections::BTreeSet;

use crate::data_model::UserId;

/// Required to create notifications, addressed or broadcast.
pub const SEND_NOTIFICATIONS: &str = "notifications:send";

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    Admin,
    SuperAdmin,
    Moderator,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AdminGrant {
    pub role: AdminRole,
    pub permissions: BTreeSet<String>,
}

impl AdminGrant {
    pub fn new<I, S>(role: AdminRole, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            role,
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: UserId,
    pub admin: Option<AdminGrant>,
}

impl Viewer {
    pub fn member(user_id: UserId) -> Self {
        Self {
            user_id,
            admin: None,
        }
    }

    pub fn admin(user_id: UserId, grant: AdminGrant) -> Self {
        Self {
            user_id,
            admin: Some(grant),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.admin.is_some()
    }

    /// Only admins hold permissions; a role alone grants nothing.
    pub fn can(&self, permission: &str) -> bool {
        self.admin
            .as_ref()
            .is_some_and(|grant| grant.permissions.contains(permission))
    }
}
