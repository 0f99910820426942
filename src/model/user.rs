use serde::{Deserialize, Serialize};

use crate::model::role::Role;

/// Operator account as the attendance service reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "isAdmin", default)]
    pub is_admin: bool,
}

impl UserProfile {
    pub fn role(&self) -> Role {
        Role::from_admin_flag(self.is_admin)
    }
}

/// The operator on whose behalf approve/decline calls are made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActingUser {
    pub id: String,
    pub name: String,
}
