//! User profile and role.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::ids::UserId;

/// `Developer` bypasses credit checks and deductions entirely; every other
/// role is metered against its balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    Standard,
    Developer,
}

impl UserRole {
    pub fn is_unlimited(&self) -> bool {
        matches!(self, Self::Developer)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct User {
    pub id: UserId,
    pub role: UserRole,
    pub transcription_credits: u32,
    pub notes_credits: u32,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl User {
    pub fn new(id: UserId, role: UserRole, transcription_credits: u32, notes_credits: u32) -> Self {
        Self {
            id,
            role,
            transcription_credits,
            notes_credits,
            display_name: None,
            email: None,
        }
    }

    pub fn has_unlimited(&self) -> bool {
        self.role.is_unlimited()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn developer_role_is_unlimited() {
        let u = User::new(UserId::from("u1"), UserRole::Developer, 0, 0);
        assert!(u.has_unlimited());
    }

    #[test]
    fn standard_role_is_metered() {
        let u = User::new(UserId::from("u1"), UserRole::Standard, 10, 10);
        assert!(!u.has_unlimited());
    }
}
