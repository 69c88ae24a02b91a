use std::{convert::Infallible, str::FromStr};

use crate::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    Admin,
    #[default]
    Standard,
}

impl FromStr for Role {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if s.trim().eq_ignore_ascii_case("admin") {
            Role::Admin
        } else {
            Role::Standard
        })
    }
}

/// The caller of a request, as resolved by the session collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub role: Role,
}

impl Identity {
    pub fn new(user_id: impl Into<UserId>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Admins act for everyone, other users only for themselves.
    pub fn can_act_for(&self, user_id: &str) -> bool {
        self.is_admin() || self.user_id == user_id
    }
}
