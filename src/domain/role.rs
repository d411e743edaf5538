use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Marketplace role of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Founder,
    Talent,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Founder, Role::Talent];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Founder => "founder",
            Role::Talent => "talent",
        }
    }

    /// Landing page after sign-in
    pub fn home_path(self) -> &'static str {
        match self {
            Role::Admin => "/admin",
            Role::Founder => "/founder",
            Role::Talent => "/talent",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "founder" => Ok(Role::Founder),
            "talent" => Ok(Role::Talent),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}
