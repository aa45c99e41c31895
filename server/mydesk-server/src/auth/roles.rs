//! Role hierarchy: Staff < Incharge < Admin

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Staff,
    Incharge,
    Admin,
}

impl Role {
    pub const fn rank(self) -> u8 {
        match self {
            Role::Staff => 1,
            Role::Incharge => 2,
            Role::Admin => 3,
        }
    }

    pub fn is_at_least(self, required: Role) -> bool {
        self.rank() >= required.rank()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Staff => "staff",
            Role::Incharge => "incharge",
            Role::Admin => "admin",
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
        match s.trim().to_ascii_lowercase().as_str() {
            "staff" => Ok(Role::Staff),
            "incharge" => Ok(Role::Incharge),
            "admin" => Ok(Role::Admin),
            other => Err(format!("Unknown role: {other}")),
        }
    }
}

/// True iff `role` ranks at least as high as the highest of `acceptable`.
/// An empty set authorises every role.
pub fn is_authorized(role: Role, acceptable: &[Role]) -> bool {
    acceptable
        .iter()
        .map(|r| r.rank())
        .max()
        .map_or(true, |required| role.rank() >= required)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Role; 3] = [Role::Staff, Role::Incharge, Role::Admin];

    #[test]
    fn test_ranks_are_ordered() {
        assert!(Role::Staff.rank() < Role::Incharge.rank());
        assert!(Role::Incharge.rank() < Role::Admin.rank());
        assert!(Role::Admin.is_at_least(Role::Incharge));
        assert!(!Role::Staff.is_at_least(Role::Incharge));
    }

    #[test]
    fn test_authorization_uses_highest_acceptable_role() {
        assert!(is_authorized(Role::Incharge, &[Role::Staff, Role::Incharge]));
        assert!(!is_authorized(Role::Staff, &[Role::Staff, Role::Incharge]));
        assert!(!is_authorized(Role::Incharge, &[Role::Admin]));
        for role in ALL {
            assert!(is_authorized(role, &[]));
        }
    }

    #[test]
    fn test_authorization_is_monotonic() {
        for required in ALL {
            for lower in ALL {
                for higher in ALL.iter().filter(|h| h.rank() >= lower.rank()) {
                    if is_authorized(lower, &[required]) {
                        assert!(is_authorized(*higher, &[required]));
                    }
                }
            }
        }
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("Incharge".parse::<Role>().unwrap(), Role::Incharge);
        assert!("owner".parse::<Role>().is_err());
        assert_eq!(serde_json::to_value(Role::Admin).unwrap(), "admin");
    }
}
