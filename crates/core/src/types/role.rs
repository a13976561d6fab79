//! Admin roles.

use serde::{Deserialize, Serialize};

/// Admin role with different permission levels.
///
/// Serialized exactly as the backend spells it (`SUPERADMIN`, `ADMIN`,
/// `PRODUCT`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdminRole {
    /// Full access including admin account management.
    #[serde(rename = "SUPERADMIN")]
    SuperAdmin,
    /// Full access to catalog and content management.
    #[serde(rename = "ADMIN")]
    Admin,
    /// Product manager: catalog and pricing.
    #[serde(rename = "PRODUCT")]
    Product,
}

/// Error returned when a role string is not one of the known roles.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid admin role: {0} (expected SUPERADMIN, ADMIN or PRODUCT)")]
pub struct ParseRoleError(pub String);

impl AdminRole {
    /// All roles, in the order they are offered in forms.
    pub const ALL: [Self; 3] = [Self::Admin, Self::Product, Self::SuperAdmin];

    /// Wire representation of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SuperAdmin => "SUPERADMIN",
            Self::Admin => "ADMIN",
            Self::Product => "PRODUCT",
        }
    }

    /// Human-readable label for the role.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::SuperAdmin => "Super Admin",
            Self::Admin => "Admin",
            Self::Product => "Product Manager",
        }
    }
}

impl std::fmt::Display for AdminRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AdminRole {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SUPERADMIN" => Ok(Self::SuperAdmin),
            "ADMIN" => Ok(Self::Admin),
            "PRODUCT" => Ok(Self::Product),
            _ => Err(ParseRoleError(s.to_owned())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_uses_backend_spelling() {
        let json = serde_json::to_string(&AdminRole::SuperAdmin).unwrap();
        assert_eq!(json, "\"SUPERADMIN\"");

        let role: AdminRole = serde_json::from_str("\"PRODUCT\"").unwrap();
        assert_eq!(role, AdminRole::Product);
    }

    #[test]
    fn test_from_str_is_case_insensitive() {
        assert_eq!("admin".parse::<AdminRole>().unwrap(), AdminRole::Admin);
        assert_eq!(
            " SuperAdmin ".parse::<AdminRole>().unwrap(),
            AdminRole::SuperAdmin
        );
        assert!("viewer".parse::<AdminRole>().is_err());
    }

    #[test]
    fn test_display_round_trips_through_from_str() {
        for role in AdminRole::ALL {
            assert_eq!(role.to_string().parse::<AdminRole>().unwrap(), role);
        }
    }
}
