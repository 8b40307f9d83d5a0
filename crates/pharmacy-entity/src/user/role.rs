//! User role enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Staff roles. Stored with their French labels, as the pharmacy uses them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role")]
pub enum UserRole {
    /// Pharmacy manager; receives stock, purchase and sales alerts.
    #[sqlx(rename = "responsable")]
    #[serde(rename = "responsable")]
    Admin,
    /// Dispensing pharmacist; receives prescription alerts.
    #[sqlx(rename = "pharmacien")]
    #[serde(rename = "pharmacien")]
    Pharmacist,
}

impl UserRole {
    /// Stored label of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "responsable",
            Self::Pharmacist => "pharmacien",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = pharmacy_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "responsable" | "admin" => Ok(Self::Admin),
            "pharmacien" | "pharmacist" => Ok(Self::Pharmacist),
            _ => Err(pharmacy_core::AppError::validation(format!(
                "Invalid user role: '{s}'. Expected one of: responsable, pharmacien"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_both_labels() {
        assert_eq!("responsable".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!("Admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!(
            "pharmacien".parse::<UserRole>().unwrap(),
            UserRole::Pharmacist
        );
        assert!("caissier".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_serde_uses_stored_label() {
        let json = serde_json::to_string(&UserRole::Pharmacist).unwrap();
        assert_eq!(json, "\"pharmacien\"");
    }
}
