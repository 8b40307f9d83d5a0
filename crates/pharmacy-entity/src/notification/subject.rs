//! The entity an alert is about.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of entity a notification refers to; stored as an indexed column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "alert_subject", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    Product,
    Sale,
    Prescription,
    Purchase,
    System,
}

impl SubjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Sale => "sale",
            Self::Prescription => "prescription",
            Self::Purchase => "purchase",
            Self::System => "system",
        }
    }
}

/// Subject of an alert: an entity reference, or the system itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum AlertSubject {
    Product(Uuid),
    Sale(Uuid),
    Prescription(Uuid),
    Purchase(Uuid),
    System,
}

impl AlertSubject {
    pub fn kind(&self) -> SubjectKind {
        match self {
            Self::Product(_) => SubjectKind::Product,
            Self::Sale(_) => SubjectKind::Sale,
            Self::Prescription(_) => SubjectKind::Prescription,
            Self::Purchase(_) => SubjectKind::Purchase,
            Self::System => SubjectKind::System,
        }
    }

    pub fn id(&self) -> Option<Uuid> {
        match self {
            Self::Product(id) | Self::Sale(id) | Self::Prescription(id) | Self::Purchase(id) => {
                Some(*id)
            }
            Self::System => None,
        }
    }

    /// Path of the subject's detail page.
    pub fn detail_path(&self) -> Option<String> {
        match self {
            Self::Product(id) => Some(format!("/inventory/{id}")),
            Self::Sale(id) => Some(format!("/sales/{id}")),
            Self::Prescription(id) => Some(format!("/prescriptions/{id}")),
            Self::Purchase(id) => Some(format!("/purchases/{id}")),
            Self::System => None,
        }
    }
}
