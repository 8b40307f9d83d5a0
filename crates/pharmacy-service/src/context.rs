//! Acting user carried into mutation services.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pharmacy_entity::user::{User, UserRole};

/// Who is performing a mutation.
///
/// Alert messages name the actor (seller, dispensing pharmacist, receiving
/// manager), so the display name travels with the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorContext {
    pub user_id: Uuid,
    pub name: String,
    pub role: UserRole,
}

impl ActorContext {
    pub fn new(user_id: Uuid, name: impl Into<String>, role: UserRole) -> Self {
        Self {
            user_id,
            name: name.into(),
            role,
        }
    }

    /// Returns whether the actor manages the pharmacy.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl From<&User> for ActorContext {
    fn from(user: &User) -> Self {
        Self::new(user.id, user.name.clone(), user.role)
    }
}
