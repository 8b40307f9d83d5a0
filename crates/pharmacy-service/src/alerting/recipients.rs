//! Recipient resolution: who receives which alert.

use std::sync::Arc;

use uuid::Uuid;

use pharmacy_core::result::AppResult;
use pharmacy_database::store::UserDirectory;
use pharmacy_entity::user::{User, UserRole};

/// Target group of an alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    /// Pharmacy managers (`responsable`).
    Admins,
    /// Dispensing staff (`pharmacien`).
    Pharmacists,
    /// Everyone in the directory.
    AllUsers,
    /// An explicit list of recipients.
    Users(Vec<Uuid>),
}

impl Audience {
    /// Whether resolving this audience needs the user directory.
    pub fn needs_directory(&self) -> bool {
        !matches!(self, Self::Users(_))
    }
}

/// Select the recipient ids for `audience` out of `users`.
///
/// Role filters keep directory order. An explicit list is returned as given
/// with repeated ids dropped.
pub fn select_recipients(audience: &Audience, users: &[User]) -> Vec<Uuid> {
    let by_role = |role: UserRole| -> Vec<Uuid> {
        users
            .iter()
            .filter(|u| u.role == role)
            .map(|u| u.id)
            .collect()
    };

    match audience {
        Audience::Admins => by_role(UserRole::Admin),
        Audience::Pharmacists => by_role(UserRole::Pharmacist),
        Audience::AllUsers => users.iter().map(|u| u.id).collect(),
        Audience::Users(ids) => {
            let mut unique = Vec::with_capacity(ids.len());
            for id in ids {
                if !unique.contains(id) {
                    unique.push(*id);
                }
            }
            unique
        }
    }
}

/// Resolves audiences against the user directory.
#[derive(Debug, Clone)]
pub struct RecipientResolver {
    users: Arc<dyn UserDirectory>,
}

impl RecipientResolver {
    pub fn new(users: Arc<dyn UserDirectory>) -> Self {
        Self { users }
    }

    /// Snapshot of the directory, fetched once per emission.
    pub async fn directory(&self) -> AppResult<Vec<User>> {
        self.users.list_all().await
    }

    pub async fn resolve(&self, audience: &Audience) -> AppResult<Vec<Uuid>> {
        if !audience.needs_directory() {
            return Ok(select_recipients(audience, &[]));
        }
        let users = self.directory().await?;
        Ok(select_recipients(audience, &users))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(name: &str, role: UserRole) -> User {
        User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: format!("{}@pharmacie.test", name.to_lowercase()),
            role,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_role_filters() {
        let awa = user("Awa", UserRole::Admin);
        let ben = user("Ben", UserRole::Pharmacist);
        let chloe = user("Chloe", UserRole::Pharmacist);
        let users = vec![awa.clone(), ben.clone(), chloe.clone()];

        assert_eq!(select_recipients(&Audience::Admins, &users), vec![awa.id]);
        assert_eq!(
            select_recipients(&Audience::Pharmacists, &users),
            vec![ben.id, chloe.id]
        );
        assert_eq!(select_recipients(&Audience::AllUsers, &users).len(), 3);
    }

    #[test]
    fn test_explicit_list_drops_repeats() {
        let id = Uuid::new_v4();
        let other = Uuid::new_v4();
        let picked = select_recipients(&Audience::Users(vec![id, other, id]), &[]);
        assert_eq!(picked, vec![id, other]);
    }

    #[test]
    fn test_no_admins_means_nobody() {
        let users = vec![user("Ben", UserRole::Pharmacist)];
        assert!(select_recipients(&Audience::Admins, &users).is_empty());
    }
}
