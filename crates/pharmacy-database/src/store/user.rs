//! Staff directory contract.

use std::fmt::Debug;

use async_trait::async_trait;
use uuid::Uuid;

use pharmacy_core::result::AppResult;
use pharmacy_entity::user::{NewUser, User};

#[async_trait]
pub trait UserDirectory: Send + Sync + Debug + 'static {
    async fn create(&self, input: NewUser) -> AppResult<User>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Every user, active or not, ordered by name.
    async fn list_all(&self) -> AppResult<Vec<User>>;
}
