use async_trait::async_trait;

use crate::domain::user::{User, UserUpdate};
use crate::ports::RepoError;

#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    async fn create_user(&self, user: User) -> Result<User, RepoError>;
    async fn get_user(&self, id: &str) -> Result<Option<User>, RepoError>;
    async fn list_users(&self) -> Result<Vec<User>, RepoError>;
    /// All users with this first name, oldest first.
    async fn find_users_by_first_name(&self, first_name: &str) -> Result<Vec<User>, RepoError>;
    async fn update_user(&self, update: UserUpdate) -> Result<bool, RepoError>;
    async fn delete_user(&self, id: &str) -> Result<bool, RepoError>;
}
