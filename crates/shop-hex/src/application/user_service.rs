use std::sync::Arc;

use shop_types::domain::user::{CreateUserRequest, UpdateUserRequest, User, UserUpdate};
use shop_types::domain::validation;
use shop_types::ports::providers::{Clock, IdGenerator, SystemClock, UuidGenerator};
use shop_types::ports::user_repository::UserRepository;

use crate::errors::AppError;

pub struct UserService<R: UserRepository> {
    repo: Arc<R>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self {
            repo,
            ids: Arc::new(UuidGenerator),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_providers(mut self, ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>) -> Self {
        self.ids = ids;
        self.clock = clock;
        self
    }

    pub async fn create_user(&self, input: CreateUserRequest) -> Result<User, AppError> {
        let user = User::new(
            self.ids.generate(),
            input.first_name,
            input.last_name,
            input.age,
            input.is_married,
            input.password,
            self.clock.now(),
        )?;
        let created = self
            .repo
            .create_user(user)
            .await
            .map_err(|e| AppError::from_repo("create_user", e))?;
        tracing::info!(user_id = %created.id, "user created");
        Ok(created)
    }

    pub async fn get_user(&self, id: &str) -> Result<User, AppError> {
        match self
            .repo
            .get_user(id)
            .await
            .map_err(|e| AppError::from_repo("get_user", e))?
        {
            Some(u) => Ok(u),
            None => Err(AppError::NotFound(format!("user {}", id))),
        }
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.repo
            .list_users()
            .await
            .map_err(|e| AppError::from_repo("list_users", e))
    }

    /// First names are not unique, so every match is returned.
    pub async fn find_users_by_first_name(&self, first_name: &str) -> Result<Vec<User>, AppError> {
        validation::require("first_name", first_name)?;
        self.repo
            .find_users_by_first_name(first_name)
            .await
            .map_err(|e| AppError::from_repo("find_users_by_first_name", e))
    }

    pub async fn update_user(&self, input: UpdateUserRequest) -> Result<User, AppError> {
        let update = UserUpdate::new(
            input.id,
            input.first_name,
            input.last_name,
            input.age,
            input.is_married,
            input.password,
            self.clock.now(),
        )?;
        self.get_user(&update.id).await?;

        let id = update.id.clone();
        let matched = self
            .repo
            .update_user(update)
            .await
            .map_err(|e| AppError::from_repo("update_user", e))?;
        if !matched {
            return Err(AppError::Internal(anyhow::anyhow!(
                "update_user: no row matched user {id}"
            )));
        }
        self.get_user(&id).await
    }

    pub async fn delete_user(&self, id: &str) -> Result<(), AppError> {
        self.get_user(id).await?;
        let deleted = self
            .repo
            .delete_user(id)
            .await
            .map_err(|e| AppError::from_repo("delete_user", e))?;
        if !deleted {
            return Err(AppError::Internal(anyhow::anyhow!(
                "delete_user: no row matched user {id}"
            )));
        }
        tracing::info!(user_id = %id, "user deleted");
        Ok(())
    }
}
