pub mod order_repository;
pub mod product_repository;
pub mod providers;
pub mod user_repository;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RepoError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    Conflict(String),

    #[error("insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        requested: u32,
        available: u32,
    },

    #[error("db error: {0}")]
    DbError(String),
}

/// Every port a complete backing store provides.
pub trait ShopRepository:
    product_repository::ProductRepository
    + user_repository::UserRepository
    + order_repository::OrderRepository
{
}

impl<T> ShopRepository for T where
    T: product_repository::ProductRepository
        + user_repository::UserRepository
        + order_repository::OrderRepository
{
}
