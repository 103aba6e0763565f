use async_trait::async_trait;

use crate::domain::order::Order;
use crate::ports::RepoError;

/// Append-only ledger of placed orders.
#[async_trait]
pub trait OrderRepository: Send + Sync + 'static {
    /// Fails with `Conflict` if an order with the same id was already appended.
    async fn append_order(&self, order: Order) -> Result<Order, RepoError>;
    async fn get_order(&self, id: &str) -> Result<Option<Order>, RepoError>;
    async fn list_orders(&self) -> Result<Vec<Order>, RepoError>;
    async fn list_orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, RepoError>;
}
