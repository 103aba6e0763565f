use async_trait::async_trait;

use crate::domain::product::{Product, ProductUpdate, Reservation};
use crate::ports::RepoError;

#[async_trait]
pub trait ProductRepository: Send + Sync + 'static {
    async fn create_product(&self, product: Product) -> Result<Product, RepoError>;
    async fn get_product(&self, id: &str) -> Result<Option<Product>, RepoError>;
    async fn list_products(&self) -> Result<Vec<Product>, RepoError>;
    /// Returns `false` when no product matched.
    async fn update_product(&self, update: ProductUpdate) -> Result<bool, RepoError>;
    async fn delete_product(&self, id: &str) -> Result<bool, RepoError>;

    /// Takes `quantity` units if at least that many are available.
    ///
    /// Must be atomic with respect to every other reservation on the same
    /// product: the availability check and the decrement are one step.
    /// Fails with `NotFound` or `InsufficientStock` and leaves stock untouched.
    async fn reserve_stock(&self, product_id: &str, quantity: u32)
        -> Result<Reservation, RepoError>;

    /// Gives back a reservation's units. Returns `false` if the product no
    /// longer exists.
    async fn release_stock(&self, reservation: &Reservation) -> Result<bool, RepoError>;
}
