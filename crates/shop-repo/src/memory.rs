use std::sync::Arc;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use shop_types::domain::order::Order;
use shop_types::domain::product::{Product, ProductUpdate, Reservation};
use shop_types::domain::user::{User, UserUpdate};
use shop_types::ports::order_repository::OrderRepository;
use shop_types::ports::product_repository::ProductRepository;
use shop_types::ports::user_repository::UserRepository;
use shop_types::ports::RepoError;

/// DashMap-backed store. Clones share the same maps.
#[derive(Clone)]
pub struct InMemoryRepo {
    pub products: Arc<DashMap<String, Product>>,
    pub users: Arc<DashMap<String, User>>,
    pub orders: Arc<DashMap<String, Order>>,
}

impl InMemoryRepo {
    pub fn new() -> Self {
        Self {
            products: Arc::new(DashMap::new()),
            users: Arc::new(DashMap::new()),
            orders: Arc::new(DashMap::new()),
        }
    }
}

impl Default for InMemoryRepo {
    fn default() -> Self {
        Self::new()
    }
}

fn insert_new<V: Clone>(map: &DashMap<String, V>, id: &str, value: V) -> Result<V, RepoError> {
    match map.entry(id.to_string()) {
        Entry::Occupied(_) => Err(RepoError::Conflict(id.to_string())),
        Entry::Vacant(slot) => {
            slot.insert(value.clone());
            Ok(value)
        }
    }
}

#[async_trait]
impl ProductRepository for InMemoryRepo {
    async fn create_product(&self, product: Product) -> Result<Product, RepoError> {
        let id = product.id.clone();
        insert_new(&self.products, &id, product)
    }

    async fn get_product(&self, id: &str) -> Result<Option<Product>, RepoError> {
        Ok(self.products.get(id).map(|r| r.clone()))
    }

    async fn list_products(&self) -> Result<Vec<Product>, RepoError> {
        let mut all: Vec<Product> = self.products.iter().map(|kv| kv.value().clone()).collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(all)
    }

    async fn update_product(&self, update: ProductUpdate) -> Result<bool, RepoError> {
        if let Some(mut p) = self.products.get_mut(&update.id) {
            p.apply(&update);
            return Ok(true);
        }
        Ok(false)
    }

    async fn delete_product(&self, id: &str) -> Result<bool, RepoError> {
        Ok(self.products.remove(id).is_some())
    }

    async fn reserve_stock(
        &self,
        product_id: &str,
        quantity: u32,
    ) -> Result<Reservation, RepoError> {
        // The shard write lock covers both the check and the decrement.
        let mut product = self
            .products
            .get_mut(product_id)
            .ok_or_else(|| RepoError::NotFound(format!("product {product_id}")))?;
        if product.quantity < quantity {
            return Err(RepoError::InsufficientStock {
                product_id: product_id.to_string(),
                requested: quantity,
                available: product.quantity,
            });
        }
        product.quantity -= quantity;
        Ok(Reservation {
            product_id: product_id.to_string(),
            quantity,
            unit_price_cents: product.unit_price_cents,
        })
    }

    async fn release_stock(&self, reservation: &Reservation) -> Result<bool, RepoError> {
        match self.products.get_mut(&reservation.product_id) {
            Some(mut product) => {
                product.quantity = product
                    .quantity
                    .checked_add(reservation.quantity)
                    .ok_or_else(|| {
                        RepoError::DbError(format!(
                            "stock overflow releasing {}",
                            reservation.product_id
                        ))
                    })?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryRepo {
    async fn create_user(&self, user: User) -> Result<User, RepoError> {
        let id = user.id.clone();
        insert_new(&self.users, &id, user)
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, RepoError> {
        Ok(self.users.get(id).map(|r| r.clone()))
    }

    async fn list_users(&self) -> Result<Vec<User>, RepoError> {
        let mut all: Vec<User> = self.users.iter().map(|kv| kv.value().clone()).collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(all)
    }

    async fn find_users_by_first_name(&self, first_name: &str) -> Result<Vec<User>, RepoError> {
        let mut matches: Vec<User> = self
            .users
            .iter()
            .filter(|kv| kv.value().first_name == first_name)
            .map(|kv| kv.value().clone())
            .collect();
        matches.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(matches)
    }

    async fn update_user(&self, update: UserUpdate) -> Result<bool, RepoError> {
        if let Some(mut u) = self.users.get_mut(&update.id) {
            u.apply(&update);
            return Ok(true);
        }
        Ok(false)
    }

    async fn delete_user(&self, id: &str) -> Result<bool, RepoError> {
        Ok(self.users.remove(id).is_some())
    }
}

#[async_trait]
impl OrderRepository for InMemoryRepo {
    async fn append_order(&self, order: Order) -> Result<Order, RepoError> {
        let id = order.id.clone();
        insert_new(&self.orders, &id, order)
    }

    async fn get_order(&self, id: &str) -> Result<Option<Order>, RepoError> {
        Ok(self.orders.get(id).map(|r| r.clone()))
    }

    async fn list_orders(&self) -> Result<Vec<Order>, RepoError> {
        let mut all: Vec<Order> = self.orders.iter().map(|kv| kv.value().clone()).collect();
        all.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
        Ok(all)
    }

    async fn list_orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, RepoError> {
        let mut mine: Vec<Order> = self
            .orders
            .iter()
            .filter(|kv| kv.value().user_id == user_id)
            .map(|kv| kv.value().clone())
            .collect();
        mine.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
        Ok(mine)
    }
}
