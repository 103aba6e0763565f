#[cfg(not(any(feature = "memory", feature = "sqlite")))]
compile_error!("Enable a repo feature: `memory` or `sqlite`.");

use shop_types::domain::order::Order;
use shop_types::domain::product::{Product, ProductUpdate, Reservation};
use shop_types::domain::user::{User, UserUpdate};
use shop_types::ports::order_repository::OrderRepository;
use shop_types::ports::product_repository::ProductRepository;
use shop_types::ports::user_repository::UserRepository;
use shop_types::ports::RepoError;

#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
pub const DEFAULT_DATABASE_URL: &str = "sqlite://shop.db";

/// The adapter selected at startup.
pub enum Repo {
    #[cfg(feature = "memory")]
    Memory(memory::InMemoryRepo),
    #[cfg(feature = "sqlite")]
    Sqlite(sqlite::SqliteRepo),
}

pub async fn build_repo(url: Option<&str>) -> anyhow::Result<Repo> {
    Repo::build_repo(url).await
}

impl Repo {
    #[cfg(all(feature = "memory", not(feature = "sqlite")))]
    pub async fn build_repo(_: Option<&str>) -> anyhow::Result<Self> {
        Ok(Self::Memory(memory::InMemoryRepo::new()))
    }

    #[cfg(all(feature = "sqlite", not(feature = "memory")))]
    pub async fn build_repo(database_url: Option<&str>) -> anyhow::Result<Self> {
        let url = database_url.unwrap_or(DEFAULT_DATABASE_URL);
        Ok(Self::Sqlite(sqlite::SqliteRepo::new(url).await?))
    }

    // With both adapters compiled in, a database url picks sqlite.
    #[cfg(all(feature = "sqlite", feature = "memory"))]
    pub async fn build_repo(database_url: Option<&str>) -> anyhow::Result<Self> {
        match database_url {
            Some(url) => Ok(Self::Sqlite(sqlite::SqliteRepo::new(url).await?)),
            None => Ok(Self::Memory(memory::InMemoryRepo::new())),
        }
    }

    pub fn backend(&self) -> &'static str {
        match self {
            #[cfg(feature = "memory")]
            Repo::Memory(_) => "memory",
            #[cfg(feature = "sqlite")]
            Repo::Sqlite(_) => "sqlite",
        }
    }
}

macro_rules! dispatch {
    ($self:ident, $repo:ident => $call:expr) => {
        match $self {
            #[cfg(feature = "memory")]
            Repo::Memory($repo) => $call,
            #[cfg(feature = "sqlite")]
            Repo::Sqlite($repo) => $call,
        }
    };
}

#[async_trait::async_trait]
impl ProductRepository for Repo {
    async fn create_product(&self, product: Product) -> Result<Product, RepoError> {
        dispatch!(self, r => r.create_product(product).await)
    }

    async fn get_product(&self, id: &str) -> Result<Option<Product>, RepoError> {
        dispatch!(self, r => r.get_product(id).await)
    }

    async fn list_products(&self) -> Result<Vec<Product>, RepoError> {
        dispatch!(self, r => r.list_products().await)
    }

    async fn update_product(&self, update: ProductUpdate) -> Result<bool, RepoError> {
        dispatch!(self, r => r.update_product(update).await)
    }

    async fn delete_product(&self, id: &str) -> Result<bool, RepoError> {
        dispatch!(self, r => r.delete_product(id).await)
    }

    async fn reserve_stock(
        &self,
        product_id: &str,
        quantity: u32,
    ) -> Result<Reservation, RepoError> {
        dispatch!(self, r => r.reserve_stock(product_id, quantity).await)
    }

    async fn release_stock(&self, reservation: &Reservation) -> Result<bool, RepoError> {
        dispatch!(self, r => r.release_stock(reservation).await)
    }
}

#[async_trait::async_trait]
impl UserRepository for Repo {
    async fn create_user(&self, user: User) -> Result<User, RepoError> {
        dispatch!(self, r => r.create_user(user).await)
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, RepoError> {
        dispatch!(self, r => r.get_user(id).await)
    }

    async fn list_users(&self) -> Result<Vec<User>, RepoError> {
        dispatch!(self, r => r.list_users().await)
    }

    async fn find_users_by_first_name(&self, first_name: &str) -> Result<Vec<User>, RepoError> {
        dispatch!(self, r => r.find_users_by_first_name(first_name).await)
    }

    async fn update_user(&self, update: UserUpdate) -> Result<bool, RepoError> {
        dispatch!(self, r => r.update_user(update).await)
    }

    async fn delete_user(&self, id: &str) -> Result<bool, RepoError> {
        dispatch!(self, r => r.delete_user(id).await)
    }
}

#[async_trait::async_trait]
impl OrderRepository for Repo {
    async fn append_order(&self, order: Order) -> Result<Order, RepoError> {
        dispatch!(self, r => r.append_order(order).await)
    }

    async fn get_order(&self, id: &str) -> Result<Option<Order>, RepoError> {
        dispatch!(self, r => r.get_order(id).await)
    }

    async fn list_orders(&self) -> Result<Vec<Order>, RepoError> {
        dispatch!(self, r => r.list_orders().await)
    }

    async fn list_orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, RepoError> {
        dispatch!(self, r => r.list_orders_for_user(user_id).await)
    }
}
