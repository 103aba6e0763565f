pub mod deadline;
pub mod order_service;
pub mod product_service;
pub mod user_service;

use std::sync::Arc;

use shop_types::ports::providers::{Clock, IdGenerator, SystemClock, UuidGenerator};
use shop_types::ports::ShopRepository;

use order_service::OrderService;
use product_service::ProductService;
use user_service::UserService;

/// The application services, all backed by one repository.
pub struct Services<R: ShopRepository> {
    pub products: Arc<ProductService<R>>,
    pub users: Arc<UserService<R>>,
    pub orders: Arc<OrderService<R, R, R>>,
}

impl<R: ShopRepository> Services<R> {
    pub fn new(repo: R) -> Self {
        Self::with_providers(repo, Arc::new(UuidGenerator), Arc::new(SystemClock))
    }

    pub fn with_providers(repo: R, ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>) -> Self {
        let repo = Arc::new(repo);
        Self {
            products: Arc::new(
                ProductService::new(repo.clone()).with_providers(ids.clone(), clock.clone()),
            ),
            users: Arc::new(
                UserService::new(repo.clone()).with_providers(ids.clone(), clock.clone()),
            ),
            orders: Arc::new(
                OrderService::new(repo.clone(), repo.clone(), repo).with_providers(ids, clock),
            ),
        }
    }
}

impl<R: ShopRepository> Clone for Services<R> {
    fn clone(&self) -> Self {
        Self {
            products: self.products.clone(),
            users: self.users.clone(),
            orders: self.orders.clone(),
        }
    }
}
