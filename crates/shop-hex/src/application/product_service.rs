use std::sync::Arc;

use shop_types::domain::product::{
    CreateProductRequest, Product, ProductUpdate, UpdateProductRequest,
};
use shop_types::ports::product_repository::ProductRepository;
use shop_types::ports::providers::{Clock, IdGenerator, SystemClock, UuidGenerator};

use crate::errors::AppError;

pub struct ProductService<R: ProductRepository> {
    repo: Arc<R>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl<R: ProductRepository> ProductService<R> {
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

    pub async fn create_product(&self, input: CreateProductRequest) -> Result<Product, AppError> {
        let id = input.id.unwrap_or_else(|| self.ids.generate());
        let product = Product::new(
            id,
            input.description,
            input.quantity,
            input.tags,
            input.unit_price_cents,
            self.clock.now(),
        )?;
        let created = self
            .repo
            .create_product(product)
            .await
            .map_err(|e| AppError::from_repo("create_product", e))?;
        tracing::info!(product_id = %created.id, quantity = created.quantity, "product created");
        Ok(created)
    }

    pub async fn get_product(&self, id: &str) -> Result<Product, AppError> {
        match self
            .repo
            .get_product(id)
            .await
            .map_err(|e| AppError::from_repo("get_product", e))?
        {
            Some(p) => Ok(p),
            None => Err(AppError::NotFound(format!("product {}", id))),
        }
    }

    pub async fn list_products(&self) -> Result<Vec<Product>, AppError> {
        self.repo
            .list_products()
            .await
            .map_err(|e| AppError::from_repo("list_products", e))
    }

    /// Replaces every mutable field; the product must already exist.
    pub async fn update_product(&self, input: UpdateProductRequest) -> Result<Product, AppError> {
        let update = ProductUpdate::new(
            input.id,
            input.description,
            input.quantity,
            input.tags,
            input.unit_price_cents,
            self.clock.now(),
        )?;
        self.get_product(&update.id).await?;

        let id = update.id.clone();
        let matched = self
            .repo
            .update_product(update)
            .await
            .map_err(|e| AppError::from_repo("update_product", e))?;
        if !matched {
            return Err(AppError::Internal(anyhow::anyhow!(
                "update_product: no row matched product {id}"
            )));
        }
        self.get_product(&id).await
    }

    pub async fn delete_product(&self, id: &str) -> Result<(), AppError> {
        self.get_product(id).await?;
        let deleted = self
            .repo
            .delete_product(id)
            .await
            .map_err(|e| AppError::from_repo("delete_product", e))?;
        if !deleted {
            return Err(AppError::Internal(anyhow::anyhow!(
                "delete_product: no row matched product {id}"
            )));
        }
        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }
}
