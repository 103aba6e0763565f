use std::time::Duration;

use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use shop_types::domain::order::{Order, PlaceOrderRequest};
use shop_types::domain::product::{CreateProductRequest, Product, UpdateProductRequest};
use shop_types::domain::user::{CreateUserRequest, UpdateUserRequest, User};

#[derive(Clone)]
pub struct ShopClientBuilder {
    base: Url,
    headers: HeaderMap,
    timeout: Option<Duration>,
    client: Option<reqwest::Client>,
}

/// Typed client for the shop HTTP service.
///
/// Non-2xx responses become errors carrying the status and the server's
/// `{"error": ...}` message.
#[derive(Clone)]
pub struct ShopClient {
    base: Url,
    client: reqwest::Client,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProductBody {
    pub product: Product,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProductsBody {
    pub products: Vec<Product>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserBody {
    pub user: User,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UsersBody {
    pub users: Vec<User>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct OrderBody {
    pub order: Order,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct OrdersBody {
    pub orders: Vec<Order>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

async fn read<T: DeserializeOwned>(res: Response) -> anyhow::Result<T> {
    let res = check(res).await?;
    Ok(res.json().await?)
}

async fn check(res: Response) -> anyhow::Result<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let message = match res.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => String::from("no error body"),
    };
    tracing::debug!(%status, %message, "request failed");
    anyhow::bail!("{status}: {message}")
}

impl ShopClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Self::builder(base_url)?.build()
    }

    pub fn builder(base_url: &str) -> anyhow::Result<ShopClientBuilder> {
        let base = Url::parse(base_url).context("invalid base url")?;
        Ok(ShopClientBuilder {
            base,
            headers: HeaderMap::new(),
            timeout: None,
            client: None,
        })
    }

    fn url(&self, path: &str) -> anyhow::Result<Url> {
        self.base.join(path).context("failed to join url")
    }

    // Appends caller-supplied ids as single, percent-encoded path segments.
    fn url_with(&self, path: &str, key: &str) -> anyhow::Result<Url> {
        let mut url = self.url(path)?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("base url cannot carry a path"))?
            .pop_if_empty()
            .push(key);
        Ok(url)
    }

    pub async fn health(&self) -> anyhow::Result<()> {
        check(self.client.get(self.url("health")?).send().await?).await?;
        Ok(())
    }

    pub async fn create_product(&self, req: &CreateProductRequest) -> anyhow::Result<Product> {
        let res = self
            .client
            .post(self.url("product/create")?)
            .json(req)
            .send()
            .await?;
        Ok(read::<ProductBody>(res).await?.product)
    }

    pub async fn list_products(&self) -> anyhow::Result<Vec<Product>> {
        let res = self.client.get(self.url("product/all")?).send().await?;
        Ok(read::<ProductsBody>(res).await?.products)
    }

    pub async fn get_product(&self, id: &str) -> anyhow::Result<Product> {
        let res = self
            .client
            .get(self.url_with("product/get/", id)?)
            .send()
            .await?;
        Ok(read::<ProductBody>(res).await?.product)
    }

    pub async fn update_product(&self, req: &UpdateProductRequest) -> anyhow::Result<Product> {
        let res = self
            .client
            .patch(self.url("product/update")?)
            .json(req)
            .send()
            .await?;
        Ok(read::<ProductBody>(res).await?.product)
    }

    pub async fn delete_product(&self, id: &str) -> anyhow::Result<()> {
        let res = self
            .client
            .delete(self.url_with("product/delete/", id)?)
            .send()
            .await?;
        check(res).await?;
        Ok(())
    }

    pub async fn create_user(&self, req: &CreateUserRequest) -> anyhow::Result<User> {
        let res = self
            .client
            .post(self.url("user/create")?)
            .json(req)
            .send()
            .await?;
        Ok(read::<UserBody>(res).await?.user)
    }

    pub async fn list_users(&self) -> anyhow::Result<Vec<User>> {
        let res = self.client.get(self.url("user/all")?).send().await?;
        Ok(read::<UsersBody>(res).await?.users)
    }

    pub async fn get_user(&self, id: &str) -> anyhow::Result<User> {
        let res = self
            .client
            .get(self.url_with("user/get/", id)?)
            .send()
            .await?;
        Ok(read::<UserBody>(res).await?.user)
    }

    /// Every user whose first name matches exactly.
    pub async fn find_users_by_name(&self, first_name: &str) -> anyhow::Result<Vec<User>> {
        let res = self
            .client
            .post(self.url_with("user/get/", first_name)?)
            .send()
            .await?;
        Ok(read::<UsersBody>(res).await?.users)
    }

    pub async fn update_user(&self, req: &UpdateUserRequest) -> anyhow::Result<User> {
        let res = self
            .client
            .patch(self.url("user/update")?)
            .json(req)
            .send()
            .await?;
        Ok(read::<UserBody>(res).await?.user)
    }

    pub async fn delete_user(&self, id: &str) -> anyhow::Result<()> {
        let res = self
            .client
            .delete(self.url_with("user/delete/", id)?)
            .send()
            .await?;
        check(res).await?;
        Ok(())
    }

    pub async fn place_order(&self, req: &PlaceOrderRequest) -> anyhow::Result<Order> {
        let res = self
            .client
            .post(self.url("user/create-order")?)
            .json(req)
            .send()
            .await?;
        Ok(read::<OrderBody>(res).await?.order)
    }

    pub async fn get_order(&self, id: &str) -> anyhow::Result<Order> {
        let res = self
            .client
            .get(self.url_with("order/get/", id)?)
            .send()
            .await?;
        Ok(read::<OrderBody>(res).await?.order)
    }

    pub async fn list_user_orders(&self, user_id: &str) -> anyhow::Result<Vec<Order>> {
        let res = self
            .client
            .get(self.url_with("user/orders/", user_id)?)
            .send()
            .await?;
        Ok(read::<OrdersBody>(res).await?.orders)
    }
}

impl ShopClientBuilder {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_header(
        mut self,
        key: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> anyhow::Result<Self> {
        let header_name =
            HeaderName::from_bytes(key.as_ref().as_bytes()).context("invalid header name")?;
        let header_value = HeaderValue::from_str(value.as_ref()).context("invalid header value")?;
        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    pub fn with_reqwest_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> anyhow::Result<ShopClient> {
        if let Some(client) = self.client {
            return Ok(ShopClient {
                base: self.base,
                client,
            });
        }

        let mut builder = reqwest::Client::builder();
        if !self.headers.is_empty() {
            builder = builder.default_headers(self.headers);
        }
        if let Some(t) = self.timeout {
            builder = builder.timeout(t);
        }
        let client = builder.build()?;
        Ok(ShopClient {
            base: self.base,
            client,
        })
    }
}
