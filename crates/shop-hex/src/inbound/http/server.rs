use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    serve, Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::application::deadline::Deadline;
use crate::application::Services;
use crate::errors::AppError;
use shop_types::domain::order::{Order, PlaceOrderRequest};
use shop_types::domain::product::{CreateProductRequest, Product, UpdateProductRequest};
use shop_types::domain::user::{CreateUserRequest, UpdateUserRequest, User};
use shop_types::ports::ShopRepository;

#[derive(Clone)]
pub struct HttpServerConfig {
    pub port: String,
    /// Applied to every `POST /user/create-order`.
    pub order_timeout: Option<Duration>,
}

pub struct HttpServer<R: ShopRepository> {
    pub state: AppState<R>,
    pub config: HttpServerConfig,
}

pub struct AppState<R: ShopRepository> {
    pub services: Services<R>,
    pub order_timeout: Option<Duration>,
}

impl<R: ShopRepository> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            services: self.services.clone(),
            order_timeout: self.order_timeout,
        }
    }
}

#[derive(Serialize)]
struct ProductBody {
    product: Product,
}

#[derive(Serialize)]
struct ProductsBody {
    products: Vec<Product>,
}

#[derive(Serialize)]
struct UserBody {
    user: User,
}

#[derive(Serialize)]
struct UsersBody {
    users: Vec<User>,
}

#[derive(Serialize)]
struct OrderBody {
    order: Order,
}

#[derive(Serialize)]
struct OrdersBody {
    orders: Vec<Order>,
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::Malformed(rejection.body_text()))
}

impl<R: ShopRepository> HttpServer<R> {
    pub async fn new(services: Services<R>, config: HttpServerConfig) -> anyhow::Result<Self> {
        Ok(Self {
            state: AppState {
                services,
                order_timeout: config.order_timeout,
            },
            config,
        })
    }

    pub fn router(&self) -> Router {
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &axum::extract::Request<_>| {
                let uri = request.uri().to_string();
                let request_id = Uuid::new_v4();
                tracing::info_span!(
                    "http_request",
                    %request_id,
                    method = %request.method(),
                    uri
                )
            })
            .on_request(
                |request: &axum::extract::Request<_>, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        method = %request.method(),
                        uri = %request.uri(),
                        "request"
                    );
                },
            )
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        status = %response.status(),
                        latency_ms = %latency.as_millis(),
                        "response"
                    );
                },
            );

        Router::new()
            .route("/health", get(health))
            .route("/product/create", post(create_product::<R>))
            .route("/product/all", get(list_products::<R>))
            .route("/product/get/{id}", get(get_product::<R>))
            .route("/product/update", patch(update_product::<R>))
            .route("/product/delete/{id}", delete(delete_product::<R>))
            .route("/user/create", post(create_user::<R>))
            .route("/user/all", get(list_users::<R>))
            // GET looks up by id, POST by first name.
            .route(
                "/user/get/{key}",
                get(get_user::<R>).post(find_users_by_name::<R>),
            )
            .route("/user/update", patch(update_user::<R>))
            .route("/user/delete/{id}", delete(delete_user::<R>))
            .route("/user/create-order", post(create_order::<R>))
            .route("/user/orders/{id}", get(list_user_orders::<R>))
            .route("/order/get/{id}", get(get_order::<R>))
            .layer(trace_layer)
            .with_state(self.state.clone())
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let app = self.router();
        let addr: SocketAddr = format!("0.0.0.0:{}", self.config.port).parse()?;
        tracing::info!("starting server on {}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        serve(listener, app.into_make_service()).await?;
        Ok(())
    }
}

async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

async fn create_product<R: ShopRepository>(
    State(state): State<AppState<R>>,
    payload: Result<Json<CreateProductRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ProductBody>), AppError> {
    let product = state
        .services
        .products
        .create_product(json_body(payload)?)
        .await?;
    Ok((StatusCode::CREATED, Json(ProductBody { product })))
}

async fn list_products<R: ShopRepository>(
    State(state): State<AppState<R>>,
) -> Result<Json<ProductsBody>, AppError> {
    let products = state.services.products.list_products().await?;
    Ok(Json(ProductsBody { products }))
}

async fn get_product<R: ShopRepository>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
) -> Result<Json<ProductBody>, AppError> {
    let product = state.services.products.get_product(&id).await?;
    Ok(Json(ProductBody { product }))
}

async fn update_product<R: ShopRepository>(
    State(state): State<AppState<R>>,
    payload: Result<Json<UpdateProductRequest>, JsonRejection>,
) -> Result<Json<ProductBody>, AppError> {
    let product = state
        .services
        .products
        .update_product(json_body(payload)?)
        .await?;
    Ok(Json(ProductBody { product }))
}

async fn delete_product<R: ShopRepository>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.services.products.delete_product(&id).await?;
    Ok(Json(serde_json::json!({})))
}

async fn create_user<R: ShopRepository>(
    State(state): State<AppState<R>>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserBody>), AppError> {
    let user = state
        .services
        .users
        .create_user(json_body(payload)?)
        .await?;
    Ok((StatusCode::CREATED, Json(UserBody { user })))
}

async fn list_users<R: ShopRepository>(
    State(state): State<AppState<R>>,
) -> Result<Json<UsersBody>, AppError> {
    let users = state.services.users.list_users().await?;
    Ok(Json(UsersBody { users }))
}

async fn get_user<R: ShopRepository>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
) -> Result<Json<UserBody>, AppError> {
    let user = state.services.users.get_user(&id).await?;
    Ok(Json(UserBody { user }))
}

async fn find_users_by_name<R: ShopRepository>(
    State(state): State<AppState<R>>,
    Path(name): Path<String>,
) -> Result<Json<UsersBody>, AppError> {
    let users = state.services.users.find_users_by_first_name(&name).await?;
    Ok(Json(UsersBody { users }))
}

async fn update_user<R: ShopRepository>(
    State(state): State<AppState<R>>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<UserBody>, AppError> {
    let user = state
        .services
        .users
        .update_user(json_body(payload)?)
        .await?;
    Ok(Json(UserBody { user }))
}

async fn delete_user<R: ShopRepository>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.services.users.delete_user(&id).await?;
    Ok(Json(serde_json::json!({})))
}

async fn create_order<R: ShopRepository>(
    State(state): State<AppState<R>>,
    payload: Result<Json<PlaceOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderBody>), AppError> {
    let request = json_body(payload)?;
    let orders = state.services.orders.clone();
    let deadline = Deadline::from_timeout(state.order_timeout);
    // Runs detached: dropping the connection must not abandon reserved stock.
    let order = tokio::spawn(async move { orders.place_order(request, &deadline).await })
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("order placement task failed: {e}")))??;
    Ok((StatusCode::CREATED, Json(OrderBody { order })))
}

async fn list_user_orders<R: ShopRepository>(
    State(state): State<AppState<R>>,
    Path(user_id): Path<String>,
) -> Result<Json<OrdersBody>, AppError> {
    let orders = state.services.orders.list_orders_for_user(&user_id).await?;
    Ok(Json(OrdersBody { orders }))
}

async fn get_order<R: ShopRepository>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
) -> Result<Json<OrderBody>, AppError> {
    let order = state.services.orders.get_order(&id).await?;
    Ok(Json(OrderBody { order }))
}
