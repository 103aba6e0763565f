use std::collections::BTreeSet;

use serde::Deserialize;
use shop_hex::application::Services;
use shop_hex::inbound::http::{HttpServer, HttpServerConfig};
use shop_repo::build_repo;
use shop_types::domain::order::{LineItemRequest, Order, PlaceOrderRequest};
use shop_types::domain::product::{CreateProductRequest, Product, UpdateProductRequest};
use shop_types::domain::user::{CreateUserRequest, User};

fn find_free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

#[derive(Deserialize)]
struct ProductBody {
    product: Product,
}

#[derive(Deserialize)]
struct ProductsBody {
    products: Vec<Product>,
}

#[derive(Deserialize)]
struct UserBody {
    user: User,
}

#[derive(Deserialize)]
struct UsersBody {
    users: Vec<User>,
}

#[derive(Deserialize)]
struct OrderBody {
    order: Order,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

async fn spawn_server() -> (String, tokio::task::JoinHandle<()>) {
    let port = find_free_port();
    let config = HttpServerConfig {
        port: port.to_string(),
        order_timeout: None,
    };
    let repo = build_repo(None).await.expect("build repo");
    let server = HttpServer::new(Services::new(repo), config).await.unwrap();
    let handle = tokio::spawn(async move {
        server.run().await.expect("server run");
    });

    // Give the server a moment to start.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    (format!("http://127.0.0.1:{}", port), handle)
}

#[tokio::test]
async fn product_crud_over_http() {
    let (addr, handle) = spawn_server().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/product/create", addr))
        .json(&CreateProductRequest {
            id: Some("p1".into()),
            description: "Widget".into(),
            quantity: 5,
            tags: BTreeSet::from(["tools".to_string()]),
            unit_price_cents: 500,
        })
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::CREATED);
    let created: ProductBody = res.json().await.unwrap();
    assert_eq!(created.product.id, "p1");

    let fetched: ProductBody = client
        .get(format!("{}/product/get/p1", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched.product.quantity, 5);

    let res = client
        .patch(format!("{}/product/update", addr))
        .json(&UpdateProductRequest {
            id: "p1".into(),
            description: "Gadget".into(),
            quantity: 9,
            tags: BTreeSet::new(),
            unit_price_cents: 650,
        })
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::OK);
    let updated: ProductBody = res.json().await.unwrap();
    assert_eq!(updated.product.description, "Gadget");

    let list: ProductsBody = client
        .get(format!("{}/product/all", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list.products.len(), 1);

    let res = client
        .delete(format!("{}/product/delete/p1", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::OK);

    let res = client
        .get(format!("{}/product/get/p1", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::NOT_FOUND);

    handle.abort();
}

#[tokio::test]
async fn users_and_order_placement_over_http() {
    let (addr, handle) = spawn_server().await;
    let client = reqwest::Client::new();

    client
        .post(format!("{}/product/create", addr))
        .json(&CreateProductRequest {
            id: Some("p1".into()),
            description: "Widget".into(),
            quantity: 5,
            tags: BTreeSet::new(),
            unit_price_cents: 200,
        })
        .send()
        .await
        .unwrap()
        .error_for_status()
        .unwrap();

    let res = client
        .post(format!("{}/user/create", addr))
        .json(&CreateUserRequest {
            first_name: "Http".into(),
            last_name: "User".into(),
            age: 18,
            is_married: false,
            password: "Passw0rd".into(),
        })
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::CREATED);
    let user = res.json::<UserBody>().await.unwrap().user;
    assert_eq!(user.full_name, "Http User");

    let by_id: UserBody = client
        .get(format!("{}/user/get/{}", addr, user.id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(by_id.user.id, user.id);

    let by_name: UsersBody = client
        .post(format!("{}/user/get/Http", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(by_name.users.len(), 1);

    let place = PlaceOrderRequest {
        user_id: user.id.clone(),
        line_items: vec![LineItemRequest {
            product_id: "p1".into(),
            quantity: 3,
        }],
        timestamp: None,
    };
    let res = client
        .post(format!("{}/user/create-order", addr))
        .json(&place)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::CREATED);
    let order = res.json::<OrderBody>().await.unwrap().order;
    assert_eq!(order.total_cents, 600);

    let res = client
        .post(format!("{}/user/create-order", addr))
        .json(&place)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::CONFLICT);
    let err: ErrorBody = res.json().await.unwrap();
    assert!(err.error.contains("Insufficient stock"));

    let stored: OrderBody = client
        .get(format!("{}/order/get/{}", addr, order.id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stored.order, order);

    let res = client
        .delete(format!("{}/user/delete/{}", addr, user.id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::OK);

    handle.abort();
}

#[tokio::test]
async fn bad_request_and_not_found_paths() {
    let (addr, handle) = spawn_server().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/user/create", addr))
        .json(&CreateUserRequest {
            first_name: "Young".into(),
            last_name: "User".into(),
            age: 17,
            is_married: false,
            password: "Passw0rd".into(),
        })
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);
    let err: ErrorBody = res.json().await.unwrap();
    assert!(!err.error.is_empty());

    let res = client
        .post(format!("{}/product/create", addr))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);

    let res = client
        .post(format!("{}/user/create-order", addr))
        .json(&PlaceOrderRequest {
            user_id: "nobody".into(),
            line_items: vec![LineItemRequest {
                product_id: "p1".into(),
                quantity: 1,
            }],
            timestamp: None,
        })
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::NOT_FOUND);

    let res = client
        .get(format!("{}/user/get/missing", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::NOT_FOUND);

    handle.abort();
}
