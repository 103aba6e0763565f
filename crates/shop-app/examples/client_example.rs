///  To run :
///  cargo r --example client_example
use std::collections::BTreeSet;

use shop_client::ShopClient;
use shop_hex::application::Services;
use shop_hex::inbound::http::{HttpServer, HttpServerConfig};
use shop_repo::build_repo;
use shop_types::domain::order::{LineItemRequest, PlaceOrderRequest};
use shop_types::domain::product::CreateProductRequest;
use shop_types::domain::user::CreateUserRequest;
use tempfile::tempdir;

fn find_free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let port = find_free_port();
    let addr = format!("http://127.0.0.1:{port}/");

    // Use a temp file-backed SQLite DB so multiple connections see the same data.
    let tmp = tempdir()?;
    let db_path = tmp.path().join("shop.db");
    let db_url = format!("sqlite://{}", db_path.display());

    let repo = build_repo(Some(&db_url)).await?;
    let server = HttpServer::new(
        Services::new(repo),
        HttpServerConfig {
            port: port.to_string(),
            order_timeout: None,
        },
    )
    .await?;

    let handle = tokio::spawn(async move {
        server.run().await.expect("server run");
    });
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let client = ShopClient::new(&addr)?;
    let product = client
        .create_product(&CreateProductRequest {
            id: Some("p1".into()),
            description: "Widget".into(),
            quantity: 5,
            tags: BTreeSet::from(["tools".to_string()]),
            unit_price_cents: 500,
        })
        .await?;
    println!("Created product id={} stock={}", product.id, product.quantity);

    let user = client
        .create_user(&CreateUserRequest {
            first_name: "Example".into(),
            last_name: "User".into(),
            age: 30,
            is_married: false,
            password: "Passw0rd".into(),
        })
        .await?;
    println!("Created user {} ({})", user.full_name, user.id);

    let request = PlaceOrderRequest {
        user_id: user.id.clone(),
        line_items: vec![LineItemRequest {
            product_id: product.id.clone(),
            quantity: 3,
        }],
        timestamp: None,
    };
    let order = client.place_order(&request).await?;
    println!("Placed order id={} total_cents={}", order.id, order.total_cents);

    // Only 2 left: the same request is refused and stock stays put.
    match client.place_order(&request).await {
        Ok(o) => println!("Unexpectedly placed {}", o.id),
        Err(err) => println!("Second order refused: {err}"),
    }
    let after = client.get_product(&product.id).await?;
    println!("Remaining stock={}", after.quantity);
    assert_eq!(after.quantity, 2);

    handle.abort();
    Ok(())
}
