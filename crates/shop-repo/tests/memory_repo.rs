#![cfg(feature = "memory")]

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use shop_repo::memory::InMemoryRepo;
use shop_types::domain::order::Order;
use shop_types::domain::product::{Product, ProductUpdate, Reservation};
use shop_types::domain::user::{User, UserUpdate};
use shop_types::ports::order_repository::OrderRepository;
use shop_types::ports::product_repository::ProductRepository;
use shop_types::ports::user_repository::UserRepository;
use shop_types::ports::RepoError;

fn product(id: &str, quantity: i64) -> Product {
    Product::new(
        id.into(),
        "Widget".into(),
        quantity,
        BTreeSet::from(["tools".to_string()]),
        500,
        Utc::now(),
    )
    .unwrap()
}

fn user(id: &str, first_name: &str) -> User {
    User::new(
        id.into(),
        first_name.into(),
        "Tester".into(),
        30,
        false,
        "Passw0rd".into(),
        Utc::now(),
    )
    .unwrap()
}

#[tokio::test]
async fn memory_repo_product_crud_flow() {
    let repo = InMemoryRepo::new();
    let created = repo.create_product(product("p1", 5)).await.unwrap();
    assert_eq!(created.id, "p1");

    let dup = repo.create_product(product("p1", 9)).await;
    assert_eq!(dup, Err(RepoError::Conflict("p1".into())));

    let fetched = repo.get_product("p1").await.unwrap().unwrap();
    assert_eq!(fetched.quantity, 5);

    let update = ProductUpdate::new(
        "p1".into(),
        "Gadget".into(),
        7,
        BTreeSet::new(),
        650,
        Utc::now(),
    )
    .unwrap();
    assert!(repo.update_product(update).await.unwrap());
    let fetched = repo.get_product("p1").await.unwrap().unwrap();
    assert_eq!(fetched.description, "Gadget");
    assert_eq!(fetched.quantity, 7);
    assert!(fetched.tags.is_empty());
    assert!(fetched.updated_at.is_some());

    assert_eq!(repo.list_products().await.unwrap().len(), 1);
    assert!(repo.delete_product("p1").await.unwrap());
    assert!(repo.get_product("p1").await.unwrap().is_none());
}

#[tokio::test]
async fn memory_repo_handles_missing_rows() {
    let repo = InMemoryRepo::new();
    assert!(repo.get_product("nope").await.unwrap().is_none());
    assert!(!repo.delete_product("nope").await.unwrap());
    assert!(!repo.delete_user("nope").await.unwrap());

    let update = ProductUpdate::new(
        "nope".into(),
        "Gadget".into(),
        1,
        BTreeSet::new(),
        0,
        Utc::now(),
    )
    .unwrap();
    assert!(!repo.update_product(update).await.unwrap());

    let reserve = repo.reserve_stock("nope", 1).await;
    assert!(matches!(reserve, Err(RepoError::NotFound(_))));

    let released = repo
        .release_stock(&Reservation {
            product_id: "nope".into(),
            quantity: 1,
            unit_price_cents: 0,
        })
        .await
        .unwrap();
    assert!(!released);
}

#[tokio::test]
async fn reserve_and_release_stock() {
    let repo = InMemoryRepo::new();
    repo.create_product(product("p1", 5)).await.unwrap();

    let r = repo.reserve_stock("p1", 3).await.unwrap();
    assert_eq!(r.quantity, 3);
    assert_eq!(r.unit_price_cents, 500);
    assert_eq!(repo.get_product("p1").await.unwrap().unwrap().quantity, 2);

    let refused = repo.reserve_stock("p1", 3).await;
    assert_eq!(
        refused,
        Err(RepoError::InsufficientStock {
            product_id: "p1".into(),
            requested: 3,
            available: 2,
        })
    );
    assert_eq!(repo.get_product("p1").await.unwrap().unwrap().quantity, 2);

    assert!(repo.release_stock(&r).await.unwrap());
    assert_eq!(repo.get_product("p1").await.unwrap().unwrap().quantity, 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_reservations_never_oversell() {
    let repo = Arc::new(InMemoryRepo::new());
    repo.create_product(product("hot", 20)).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..64 {
        let repo = repo.clone();
        handles.push(tokio::spawn(async move { repo.reserve_stock("hot", 1).await }));
    }

    let mut granted = 0;
    for h in handles {
        match h.await.unwrap() {
            Ok(r) => granted += r.quantity,
            Err(RepoError::InsufficientStock { .. }) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(granted, 20);
    assert_eq!(repo.get_product("hot").await.unwrap().unwrap().quantity, 0);
}

#[tokio::test]
async fn users_by_first_name_returns_every_match() {
    let repo = InMemoryRepo::new();
    let mut first = user("u1", "Sam");
    first.created_at = Utc::now() - Duration::seconds(10);
    repo.create_user(first).await.unwrap();
    repo.create_user(user("u2", "Sam")).await.unwrap();
    repo.create_user(user("u3", "Alex")).await.unwrap();

    let sams = repo.find_users_by_first_name("Sam").await.unwrap();
    let ids: Vec<&str> = sams.iter().map(|u| u.id.as_str()).collect();
    assert_eq!(ids, vec!["u1", "u2"]);
    assert!(repo.find_users_by_first_name("Kim").await.unwrap().is_empty());

    let update = UserUpdate::new(
        "u3".into(),
        "Sam".into(),
        "Other".into(),
        44,
        true,
        "Passw0rd2".into(),
        Utc::now(),
    )
    .unwrap();
    assert!(repo.update_user(update).await.unwrap());
    let u3 = repo.get_user("u3").await.unwrap().unwrap();
    assert_eq!(u3.full_name, "Sam Other");
    assert_eq!(repo.find_users_by_first_name("Sam").await.unwrap().len(), 3);
}

#[tokio::test]
async fn ledger_is_append_only_and_survives_product_delete() {
    let repo = InMemoryRepo::new();
    repo.create_product(product("p1", 5)).await.unwrap();
    let r = repo.reserve_stock("p1", 2).await.unwrap();
    let order = Order::from_reservations("o1".into(), "u1".into(), &[r], Utc::now()).unwrap();

    repo.append_order(order.clone()).await.unwrap();
    let again = repo.append_order(order.clone()).await;
    assert_eq!(again, Err(RepoError::Conflict("o1".into())));

    assert!(repo.delete_product("p1").await.unwrap());
    let stored = repo.get_order("o1").await.unwrap().unwrap();
    assert_eq!(stored, order);
    assert_eq!(repo.list_orders_for_user("u1").await.unwrap().len(), 1);
    assert!(repo.list_orders_for_user("u2").await.unwrap().is_empty());
}
