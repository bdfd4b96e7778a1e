pub mod prepare_env;

use ops_common::Money;
use order_payment_engine::{
    db_types::{Customer, NewCustomer, NewOrderRequest, NewProduct, Product, ShippingDetails},
    events::EventProducers,
    OrderFlowApi,
    OrderFlowDatabase,
    SqliteDatabase,
};
use sqlx::{migrate::MigrateDatabase, Sqlite};

use crate::support::prepare_env::{prepare_test_env, random_db_path};

pub async fn setup() -> OrderFlowApi<SqliteDatabase> {
    setup_with_producers(EventProducers::default()).await
}

pub async fn setup_with_producers(producers: EventProducers) -> OrderFlowApi<SqliteDatabase> {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    OrderFlowApi::new(db, producers)
}

pub async fn tear_down(api: OrderFlowApi<SqliteDatabase>) {
    let mut api = api;
    let url = api.db().url().to_string();
    if let Err(e) = api.db_mut().close().await {
        log::error!("🚀️ Failed to close database: {e}");
    }
    Sqlite::drop_database(&url).await.unwrap();
}

/// Seeds the scenario used across the flow tests: one customer, a 50,000 product with 10 in
/// stock and a 30,000 product with 5 in stock.
pub async fn seed_storefront(db: &SqliteDatabase) -> (Customer, Product, Product) {
    let customer = db
        .insert_customer(NewCustomer {
            name: "Alice Tan".to_string(),
            email: "alice@example.com".to_string(),
            phone: "+62-811-0000-001".to_string(),
            address: "1 Orchard Lane".to_string(),
        })
        .await
        .expect("Error seeding customer");
    let keyboard = db
        .insert_product(NewProduct { name: "Mechanical keyboard".to_string(), price: Money::from(50_000), stock: 10 })
        .await
        .expect("Error seeding product");
    let mouse = db
        .insert_product(NewProduct { name: "Wireless mouse".to_string(), price: Money::from(30_000), stock: 5 })
        .await
        .expect("Error seeding product");
    (customer, keyboard, mouse)
}

pub fn order_request(customer_id: i64, shipping_fee: i64) -> NewOrderRequest {
    NewOrderRequest {
        customer_id,
        shipping: ShippingDetails {
            recipient: "Alice Tan".to_string(),
            phone: "+62-811-0000-001".to_string(),
            address: "1 Orchard Lane".to_string(),
            city: "Jakarta".to_string(),
            postal_code: "10110".to_string(),
        },
        shipping_fee: Money::from(shipping_fee),
        payment_method: Some("gateway".to_string()),
    }
}
