use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use gateway_tools::{ChargeResponse, TransactionStatusResponse};
use order_payment_engine::{
    db_types::{OrderStatus, PaymentStatus},
    events::EventProducers,
    traits::TransitionOutcome,
    OrderFlowApi,
};
use serde_json::json;

use super::{
    helpers::{get_as_customer, post_as_customer, send},
    mocks::{sample_customer, sample_items, sample_order, MockDb, MockGateway},
};
use crate::routes::{CancelOrderRoute, CheckoutRoute, MyOrdersRoute, OrderStatusRoute, PaymentTokenRoute};

fn configure_with(db: MockDb, gateway: MockGateway) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        let api = OrderFlowApi::new(db, EventProducers::default());
        cfg.service(CheckoutRoute::<MockDb, MockGateway>::new())
            .service(MyOrdersRoute::<MockDb>::new())
            .service(OrderStatusRoute::<MockDb, MockGateway>::new())
            .service(PaymentTokenRoute::<MockDb, MockGateway>::new())
            .service(CancelOrderRoute::<MockDb, MockGateway>::new())
            .app_data(web::Data::new(api))
            .app_data(web::Data::new(gateway));
    }
}

fn checkout_body() -> serde_json::Value {
    json!({
        "shipping": {
            "recipient": "Alice Tan",
            "phone": "+62-811-0000-001",
            "address": "1 Orchard Lane",
            "city": "Jakarta",
            "postal_code": "10110"
        },
        "shipping_fee": 15_000,
        "payment_method": "gateway"
    })
}

fn status_payload(transaction_status: &str) -> TransactionStatusResponse {
    TransactionStatusResponse {
        order_id: "ON-TESTORDER".to_string(),
        transaction_status: transaction_status.to_string(),
        fraud_status: None,
        transaction_id: Some("txn-0001".to_string()),
        payment_type: Some("bank_transfer".to_string()),
        transaction_time: Some("2024-06-01 12:00:00".to_string()),
        status_code: "200".to_string(),
        gross_amount: Some("125000.00".to_string()),
    }
}

#[actix_web::test]
async fn checkout_places_the_order_and_returns_a_payment_session() {
    let _ = env_logger::try_init();
    let mut db = MockDb::new();
    db.expect_fetch_customer().returning(|_| Ok(Some(sample_customer())));
    db.expect_create_order_from_cart()
        .withf(|req| req.customer_id == 1 && req.shipping.city == "Jakarta")
        .times(1)
        .returning(|_| Ok((sample_order(), sample_items())));
    db.expect_fetch_order_items().returning(|_| Ok(sample_items()));
    db.expect_save_gateway_token().times(1).returning(|_, token, redirect| {
        let mut order = sample_order();
        order.gateway_token = Some(token.to_string());
        order.redirect_url = Some(redirect.to_string());
        Ok(order)
    });
    let mut gateway = MockGateway::new();
    gateway.expect_create_transaction().times(1).returning(|_| {
        Ok(ChargeResponse {
            token: "tok-new".to_string(),
            redirect_url: "https://pay.example.com/tok-new".to_string(),
        })
    });
    let req = post_as_customer(1, "/checkout").set_json(checkout_body());
    let (status, body) = send(req, configure_with(db, gateway)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order"]["order_number"], json!("ON-TESTORDER"));
    assert_eq!(body["payment"]["token"], json!("tok-new"));
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
}

#[actix_web::test]
async fn a_gateway_failure_after_checkout_leaves_the_order_standing() {
    let _ = env_logger::try_init();
    let mut db = MockDb::new();
    db.expect_fetch_customer().returning(|_| Ok(Some(sample_customer())));
    db.expect_create_order_from_cart().times(1).returning(|_| Ok((sample_order(), sample_items())));
    db.expect_fetch_order_items().returning(|_| Ok(sample_items()));
    // The ambiguous failure must not persist a token it never received.
    db.expect_save_gateway_token().never();
    let mut gateway = MockGateway::new();
    gateway.expect_create_transaction().times(1).returning(|_| {
        Err(gateway_tools::GatewayApiError::Timeout("deadline exceeded".to_string()))
    });
    let req = post_as_customer(1, "/checkout").set_json(checkout_body());
    let (status, body) = send(req, configure_with(db, gateway)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order"]["order_number"], json!("ON-TESTORDER"));
    assert_eq!(body["payment"], json!(null));
    assert!(body["payment_error"].as_str().unwrap().contains("Timed out"));
}

#[actix_web::test]
async fn requests_without_a_customer_identity_are_unauthorised() {
    let _ = env_logger::try_init();
    let db = MockDb::new();
    let gateway = MockGateway::new();
    let req = TestRequest::get().uri("/orders");
    let (status, body) = send(req, configure_with(db, gateway)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].as_str().unwrap().contains("authenticated"));
}

#[actix_web::test]
async fn my_orders_lists_only_the_callers_orders() {
    let _ = env_logger::try_init();
    let mut db = MockDb::new();
    db.expect_fetch_orders_for_customer()
        .withf(|customer_id| *customer_id == 1)
        .returning(|_| Ok(vec![sample_order()]));
    let gateway = MockGateway::new();
    let (status, body) = send(get_as_customer(1, "/orders"), configure_with(db, gateway)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["order_number"], json!("ON-TESTORDER"));
}

#[actix_web::test]
async fn a_status_check_without_a_gateway_token_makes_no_remote_call() {
    let _ = env_logger::try_init();
    let mut db = MockDb::new();
    db.expect_fetch_order_by_number().returning(|_| Ok(Some(sample_order())));
    db.expect_fetch_order_items().returning(|_| Ok(sample_items()));
    let mut gateway = MockGateway::new();
    gateway.expect_get_transaction_status().never();
    let (status, body) =
        send(get_as_customer(1, "/orders/ON-TESTORDER/status"), configure_with(db, gateway)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["remote_status"], json!(null));
    assert_eq!(body["order"]["payment_status"], json!("pending"));
}

#[actix_web::test]
async fn a_status_check_reconciles_the_polled_result() {
    let _ = env_logger::try_init();
    let mut db = MockDb::new();
    let mut order = sample_order();
    order.gateway_token = Some("tok-123".to_string());
    order.redirect_url = Some("https://pay.example.com/tok-123".to_string());
    db.expect_fetch_order_by_number().returning(move |_| Ok(Some(order.clone())));
    db.expect_apply_transition().times(1).returning(|_, mapping, _| {
        let mut order = sample_order();
        order.status = mapping.order_status.unwrap();
        order.payment_status = mapping.payment_status;
        Ok(TransitionOutcome { order, changed: true, became_paid: true, inventory_restored: false })
    });
    db.expect_fetch_customer().returning(|_| Ok(Some(sample_customer())));
    db.expect_fetch_order_items().returning(|_| Ok(sample_items()));
    let mut gateway = MockGateway::new();
    gateway
        .expect_get_transaction_status()
        .times(1)
        .returning(|_| Ok(Some(status_payload("settlement"))));
    let (status, body) =
        send(get_as_customer(1, "/orders/ON-TESTORDER/status"), configure_with(db, gateway)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["remote_status"], json!("settlement"));
}

#[actix_web::test]
async fn a_gateway_that_forgot_the_transaction_is_a_no_op() {
    let _ = env_logger::try_init();
    let mut db = MockDb::new();
    let mut order = sample_order();
    order.gateway_token = Some("tok-123".to_string());
    db.expect_fetch_order_by_number().returning(move |_| Ok(Some(order.clone())));
    db.expect_fetch_order_items().returning(|_| Ok(sample_items()));
    let mut gateway = MockGateway::new();
    gateway.expect_get_transaction_status().times(1).returning(|_| Ok(None));
    let (status, body) =
        send(get_as_customer(1, "/orders/ON-TESTORDER/status"), configure_with(db, gateway)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["remote_status"], json!(null));
}

#[actix_web::test]
async fn cancelling_a_processing_order_is_rejected_before_any_remote_call() {
    let _ = env_logger::try_init();
    let mut db = MockDb::new();
    let mut order = sample_order();
    order.status = OrderStatus::Processing;
    order.gateway_token = Some("tok-123".to_string());
    db.expect_fetch_order_by_number().returning(move |_| Ok(Some(order.clone())));
    db.expect_cancel_pending_order().never();
    let mut gateway = MockGateway::new();
    gateway.expect_cancel_transaction().never();
    let (status, body) =
        send(post_as_customer(1, "/orders/ON-TESTORDER/cancel"), configure_with(db, gateway)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("pending"));
}

#[actix_web::test]
async fn cancelling_a_pending_order_survives_a_remote_cancel_failure() {
    let _ = env_logger::try_init();
    let mut db = MockDb::new();
    let mut order = sample_order();
    order.gateway_token = Some("tok-123".to_string());
    db.expect_fetch_order_by_number().returning(move |_| Ok(Some(order.clone())));
    db.expect_cancel_pending_order().times(1).returning(|_, _| {
        let mut order = sample_order();
        order.status = OrderStatus::Cancelled;
        order.payment_status = PaymentStatus::Cancelled;
        Ok(TransitionOutcome { order, changed: true, became_paid: false, inventory_restored: true })
    });
    let mut gateway = MockGateway::new();
    gateway.expect_cancel_transaction().times(1).returning(|_| {
        Err(gateway_tools::GatewayApiError::Timeout("deadline exceeded".to_string()))
    });
    let (status, body) =
        send(post_as_customer(1, "/orders/ON-TESTORDER/cancel"), configure_with(db, gateway)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("cancelled"));
    assert_eq!(body["payment_status"], json!("cancelled"));
}

#[actix_web::test]
async fn the_payment_token_endpoint_is_idempotent_for_orders_with_a_stored_token() {
    let _ = env_logger::try_init();
    let mut db = MockDb::new();
    let mut order = sample_order();
    order.gateway_token = Some("tok-123".to_string());
    order.redirect_url = Some("https://pay.example.com/tok-123".to_string());
    db.expect_fetch_order_by_number().returning(move |_| Ok(Some(order.clone())));
    let mut gateway = MockGateway::new();
    gateway.expect_create_transaction().never();
    let (status, body) =
        send(post_as_customer(1, "/orders/ON-TESTORDER/payment-token"), configure_with(db, gateway)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token"], json!("tok-123"));
    assert_eq!(body["redirect_url"], json!("https://pay.example.com/tok-123"));
}

#[actix_web::test]
async fn the_payment_token_endpoint_creates_and_persists_a_session_once() {
    let _ = env_logger::try_init();
    let mut db = MockDb::new();
    db.expect_fetch_order_by_number().returning(|_| Ok(Some(sample_order())));
    db.expect_fetch_customer().returning(|_| Ok(Some(sample_customer())));
    db.expect_fetch_order_items().returning(|_| Ok(sample_items()));
    db.expect_save_gateway_token()
        .withf(|_, token, redirect| token == "tok-fresh" && redirect.contains("tok-fresh"))
        .times(1)
        .returning(|_, token, redirect| {
            let mut order = sample_order();
            order.gateway_token = Some(token.to_string());
            order.redirect_url = Some(redirect.to_string());
            Ok(order)
        });
    let mut gateway = MockGateway::new();
    gateway.expect_create_transaction().times(1).returning(|charge| {
        // 50,000 + 2 x 30,000 in items plus a 15,000 shipping line.
        assert_eq!(charge.transaction_details.gross_amount, 125_000);
        assert_eq!(charge.line_item_sum(), 125_000);
        assert_eq!(charge.item_details.len(), 3);
        Ok(ChargeResponse {
            token: "tok-fresh".to_string(),
            redirect_url: "https://pay.example.com/tok-fresh".to_string(),
        })
    });
    let (status, body) =
        send(post_as_customer(1, "/orders/ON-TESTORDER/payment-token"), configure_with(db, gateway)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token"], json!("tok-fresh"));
}

#[actix_web::test]
async fn another_customers_order_reads_as_not_found() {
    let _ = env_logger::try_init();
    let mut db = MockDb::new();
    db.expect_fetch_order_by_number().returning(|_| Ok(Some(sample_order()))); // owned by customer 1
    let gateway = MockGateway::new();
    let (status, _) =
        send(get_as_customer(2, "/orders/ON-TESTORDER/status"), configure_with(db, gateway)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
