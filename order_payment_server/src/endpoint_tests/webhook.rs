use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use gateway_tools::helpers::webhook_signature;
use ops_common::Secret;
use order_payment_engine::{
    db_types::{OrderStatus, PaymentStatus},
    events::EventProducers,
    traits::{OrderFlowError, TransitionOutcome},
    OrderFlowApi,
};
use serde_json::json;

use super::{
    helpers::send,
    mocks::{sample_order, MockDb},
};
use crate::{config::WebhookAuth, webhook_routes::PaymentWebhookRoute};

const SERVER_KEY: &str = "SB-server-kf93jf02mfka91j";

fn webhook_payload(transaction_status: &str, signature: &str) -> serde_json::Value {
    json!({
        "order_id": "ON-TESTORDER",
        "transaction_status": transaction_status,
        "fraud_status": null,
        "transaction_id": "txn-0001",
        "payment_type": "bank_transfer",
        "transaction_time": "2024-06-01 12:00:00",
        "status_code": "200",
        "gross_amount": "125000.00",
        "signature_key": signature,
    })
}

fn valid_signature() -> String {
    webhook_signature("ON-TESTORDER", "200", "125000.00", SERVER_KEY)
}

fn configure_with(db: MockDb) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        let api = OrderFlowApi::new(db, EventProducers::default());
        cfg.service(PaymentWebhookRoute::<MockDb>::new())
            .app_data(web::Data::new(api))
            .app_data(web::Data::new(WebhookAuth::new(Secret::new(SERVER_KEY.to_string()), true)));
    }
}

#[actix_web::test]
async fn a_webhook_with_a_bad_signature_is_rejected_and_touches_nothing() {
    let _ = env_logger::try_init();
    // No expectations at all: any read or write through the store would panic the mock.
    let db = MockDb::new();
    let payload = webhook_payload("settlement", "0000deadbeef");
    let req = TestRequest::post().uri("/webhook/payment").set_json(&payload);
    let (status, body) = send(req, configure_with(db)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].as_str().unwrap().contains("signature"));
}

#[actix_web::test]
async fn a_verified_webhook_is_applied_and_acknowledged() {
    let _ = env_logger::try_init();
    let mut db = MockDb::new();
    db.expect_apply_transition().times(1).returning(|_, mapping, _| {
        let mut order = sample_order();
        order.status = mapping.order_status.unwrap();
        order.payment_status = mapping.payment_status;
        Ok(TransitionOutcome { order, changed: true, became_paid: true, inventory_restored: false })
    });
    // became_paid triggers a customer lookup for the notification event.
    db.expect_fetch_customer().returning(|_| Ok(Some(super::mocks::sample_customer())));
    let payload = webhook_payload("settlement", &valid_signature());
    let req = TestRequest::post().uri("/webhook/payment").set_json(&payload);
    let (status, body) = send(req, configure_with(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
}

#[actix_web::test]
async fn an_unknown_order_is_still_acknowledged_with_200() {
    let _ = env_logger::try_init();
    let mut db = MockDb::new();
    db.expect_apply_transition()
        .times(1)
        .returning(|number, _, _| Err(OrderFlowError::OrderNotFound(number.clone())));
    let payload = webhook_payload("settlement", &valid_signature());
    let req = TestRequest::post().uri("/webhook/payment").set_json(&payload);
    let (status, body) = send(req, configure_with(db)).await;
    // The gateway retry contract: delivery is acknowledged, the problem is ours to log.
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(false));
}

#[actix_web::test]
async fn an_unrecognised_status_is_acknowledged_but_not_applied() {
    let _ = env_logger::try_init();
    let db = MockDb::new(); // no expectations: the payload never reaches the store
    let payload = webhook_payload("authorize", &valid_signature());
    let req = TestRequest::post().uri("/webhook/payment").set_json(&payload);
    let (status, body) = send(req, configure_with(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(false));
}

#[actix_web::test]
async fn an_engine_failure_is_masked_behind_a_200() {
    let _ = env_logger::try_init();
    let mut db = MockDb::new();
    db.expect_apply_transition()
        .times(1)
        .returning(|_, _, _| Err(OrderFlowError::DatabaseError("disk I/O error".to_string())));
    let payload = webhook_payload("expire", &valid_signature());
    let req = TestRequest::post().uri("/webhook/payment").set_json(&payload);
    let (status, body) = send(req, configure_with(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(false));
    // The failure detail stays in the log, not in the body the gateway sees.
    assert!(!body["message"].as_str().unwrap().contains("disk"));
}

#[actix_web::test]
async fn a_replayed_webhook_acknowledges_without_side_effects() {
    let _ = env_logger::try_init();
    let mut db = MockDb::new();
    let mut replayed = sample_order();
    replayed.status = OrderStatus::Pending;
    replayed.payment_status = PaymentStatus::Paid;
    db.expect_apply_transition()
        .times(1)
        .returning(move |_, _, _| Ok(TransitionOutcome::unchanged(replayed.clone())));
    let payload = webhook_payload("settlement", &valid_signature());
    let req = TestRequest::post().uri("/webhook/payment").set_json(&payload);
    let (status, body) = send(req, configure_with(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert!(body["message"].as_str().unwrap().contains("already"));
}
