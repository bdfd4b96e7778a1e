use actix_web::{http::StatusCode, test, test::TestRequest, web::ServiceConfig, App, HttpResponse};
use serde_json::Value;

use crate::auth::CUSTOMER_ID_HEADER;

/// Builds an app from `configure`, sends the request, and returns the status plus the parsed JSON
/// body (or `Value::Null` for an empty/non-JSON body). Errors surfaced at the service level are
/// rendered through their `ResponseError` impl, the same way the real server answers them.
pub async fn send<F>(req: TestRequest, configure: F) -> (StatusCode, Value)
where F: FnOnce(&mut ServiceConfig) {
    let app = test::init_service(App::new().configure(configure)).await;
    match test::try_call_service(&app, req.to_request()).await {
        Ok(response) => {
            let status = response.status();
            let body = test::read_body(response).await;
            (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
        },
        Err(e) => {
            let response = HttpResponse::from_error(e);
            let status = response.status();
            let body = actix_web::body::to_bytes(response.into_body()).await.unwrap_or_default();
            (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
        },
    }
}

pub fn get_as_customer(customer_id: i64, path: &str) -> TestRequest {
    TestRequest::get().uri(path).insert_header((CUSTOMER_ID_HEADER, customer_id.to_string()))
}

pub fn post_as_customer(customer_id: i64, path: &str) -> TestRequest {
    TestRequest::post().uri(path).insert_header((CUSTOMER_ID_HEADER, customer_id.to_string()))
}
