//! Request-scoped customer identity.
//!
//! Authentication itself lives upstream (the storefront's auth layer terminates sessions and
//! injects the customer id into the `x-customer-id` header before requests reach this service).
//! This module only extracts that identity; a request without it is rejected as unauthenticated.

use std::future::{ready, Ready};

use actix_web::{dev::Payload, FromRequest, HttpRequest};

use crate::errors::ServerError;

pub const CUSTOMER_ID_HEADER: &str = "x-customer-id";

#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedCustomer {
    pub customer_id: i64,
}

impl FromRequest for AuthenticatedCustomer {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let customer_id = req
            .headers()
            .get(CUSTOMER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<i64>().ok());
        ready(customer_id.map(|customer_id| Self { customer_id }).ok_or(ServerError::Unauthenticated))
    }
}
