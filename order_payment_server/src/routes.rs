//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module
//! neat and tidy 🙏
//!
//! Handlers are generic over the storage backend and the gateway client, so endpoint tests can
//! exercise them against mocks. Since actix-web cannot register generic handlers directly, each
//! route is declared through the `route!` macro, which generates a concrete
//! `HttpServiceFactory` per instantiation.

use actix_web::{get, web, HttpResponse, Responder};
use gateway_tools::PaymentGateway;
use log::*;
use order_payment_engine::{
    db_types::{NewOrderRequest, Order, OrderNumber, OrderStatus},
    OrderFlowApi,
    OrderFlowDatabase,
    OrderFlowError,
};

use crate::{
    auth::AuthenticatedCustomer,
    data_objects::{CheckoutRequest, CheckoutResponse, StatusResponse},
    errors::ServerError,
    integrations::gateway::{ensure_payment_session, update_from_status_response},
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Checkout  ----------------------------------------------------
route!(checkout => Post "/checkout" impl OrderFlowDatabase, PaymentGateway);
/// Places an order from the caller's cart, then opens a payment session for it.
///
/// The order is committed before the gateway is contacted. If the gateway call fails, the
/// response still carries the created order; `payment` is absent and `payment_error` explains
/// why, and the client retries through the payment-token endpoint. This split keeps an ambiguous
/// gateway failure from ever rolling back (or double-creating) a committed order.
pub async fn checkout<B, G>(
    auth: AuthenticatedCustomer,
    body: web::Json<CheckoutRequest>,
    api: web::Data<OrderFlowApi<B>>,
    gateway: web::Data<G>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderFlowDatabase,
    G: PaymentGateway,
{
    let request = body.into_inner();
    let order_request = NewOrderRequest {
        customer_id: auth.customer_id,
        shipping: request.shipping,
        shipping_fee: request.shipping_fee,
        payment_method: request.payment_method,
    };
    let placed = api.place_order(order_request).await?;
    let (payment, payment_error) = match ensure_payment_session(api.as_ref(), gateway.as_ref(), &placed.order).await
    {
        Ok(session) => (Some(session), None),
        Err(e) => {
            warn!(
                "🛒️ Order {} was placed, but the payment session could not be created: {e}",
                placed.order.order_number
            );
            (None, Some(e.to_string()))
        },
    };
    Ok(HttpResponse::Ok().json(CheckoutResponse { order: placed, payment, payment_error }))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(my_orders => Get "/orders" impl OrderFlowDatabase);
pub async fn my_orders<B>(
    auth: AuthenticatedCustomer,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError>
where B: OrderFlowDatabase {
    trace!("💻️ GET orders for customer #{}", auth.customer_id);
    let orders = api.db().fetch_orders_for_customer(auth.customer_id).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_number => Get "/orders/{order_number}" impl OrderFlowDatabase);
pub async fn order_by_number<B>(
    auth: AuthenticatedCustomer,
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError>
where B: OrderFlowDatabase {
    let order_number = OrderNumber::from(path.into_inner());
    let result = api
        .order_with_items(&order_number)
        .await?
        .filter(|r| r.order.customer_id == auth.customer_id)
        .ok_or_else(|| ServerError::NoRecordFound(format!("order {order_number}")))?;
    Ok(HttpResponse::Ok().json(result))
}

//------------------------------------------   Payment token  -------------------------------------------------
route!(payment_token => Post "/orders/{order_number}/payment-token" impl OrderFlowDatabase, PaymentGateway);
/// Returns the order's payment session, creating the remote transaction only if the order does
/// not already carry a stored token. Safe to call repeatedly — and after an ambiguous checkout
/// failure, this is the retry path.
pub async fn payment_token<B, G>(
    auth: AuthenticatedCustomer,
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B>>,
    gateway: web::Data<G>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderFlowDatabase,
    G: PaymentGateway,
{
    let order_number = OrderNumber::from(path.into_inner());
    let order = fetch_own_order(&api, &order_number, auth.customer_id).await?;
    let session = ensure_payment_session(api.as_ref(), gateway.as_ref(), &order).await?;
    Ok(HttpResponse::Ok().json(session))
}

//------------------------------------------   Status check  --------------------------------------------------
route!(order_status => Get "/orders/{order_number}/status" impl OrderFlowDatabase, PaymentGateway);
/// Returns the order's local state alongside a freshly reconciled remote status.
///
/// This is the pull half of reconciliation: whatever the gateway reports is pushed through the
/// same routine the webhook uses. An order with no gateway token short-circuits — there is
/// nothing remote to reconcile against. A gateway that has forgotten the transaction is a no-op,
/// not an error. An ambiguous gateway failure leaves local state untouched and is reported as
/// remote status unknown.
pub async fn order_status<B, G>(
    auth: AuthenticatedCustomer,
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B>>,
    gateway: web::Data<G>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderFlowDatabase,
    G: PaymentGateway,
{
    let order_number = OrderNumber::from(path.into_inner());
    let order = fetch_own_order(&api, &order_number, auth.customer_id).await?;
    let remote_status = if order.gateway_token.is_none() {
        trace!("🔁️ Order {order_number} has no gateway transaction yet; skipping the remote query");
        None
    } else {
        match gateway.get_transaction_status(order_number.as_str()).await {
            Ok(None) => {
                debug!("🔁️ Gateway has no record of order {order_number}; keeping local state");
                None
            },
            Ok(Some(payload)) => {
                let raw_status = payload.transaction_status.clone();
                match update_from_status_response(&payload) {
                    Ok(update) => {
                        if let Err(e) = api.apply_gateway_update(&order_number, update).await {
                            warn!("🔁️ Could not apply the polled status to order {order_number}: {e}");
                        }
                    },
                    Err(e) => {
                        warn!("🔁️ Unrecognised remote status for order {order_number}: {e}. Local state untouched.");
                    },
                }
                Some(raw_status)
            },
            Err(e) if e.is_ambiguous() => {
                warn!("🔁️ Gateway status query for order {order_number} failed ambiguously: {e}");
                None
            },
            Err(e) => return Err(e.into()),
        }
    };
    let result = api
        .order_with_items(&order_number)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("order {order_number}")))?;
    Ok(HttpResponse::Ok().json(StatusResponse { order: result.order, items: result.items, remote_status }))
}

//--------------------------------------------   Cancellation  ------------------------------------------------
route!(cancel_order => Post "/orders/{order_number}/cancel" impl OrderFlowDatabase, PaymentGateway);
/// Cancels a pending order: best-effort remote cancel, then the guarded local transition with
/// its stock restore. A remote failure is logged and never blocks the local cancellation.
pub async fn cancel_order<B, G>(
    auth: AuthenticatedCustomer,
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B>>,
    gateway: web::Data<G>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderFlowDatabase,
    G: PaymentGateway,
{
    let order_number = OrderNumber::from(path.into_inner());
    let order = fetch_own_order(&api, &order_number, auth.customer_id).await?;
    if order.status != OrderStatus::Pending {
        return Err(OrderFlowError::CancelNotAllowed(order.status).into());
    }
    if order.gateway_token.is_some() {
        if let Err(e) = gateway.cancel_transaction(order_number.as_str()).await {
            warn!(
                "🔄️❌️ Remote cancel for order {order_number} failed: {e}. Continuing with the local cancellation."
            );
        }
    }
    let outcome = api.cancel_order(&order_number, auth.customer_id).await?;
    Ok(HttpResponse::Ok().json(outcome.order))
}

async fn fetch_own_order<B: OrderFlowDatabase>(
    api: &OrderFlowApi<B>,
    order_number: &OrderNumber,
    customer_id: i64,
) -> Result<Order, ServerError> {
    api.db()
        .fetch_order_by_number(order_number)
        .await?
        .filter(|order| order.customer_id == customer_id)
        .ok_or_else(|| ServerError::NoRecordFound(format!("order {order_number}")))
}
