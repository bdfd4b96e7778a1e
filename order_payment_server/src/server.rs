use std::{sync::Arc, time::Duration};

use actix_web::{http::KeepAlive, middleware::Logger, web, App, HttpServer};
use actix_web::dev::Server;
use gateway_tools::GatewayApi;
use log::info;
use order_payment_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    OrderFlowApi,
    SqliteDatabase,
};

use crate::{
    config::{ServerConfig, WebhookAuth},
    errors::ServerError,
    integrations::notifications::{paid_notification_hook, LoggingDispatcher},
    routes::{
        health,
        CancelOrderRoute,
        CheckoutRoute,
        MyOrdersRoute,
        OrderByNumberRoute,
        OrderStatusRoute,
        PaymentTokenRoute,
    },
    webhook_routes::PaymentWebhookRoute,
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let gateway = GatewayApi::new(config.gateway.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;

    // Wire the confirmation-notification worker onto the order-paid hook before any request can
    // produce an event.
    let dispatcher = Arc::new(LoggingDispatcher);
    let mut hooks = EventHooks::default();
    hooks.on_order_paid = Some(paid_notification_hook(dispatcher, db.clone(), config.notifications.clone()));
    let handlers = EventHandlers::new(128, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;
    info!("📬️ Notification worker started");

    let srv = create_server_instance(config, db, gateway, producers)?;
    srv.await.map_err(|e| ServerError::InitializeError(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: GatewayApi,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let webhook_auth = WebhookAuth::new(config.gateway.server_key.clone(), config.webhook_signature_checks);
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone(), producers.clone());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("ops::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(gateway.clone()))
            .app_data(web::Data::new(webhook_auth.clone()));
        // The gateway's notification endpoint. Unauthenticated by design; the signature check in
        // the handler is the authenticity gate.
        let gateway_scope =
            web::scope("/gateway").service(PaymentWebhookRoute::<SqliteDatabase>::new());
        // Customer-scoped storefront endpoints; the upstream auth layer injects the caller's id.
        let api_scope = web::scope("/api")
            .service(CheckoutRoute::<SqliteDatabase, GatewayApi>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(OrderStatusRoute::<SqliteDatabase, GatewayApi>::new())
            .service(PaymentTokenRoute::<SqliteDatabase, GatewayApi>::new())
            .service(CancelOrderRoute::<SqliteDatabase, GatewayApi>::new())
            .service(OrderByNumberRoute::<SqliteDatabase>::new());
        app.service(health).service(gateway_scope).service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
