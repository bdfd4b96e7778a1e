use chrono::{TimeZone, Utc};
use gateway_tools::{
    ChargeRequest,
    ChargeResponse,
    GatewayApiError,
    PaymentGateway,
    TransactionStatusResponse,
};
use mockall::mock;
use ops_common::Money;
use order_payment_engine::{
    db_types::{Customer, NewOrderRequest, Order, OrderItem, OrderNumber, OrderStatus, PaymentStatus, Product},
    reconciliation::{GatewayUpdate, StatusMapping},
    traits::{OrderFlowDatabase, OrderFlowError, OrderManagement, TransitionOutcome},
};

mock! {
    pub Db {}
    impl OrderManagement for Db {
        async fn fetch_order_by_number(&self, order_number: &OrderNumber) -> Result<Option<Order>, OrderFlowError>;
        async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, OrderFlowError>;
        async fn fetch_orders_for_customer(&self, customer_id: i64) -> Result<Vec<Order>, OrderFlowError>;
        async fn fetch_customer(&self, customer_id: i64) -> Result<Option<Customer>, OrderFlowError>;
        async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, OrderFlowError>;
    }
    impl OrderFlowDatabase for Db {
        fn url(&self) -> &str;
        async fn create_order_from_cart(&self, req: NewOrderRequest) -> Result<(Order, Vec<OrderItem>), OrderFlowError>;
        async fn save_gateway_token(&self, order_number: &OrderNumber, token: &str, redirect_url: &str) -> Result<Order, OrderFlowError>;
        async fn apply_transition(&self, order_number: &OrderNumber, mapping: StatusMapping, update: &GatewayUpdate) -> Result<TransitionOutcome, OrderFlowError>;
        async fn cancel_pending_order(&self, order_number: &OrderNumber, customer_id: i64) -> Result<TransitionOutcome, OrderFlowError>;
        async fn record_notification_failure(&self, order_id: i64, reason: &str) -> Result<(), OrderFlowError>;
    }
}

mock! {
    pub Gateway {}
    impl PaymentGateway for Gateway {
        async fn create_transaction(&self, charge: &ChargeRequest) -> Result<ChargeResponse, GatewayApiError>;
        async fn get_transaction_status(&self, order_id: &str) -> Result<Option<TransactionStatusResponse>, GatewayApiError>;
        async fn cancel_transaction(&self, order_id: &str) -> Result<(), GatewayApiError>;
    }
}

/// A pending, unpaid order owned by customer #1.
pub fn sample_order() -> Order {
    Order {
        id: 1,
        order_number: OrderNumber("ON-TESTORDER".into()),
        customer_id: 1,
        status: OrderStatus::Pending,
        payment_status: PaymentStatus::Pending,
        total_amount: Money::from(125_000),
        shipping_fee: Money::from(15_000),
        recipient: "Alice Tan".to_string(),
        phone: "+62-811-0000-001".to_string(),
        address: "1 Orchard Lane".to_string(),
        city: "Jakarta".to_string(),
        postal_code: "10110".to_string(),
        payment_method: Some("gateway".to_string()),
        payment_type: None,
        transaction_id: None,
        gateway_token: None,
        redirect_url: None,
        paid_at: None,
        created_at: Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap(),
    }
}

pub fn sample_items() -> Vec<OrderItem> {
    vec![
        OrderItem {
            id: 1,
            order_id: 1,
            product_id: 11,
            product_name: "Mechanical keyboard".to_string(),
            unit_price: Money::from(50_000),
            quantity: 1,
            subtotal: Money::from(50_000),
        },
        OrderItem {
            id: 2,
            order_id: 1,
            product_id: 12,
            product_name: "Wireless mouse".to_string(),
            unit_price: Money::from(30_000),
            quantity: 2,
            subtotal: Money::from(60_000),
        },
    ]
}

pub fn sample_customer() -> Customer {
    Customer {
        id: 1,
        name: "Alice Tan".to_string(),
        email: "alice@example.com".to_string(),
        phone: "+62-811-0000-001".to_string(),
        address: "1 Orchard Lane".to_string(),
    }
}
