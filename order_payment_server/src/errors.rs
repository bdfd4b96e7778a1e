use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use gateway_tools::GatewayApiError;
use order_payment_engine::OrderFlowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("The request was rejected. {0}")]
    ValidationError(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Webhook signature verification failed.")]
    InvalidSignature,
    #[error("No authenticated customer is attached to this request.")]
    Unauthenticated,
    #[error("Gateway error. {0}")]
    GatewayError(#[from] GatewayApiError),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidSignature => StatusCode::FORBIDDEN,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::GatewayError(e) => match e {
                GatewayApiError::Configuration(_) | GatewayApiError::Initialization(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                },
                GatewayApiError::Validation(_) => StatusCode::BAD_REQUEST,
                // Ambiguous or remote-side failures: the order state is untouched and the caller
                // may retry, so they surface as an upstream failure rather than our own.
                _ => StatusCode::BAD_GATEWAY,
            },
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::EmptyCart
            | OrderFlowError::InsufficientStock { .. }
            | OrderFlowError::CancelNotAllowed(_) => Self::ValidationError(e.to_string()),
            OrderFlowError::OrderNotFound(_) | OrderFlowError::CustomerNotFound(_) => {
                Self::NoRecordFound(e.to_string())
            },
            OrderFlowError::DatabaseError(_) => Self::BackendError(e.to_string()),
        }
    }
}
