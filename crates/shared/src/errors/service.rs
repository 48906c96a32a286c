use crate::errors::{coupon::CouponError, repository::RepositoryError};
use rdkafka::error::KafkaError;
use thiserror::Error;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Repository error: {0}")]
    Repo(#[from] RepositoryError),

    #[error("Validation failed: {0:?}")]
    Validation(Vec<String>),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error(
        "Out of stock for {product_name}: requested={requested}, available={available}"
    )]
    OutOfStock {
        product_id: i32,
        product_name: String,
        requested: i32,
        available: i32,
    },

    #[error(
        "Insufficient stock for {product_name}: requested={requested}, available={available}"
    )]
    InsufficientStock {
        product_id: i32,
        product_name: String,
        requested: i32,
        available: i32,
    },

    #[error("No active cart")]
    NoActiveCart,

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Coupon error: {0}")]
    Coupon(#[from] CouponError),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Kafka error: {0}")]
    Kafka(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Custom error: {0}")]
    Custom(String),
}

impl From<KafkaError> for ServiceError {
    fn from(error: KafkaError) -> Self {
        ServiceError::Kafka(error.to_string())
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => format!("{field}: {msg}"),
                    None => format!("{field}: {}", e.code),
                })
            })
            .collect();
        messages.sort();
        ServiceError::Validation(messages)
    }
}

impl ServiceError {
    /// Stable machine-readable identifier for the error, used by transport
    /// collaborators to pick a status code.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Repo(RepositoryError::NotFound) | ServiceError::NotFound(_) => {
                "not_found"
            }
            ServiceError::Repo(RepositoryError::AlreadyExists(_)) => "already_exists",
            ServiceError::Repo(RepositoryError::LockTimeout(_)) => "timeout",
            ServiceError::Repo(_) => "storage",
            ServiceError::Validation(_) => "validation",
            ServiceError::InvalidState(_) => "invalid_state",
            ServiceError::OutOfStock { .. } => "out_of_stock",
            ServiceError::InsufficientStock { .. } => "insufficient_stock",
            ServiceError::NoActiveCart => "no_active_cart",
            ServiceError::EmptyCart => "empty_cart",
            ServiceError::Coupon(err) => err.kind(),
            ServiceError::Timeout(_) => "timeout",
            ServiceError::Kafka(_) => "unavailable",
            ServiceError::Internal(_) | ServiceError::Custom(_) => "internal",
        }
    }
}
