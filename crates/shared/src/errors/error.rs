use crate::errors::service::ServiceError;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub status: String,
    pub code: String,
    pub message: String,
}

impl From<&ServiceError> for ErrorResponse {
    fn from(err: &ServiceError) -> Self {
        ErrorResponse {
            status: "error".into(),
            code: err.kind().into(),
            message: err.to_string(),
        }
    }
}
