use crate::errors::ServiceError;
use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};
use utoipa::ToSchema;

/// Confirmation body used by every mutating endpoint
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse<T> {
    #[schema(example = "Production entry created successfully")]
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
}

impl<T> MessageResponse<T> {
    pub fn with_result(message: impl Into<String>, result: T) -> Self {
        Self {
            message: message.into(),
            result: Some(result),
        }
    }
}

impl MessageResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            result: None,
        }
    }
}

/// JSON body extractor whose rejections use the service error format
#[derive(Debug, Clone, Copy, Default)]
pub struct Payload<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Payload(value)),
            Err(rejection) => Err(ServiceError::invalid_input(rejection.body_text())),
        }
    }
}

/// Parses a positive integer identifier taken from a path or query string
pub fn parse_id(name: &str, raw: &str) -> Result<i32, ServiceError> {
    raw.trim()
        .parse::<i32>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ServiceError::invalid_input(format!("{name} must be a positive integer")))
}
