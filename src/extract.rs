use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::error::AppError;

pub const INVALID_BODY: &str = "Invalid request body.";

/// JSON request body. A missing, `null` or syntactically broken payload reads as `{}`;
/// well-formed JSON whose fields have the wrong type is rejected with 400.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|e| {
            warn!(error = %e, "request body unreadable");
            AppError::validation(INVALID_BODY)
        })?;
        decode(&bytes).map(JsonBody)
    }
}

fn decode<T>(bytes: &[u8]) -> Result<T, AppError>
where
    T: DeserializeOwned + Default,
{
    let value = match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Null) | Err(_) => return Ok(T::default()),
        Ok(v) => v,
    };
    serde_json::from_value(value).map_err(|e| {
        warn!(error = %e, "request body rejected");
        AppError::validation(INVALID_BODY)
    })
}
