use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use shop_types::domain::validation::ValidationError;
use shop_types::ports::RepoError;
use thiserror::Error;

use crate::application::order_service::PlacementStage;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(#[from] ValidationError),

    #[error("Malformed request: {0}")]
    Malformed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        requested: u32,
        available: u32,
    },

    #[error("Order placement stopped while {stage}: {reason}")]
    Cancelled {
        stage: PlacementStage,
        reason: &'static str,
    },

    #[error("{context}: {source}")]
    Store {
        context: &'static str,
        #[source]
        source: RepoError,
    },

    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Wraps a store failure with the operation that hit it, keeping its kind.
    pub fn from_repo(context: &'static str, err: RepoError) -> Self {
        match err {
            RepoError::NotFound(what) => AppError::NotFound(format!("{context}: {what}")),
            RepoError::Conflict(what) => AppError::Conflict(format!("{context}: {what}")),
            RepoError::InsufficientStock {
                product_id,
                requested,
                available,
            } => AppError::InsufficientStock {
                product_id,
                requested,
                available,
            },
            source @ RepoError::DbError(_) => AppError::Store { context, source },
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::Malformed(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) | AppError::InsufficientStock { .. } => StatusCode::CONFLICT,
            AppError::Cancelled { .. } => StatusCode::REQUEST_TIMEOUT,
            AppError::Store { .. } | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.status();
        let msg = match &self {
            AppError::Store { context, source } => {
                tracing::error!(context = *context, error = %source, "store failure");
                format!("{context} failed")
            }
            AppError::Internal(e) => {
                tracing::error!(error = ?e, "internal failure");
                "internal error".into()
            }
            other => other.to_string(),
        };

        let body = serde_json::to_string(&ErrorBody { error: msg })
            .unwrap_or_else(|_| "{\"error\":\"internal serialization\"}".into());
        (code, [("content-type", "application/json")], body).into_response()
    }
}
