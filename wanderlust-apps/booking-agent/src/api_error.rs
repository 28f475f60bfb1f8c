//!  Wanderlust Booking Agent
//!
//!  Copyright (C) 2026  Mamy Ratsimbazafy
//!
//!  This program is free software: you can redistribute it and/or modify
//!  it under the terms of the GNU Affero General Public License as published by
//!  the Free Software Foundation, either version 3 of the License, or
//!  (at your option) any later version.
//!
//!  This program is distributed in the hope that it will be useful,
//!  but WITHOUT ANY WARRANTY; without even the implied warranty of
//!  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//!  GNU Affero General Public License for more details.
//!
//!  You should have received a copy of the GNU Affero General Public License
//!  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! HTTP error taxonomy and its JSON rendering

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::booking_flow::REQUIREMENT_UNAVAILABLE;
use crate::catalog::CatalogError;
use crate::checkout::CheckoutError;
use crate::conversation::ConversationError;
use crate::validation::FieldError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request ({} field error(s))", .0.len())]
    Validation(Vec<FieldError>),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("conversation busy")]
    ConversationBusy,
    #[error("checkout unavailable: {0}")]
    CheckoutUnavailable(#[from] CheckoutError),
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<CatalogError> for ApiError {
    fn from(e: CatalogError) -> Self {
        ApiError::Internal(e.into())
    }
}

impl From<ConversationError> for ApiError {
    fn from(e: ConversationError) -> Self {
        ApiError::Conflict(e.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(vec![FieldError::new("body", rejection.body_text())])
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Validation(errors) => (StatusCode::BAD_REQUEST, json!({ "errors": errors })),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, json!({ "message": self.to_string() })),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, json!({ "message": message })),
            ApiError::ConversationBusy => {
                (StatusCode::CONFLICT, json!({ "message": self.to_string() }))
            }
            ApiError::CheckoutUnavailable(e) => {
                tracing::warn!("Checkout failed: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    json!({ "message": REQUIREMENT_UNAVAILABLE }),
                )
            }
            ApiError::Internal(e) => {
                tracing::error!("Request failed: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "message": "Something went wrong!" }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
