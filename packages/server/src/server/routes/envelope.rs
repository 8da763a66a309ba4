//! Response envelope shared by every endpoint:
//! `{ "success", "message"?, "data"?, "errors"? }`

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};

use crate::common::MembershipId;
use crate::domains::membership::{FieldErrors, MembershipError, MembershipResult};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

/// What every handler returns
pub type HandlerResult = Result<Response, MembershipError>;

/// 200 with data
pub fn ok<T: Serialize>(message: impl Into<String>, data: T) -> HandlerResult {
    Ok(reply(StatusCode::OK, message, data))
}

/// 201 with data
pub fn created<T: Serialize>(message: impl Into<String>, data: T) -> HandlerResult {
    Ok(reply(StatusCode::CREATED, message, data))
}

fn reply<T: Serialize>(status: StatusCode, message: impl Into<String>, data: T) -> Response {
    let body = ApiResponse {
        success: true,
        message: Some(message.into()),
        data: Some(data),
        errors: None,
    };
    (status, Json(body)).into_response()
}

/// Failure envelope without going through `MembershipError`
pub fn failure(status: StatusCode, message: impl Into<String>) -> Response {
    let body: ApiResponse<()> = ApiResponse {
        success: false,
        message: Some(message.into()),
        data: None,
        errors: None,
    };
    (status, Json(body)).into_response()
}

/// Unwrap a JSON body, turning malformed input into a validation error
pub fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> MembershipResult<T> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => Err(MembershipError::validation("body", rejection.body_text())),
    }
}

/// Membership id from the URL; a malformed id is a validation error on `id`
pub fn membership_path(path: Result<Path<i64>, PathRejection>) -> MembershipResult<MembershipId> {
    match path {
        Ok(Path(id)) => Ok(MembershipId::new(id)),
        Err(rejection) => Err(MembershipError::validation("id", rejection.body_text())),
    }
}

impl MembershipError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            MembershipError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            MembershipError::Unauthenticated => StatusCode::UNAUTHORIZED,
            MembershipError::Forbidden(_) => StatusCode::FORBIDDEN,
            MembershipError::NotFound(_) => StatusCode::NOT_FOUND,
            MembershipError::Conflict(_)
            | MembershipError::InvalidTransition { .. }
            | MembershipError::AlreadyTerminal(_) => StatusCode::CONFLICT,
            MembershipError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for MembershipError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let (message, errors) = match self {
            MembershipError::Validation(errors) => {
                ("Validation failed".to_string(), Some(errors))
            }
            MembershipError::Internal(e) => {
                error!(error = ?e, "Internal error while handling request");
                ("Something went wrong".to_string(), None)
            }
            other => {
                warn!(status = status.as_u16(), error = %other, "Request failed");
                (other.to_string(), None)
            }
        };

        let body: ApiResponse<()> = ApiResponse {
            success: false,
            message: Some(message),
            data: None,
            errors,
        };
        (status, Json(body)).into_response()
    }
}
