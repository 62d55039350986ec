use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::store::StoreError;

/// Taxonomía de errores del servicio. Cada operación pública envuelve las
/// fallas de los colaboradores en una de estas variantes; las variantes ya
/// tipadas se propagan sin re-envolver.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidCredential(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    RoleMismatch(String),
    #[error("{0}")]
    CapacityExceeded(String),
    #[error("{0}")]
    DuplicateEmail(String),
    #[error("{0}")]
    InvalidToken(String),
    #[error("{0}")]
    IdentityCreationFailed(String),
    #[error("error de persistencia: {0}")]
    Persistence(String),
    #[error("{0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Persistence(err.to_string())
    }
}

pub mod error_codes {
    pub const SUCCESS: i32 = 0;
    pub const INVALID_CREDENTIAL: i32 = 1001;
    pub const NOT_FOUND: i32 = 1002;
    pub const ROLE_MISMATCH: i32 = 1003;
    pub const CAPACITY_EXCEEDED: i32 = 1004;
    pub const DUPLICATE_EMAIL: i32 = 1005;
    pub const INVALID_TOKEN: i32 = 1006;
    pub const IDENTITY_CREATION_FAILED: i32 = 1007;
    pub const PERSISTENCE_ERROR: i32 = 1008;
    pub const INTERNAL_ERROR: i32 = 1100;
}

impl AppError {
    pub fn code(&self) -> i32 {
        match self {
            AppError::InvalidCredential(_) => error_codes::INVALID_CREDENTIAL,
            AppError::NotFound(_) => error_codes::NOT_FOUND,
            AppError::RoleMismatch(_) => error_codes::ROLE_MISMATCH,
            AppError::CapacityExceeded(_) => error_codes::CAPACITY_EXCEEDED,
            AppError::DuplicateEmail(_) => error_codes::DUPLICATE_EMAIL,
            AppError::InvalidToken(_) => error_codes::INVALID_TOKEN,
            AppError::IdentityCreationFailed(_) => error_codes::IDENTITY_CREATION_FAILED,
            AppError::Persistence(_) => error_codes::PERSISTENCE_ERROR,
            AppError::Internal(_) => error_codes::INTERNAL_ERROR,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidCredential(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::RoleMismatch(_) | AppError::CapacityExceeded(_) => StatusCode::CONFLICT,
            AppError::DuplicateEmail(_) => StatusCode::CONFLICT,
            AppError::InvalidToken(_) => StatusCode::BAD_REQUEST,
            AppError::IdentityCreationFailed(_) => StatusCode::BAD_REQUEST,
            AppError::Persistence(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Sobre uniforme de respuesta: `code` 0 en éxito, código estable en falla.
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub code: i32,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resp_data: Option<T>,
}

pub fn success_to_api_response<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        code: error_codes::SUCCESS,
        msg: "success".into(),
        resp_data: Some(data),
    })
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(ApiResponse::<()> {
            code: self.code(),
            msg: self.to_string(),
            resp_data: None,
        });

        (self.status(), body).into_response()
    }
}
