use actix_web::{HttpResponse, ResponseError};
use actix_web::http::StatusCode;
use thiserror::Error;

use crate::models::ApiResponse;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Nothing left to win")]
    NoPrizesAvailable,

    #[error("You already played")]
    DuplicateParticipation,

    #[error("Prize selection failed: {0}")]
    SelectionError(String),

    #[error("Inventory error: {0}")]
    InventoryError(String),

    #[error("Malformed redemption token: {0}")]
    MalformedToken(String),

    #[error("This prize belongs to another establishment")]
    EstablishmentMismatch,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("This prize has already been redeemed")]
    AlreadyRedeemed,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl AppError {
    /// 对外暴露的稳定错误码（前端据此区分提示文案）
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::NoPrizesAvailable => "NO_PRIZES_AVAILABLE",
            AppError::DuplicateParticipation => "ALREADY_PARTICIPATED",
            AppError::SelectionError(_) => "SELECTION_FAILED",
            AppError::InventoryError(_) => "INVENTORY_CONFLICT",
            AppError::MalformedToken(_) => "MALFORMED_TOKEN",
            AppError::EstablishmentMismatch => "ESTABLISHMENT_MISMATCH",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::AlreadyRedeemed => "ALREADY_REDEEMED",
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::AuthError(_) | AppError::JwtError(_) => "AUTH_ERROR",
            AppError::Forbidden => "FORBIDDEN",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::InternalError(_) => "INTERNAL_ERROR",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NoPrizesAvailable
            | AppError::DuplicateParticipation
            | AppError::InventoryError(_)
            | AppError::AlreadyRedeemed => StatusCode::CONFLICT,
            AppError::SelectionError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::MalformedToken(_) | AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::EstablishmentMismatch | AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AuthError(_) | AppError::JwtError(_) => StatusCode::UNAUTHORIZED,
            AppError::DatabaseError(_) | AppError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::DatabaseError(err) => {
                log::error!("Database error: {err}");
                "Database error".to_string()
            }
            AppError::InternalError(msg) => {
                log::error!("Internal error: {msg}");
                "Internal server error".to_string()
            }
            AppError::SelectionError(msg) | AppError::InventoryError(msg) => {
                log::error!("Draw error: {msg}");
                self.to_string()
            }
            AppError::JwtError(err) => {
                log::warn!("Authentication error: {err}");
                "Invalid access token".to_string()
            }
            AppError::NotFound(_) => self.to_string(),
            _ => {
                log::warn!("{}: {self}", self.error_code());
                self.to_string()
            }
        };

        HttpResponse::build(self.status_code())
            .json(ApiResponse::failure(self.error_code(), message))
    }
}
