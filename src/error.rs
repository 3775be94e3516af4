use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not enough capacity: needed {requested}, available {available}")]
    CapacityExceeded { requested: i64, available: i64 },

    #[error("Insufficient points: needed {required}, available {available}")]
    InsufficientPoints { required: i64, available: i64 },

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden")]
    Forbidden,

    /// 存储层静默拒绝写入（例如开奖时中奖标记全部失败）
    #[error("Consistency fault: {0}")]
    ConsistencyFault(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl AppError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::CapacityExceeded { .. } => "CAPACITY_EXCEEDED",
            AppError::InsufficientPoints { .. } => "INSUFFICIENT_POINTS",
            AppError::AuthError(_) | AppError::JwtError(_) => "AUTH_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Forbidden => "FORBIDDEN",
            AppError::ConsistencyFault(_) => "CONSISTENCY_FAULT",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            _ => "INTERNAL_ERROR",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;
        match self {
            AppError::ValidationError(_)
            | AppError::CapacityExceeded { .. }
            | AppError::InsufficientPoints { .. } => StatusCode::BAD_REQUEST,
            AppError::AuthError(_) | AppError::JwtError(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::ValidationError(msg) => {
                log::warn!("Validation error: {msg}");
                msg.clone()
            }
            AppError::CapacityExceeded { .. } | AppError::InsufficientPoints { .. } => {
                log::warn!("{self}");
                self.to_string()
            }
            AppError::AuthError(msg) => {
                log::warn!("Authentication error: {msg}");
                msg.clone()
            }
            AppError::JwtError(err) => {
                log::warn!("Authentication error: {err}");
                "Invalid access token".to_string()
            }
            AppError::NotFound(msg) => msg.clone(),
            AppError::Forbidden => {
                log::warn!("Forbidden access");
                "Forbidden".to_string()
            }
            AppError::ConsistencyFault(detail) => {
                log::error!("Consistency fault: {detail}");
                "Writes were rejected by the store; check permissions and data consistency"
                    .to_string()
            }
            AppError::DatabaseError(err) => {
                log::error!("Database error: {err}");
                "Database error".to_string()
            }
            _ => {
                log::error!("Internal error: {self}");
                "Internal server error".to_string()
            }
        };

        let mut error = json!({
            "code": self.error_code(),
            "message": message
        });
        match self {
            AppError::CapacityExceeded {
                requested,
                available,
            } => {
                error["requested"] = json!(requested);
                error["available"] = json!(available);
            }
            AppError::InsufficientPoints {
                required,
                available,
            } => {
                error["required"] = json!(required);
                error["available"] = json!(available);
            }
            _ => {}
        }

        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "error": error
        }))
    }
}
