use actix_identity::error::{GetIdentityError, LoginError};
use actix_session::{SessionGetError, SessionInsertError};
use actix_web::{
    http::{header, StatusCode},
    HttpResponse, ResponseError,
};
use sqlx::{migrate::MigrateError, Error as SqlxError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),

    #[error("Migration error: {0}")]
    MigrateError(#[from] MigrateError),

    #[error("Template error: {0}")]
    TemplateError(#[from] tera::Error),

    #[error("Password error: {0}")]
    PasswordError(String),

    #[error("Identity error: {0}")]
    IdentityError(#[from] GetIdentityError),

    #[error("Login error: {0}")]
    LoginError(#[from] LoginError),

    #[error("Session error: {0}")]
    SessionGetError(#[from] SessionGetError),

    #[error("Session error: {0}")]
    SessionInsertError(#[from] SessionInsertError),

    #[error("Export error: {0}")]
    ExportError(#[from] rust_xlsxwriter::XlsxError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unauthorized")]
    Unauthorized,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::SEE_OTHER,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            // Guarded pages send anonymous visitors back to the login form.
            AppError::Unauthorized => HttpResponse::SeeOther()
                .append_header((header::LOCATION, "/"))
                .finish(),
            _ => HttpResponse::InternalServerError().body("Internal server error"),
        }
    }
}

impl From<AppError> for std::io::Error {
    fn from(err: AppError) -> Self {
        std::io::Error::new(std::io::ErrorKind::Other, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_redirects_to_login() {
        let resp = AppError::Unauthorized.error_response();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/");
    }

    #[test]
    fn internal_errors_do_not_leak_details() {
        let err = AppError::PasswordError("salt too short".into());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            err.error_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
