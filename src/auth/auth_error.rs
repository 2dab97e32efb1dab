use thiserror::Error;

use crate::error::AppError;

/// Ways a logout can fail. Each maps to a fixed client message; the store
/// error is only ever logged.
#[derive(Error, Debug)]
pub enum LogoutError {
    #[error("Refresh token is required.")]
    MissingToken,

    #[error("Token is invalid or expired.")]
    InvalidToken,

    #[error("Unable to revoke token.")]
    Store(#[source] AppError),
}

impl From<LogoutError> for AppError {
    fn from(err: LogoutError) -> Self {
        if let LogoutError::Store(ref source) = err {
            tracing::error!("Failed to blacklist refresh token: {:?}", source);
        }
        AppError::BadRequest(err.to_string())
    }
}
