use actix_web::http::StatusCode;
use actix_web::{error, HttpResponse};
use derive_more::{Display, Error};
use log::error;
use tokio_postgres::error::SqlState;

#[derive(Debug, Display, Error)]
pub(crate) enum CustomError {
    #[display("ticket has no lines")]
    EmptyTicket,
    #[display("quantity must be a positive integer")]
    InvalidQuantity,
    #[display("insufficient stock for this sale")]
    InsufficientStock,
    #[display("resource not found")]
    NotFound,
    #[display("invalid request")]
    BadRequest,
    #[display("unauthorized")]
    Unauthorized,
    #[display("database error")]
    DbError,
    #[display("server is busy")]
    ServerIsBusy,
    #[display("timeout occurred")]
    Timeout,
}

impl CustomError {
    pub(crate) fn from_db(e: tokio_postgres::Error) -> Self {
        error!("database operation failed, {}", e);
        Self::DbError
    }

    /// like [`CustomError::from_db`], but a broken foreign key means the
    /// caller referenced an id that is not there
    pub(crate) fn from_db_fk(e: tokio_postgres::Error) -> Self {
        if e.code() == Some(&SqlState::FOREIGN_KEY_VIOLATION) {
            return Self::NotFound;
        }
        Self::from_db(e)
    }
}

impl error::ResponseError for CustomError {
    fn status_code(&self) -> StatusCode {
        match *self {
            CustomError::EmptyTicket | CustomError::InvalidQuantity | CustomError::BadRequest => {
                StatusCode::BAD_REQUEST
            }
            CustomError::NotFound => StatusCode::NOT_FOUND,
            CustomError::InsufficientStock => StatusCode::CONFLICT,
            CustomError::Unauthorized => StatusCode::UNAUTHORIZED,
            CustomError::DbError | CustomError::ServerIsBusy => StatusCode::INTERNAL_SERVER_ERROR,
            CustomError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "success": false,
            "error": self.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::error::ResponseError;

    #[test]
    fn business_errors_map_to_4xx() {
        assert_eq!(CustomError::EmptyTicket.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(CustomError::InvalidQuantity.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(CustomError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(CustomError::InsufficientStock.status_code(), StatusCode::CONFLICT);
        assert_eq!(CustomError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn infra_errors_map_to_5xx() {
        assert_eq!(
            CustomError::DbError.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            CustomError::ServerIsBusy.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(CustomError::Timeout.status_code(), StatusCode::GATEWAY_TIMEOUT);
    }
}
