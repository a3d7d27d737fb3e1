use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

/// Errors surfaced by request handlers.
///
/// The [`ResponseError`] impl is the single response-mapping layer:
/// every handler error becomes a 500 whose body carries the error
/// message prefixed with `Error: `.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Intentional failure!")]
    ForcedFailure,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .content_type(ContentType::plaintext())
            .body(format!("Error: {self}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::MessageBody;

    #[test]
    fn forced_failure_maps_to_500() {
        let err = AppError::ForcedFailure;
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = resp.into_body().try_into_bytes().unwrap();
        assert_eq!(&body[..], b"Error: Intentional failure!");
    }
}
