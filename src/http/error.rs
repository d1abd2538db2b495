//! Request-level errors and their HTTP status mapping.

use std::io;

use thiserror::Error;

use crate::http::parser::ParseError;
use crate::http::response::StatusCode;

/// Everything that can turn a request into an error page.
///
/// None of these escape the request handler: each becomes a complete HTML
/// response carrying the matching status.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Bad Request: {0}")]
    MalformedRequest(String),

    #[error("Not Found: /{0}")]
    NotFound(String),

    #[error("Method Not Allowed: {0}")]
    MethodNotAllowed(String),

    #[error("Forbidden: /{0}")]
    Forbidden(String),

    #[error("Request header block exceeds {0} bytes")]
    RequestTooLarge(usize),

    #[error("Internal Server Error: {0}")]
    Io(#[from] io::Error),
}

impl HttpError {
    pub fn status(&self) -> StatusCode {
        match self {
            HttpError::MalformedRequest(_) => StatusCode::BadRequest,
            HttpError::NotFound(_) => StatusCode::NotFound,
            HttpError::MethodNotAllowed(_) => StatusCode::MethodNotAllowed,
            HttpError::Forbidden(_) => StatusCode::Forbidden,
            HttpError::RequestTooLarge(_) => StatusCode::RequestHeaderFieldsTooLarge,
            HttpError::Io(_) => StatusCode::InternalServerError,
        }
    }
}

impl From<ParseError> for HttpError {
    fn from(err: ParseError) -> Self {
        HttpError::MalformedRequest(err.to_string())
    }
}
