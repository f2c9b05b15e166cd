use std::fmt::Display;

use actix_web::{
    error::BlockingError,
    http::{header::ContentType, StatusCode},
    HttpResponse, HttpResponseBuilder,
};

pub const NOT_FOUND_PAGE: &str = "<h1>404</h1><p>The resource could not be found.</p>";

#[derive(Debug)]
pub enum ApplicationError {
    /// Unknown route, missing query parameter or unknown CVE id.
    NotFound,
    /// Carries the error chain when the server runs in debug mode.
    InternalServerError(Option<String>),
    ServiceUnavailable,
}

impl Display for ApplicationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl actix_web::error::ResponseError for ApplicationError {
    fn error_response(&self) -> HttpResponse {
        let mut b = HttpResponseBuilder::new(self.status_code());

        match self {
            Self::NotFound => b.content_type(ContentType::html()).body(NOT_FOUND_PAGE),
            Self::InternalServerError(Some(details)) => b
                .content_type(ContentType::plaintext())
                .body(details.to_owned()),
            _ => b.finish(),
        }
    }

    fn status_code(&self) -> StatusCode {
        match *self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

pub fn handle_blocking_error(error: BlockingError) -> ApplicationError {
    log::error!("{}", error);
    ApplicationError::ServiceUnavailable
}

pub fn internal_server_error(error: anyhow::Error, debug: bool) -> ApplicationError {
    log::error!("{:#}", error);
    ApplicationError::InternalServerError(debug.then(|| format!("{:?}", error)))
}

pub async fn not_found() -> Result<HttpResponse, ApplicationError> {
    Err(ApplicationError::NotFound)
}
