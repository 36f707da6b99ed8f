use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use std::path::PathBuf;

/// Everything that can go wrong while answering a request.
///
/// Clients never see the difference: every variant is a plain 404. The
/// variants exist so the server log says what actually happened.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid request path {0}")]
    InvalidPath(String),
    #[error("{0} is not under a media namespace")]
    NotMedia(String),
    #[error("no backing store configured")]
    NoBackingStore,
    #[error("{0} cannot be used as a store base url")]
    StoreUrl(String),
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned {status}")]
    Status { url: String, status: u16 },
    #[error("could not write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("blocking pool unavailable")]
    Blocking,
    #[error("{} is not a file", .0.display())]
    NotFound(PathBuf),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        StatusCode::NOT_FOUND
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::NotFound()
            .content_type("text/plain; charset=utf-8")
            .body("404 page not found\n")
    }
}

impl From<actix_web::error::BlockingError> for Error {
    fn from(_: actix_web::error::BlockingError) -> Self {
        Error::Blocking
    }
}
