use crate::delivery::Status;
use actix_web::{
    error::QueryPayloadError, http::StatusCode, HttpRequest, HttpResponse, ResponseError,
};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum Error {
    Cli(String),
    FetchFailed(String),
    InvalidTransition {
        vehicle_id: i64,
        date: String,
        from: Status,
        to: Status,
    },
    TransitionRejected(String),
    ExportFailed(String),
    InvalidInput(String),
    NotFound(String),
    IO(std::io::Error),
    Reqwest(reqwest::Error),
    SerdeJson(serde_json::Error),
    Csv(csv::Error),
    Url(url::ParseError),
    TimeFormat(time::error::Format),
    TimeParse(time::error::Parse),
    StaticMap(staticmap::Error),
    Blocking(actix_web::error::BlockingError),
    Generic(String),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Cli(err) => write!(f, "{}", err),
            Error::FetchFailed(err) => write!(f, "Fetch failed: {}", err),
            Error::InvalidTransition {
                vehicle_id,
                date,
                from,
                to,
            } => write!(
                f,
                "Vehicle {vehicle_id} ({date}) can't move from '{from}' to '{to}'"
            ),
            Error::TransitionRejected(err) => write!(f, "Status update rejected: {}", err),
            Error::ExportFailed(err) => write!(f, "Export failed: {}", err),
            Error::InvalidInput(err) => write!(f, "{}", err),
            Error::NotFound(err) => write!(f, "{}", err),
            Error::IO(err) => err.fmt(f),
            Error::Reqwest(err) => err.fmt(f),
            Error::SerdeJson(err) => err.fmt(f),
            Error::Csv(err) => err.fmt(f),
            Error::Url(err) => err.fmt(f),
            Error::TimeFormat(err) => err.fmt(f),
            Error::TimeParse(err) => err.fmt(f),
            Error::StaticMap(err) => err.fmt(f),
            Error::Blocking(err) => err.fmt(f),
            Error::Generic(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Error {}

impl From<&str> for Error {
    fn from(str: &str) -> Self {
        Error::Generic(str.to_owned())
    }
}

impl From<String> for Error {
    fn from(str: String) -> Self {
        Error::Generic(str)
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::IO(error)
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        Error::Reqwest(error)
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::SerdeJson(error)
    }
}

impl From<csv::Error> for Error {
    fn from(error: csv::Error) -> Self {
        Error::Csv(error)
    }
}

impl From<url::ParseError> for Error {
    fn from(error: url::ParseError) -> Self {
        Error::Url(error)
    }
}

impl From<time::error::Format> for Error {
    fn from(error: time::error::Format) -> Self {
        Error::TimeFormat(error)
    }
}

impl From<time::error::Parse> for Error {
    fn from(error: time::error::Parse) -> Self {
        Error::TimeParse(error)
    }
}

impl From<staticmap::Error> for Error {
    fn from(error: staticmap::Error) -> Self {
        Error::StaticMap(error)
    }
}

impl From<actix_web::error::BlockingError> for Error {
    fn from(error: actix_web::error::BlockingError) -> Self {
        Error::Blocking(error)
    }
}

pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    Error::InvalidInput(format!("Invalid arguments: {err}")).into()
}

#[derive(Serialize, Deserialize)]
pub struct ApiError {
    pub http_code: u16,
    pub message: String,
}

impl ResponseError for Error {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ApiError {
            http_code: self.status_code().as_u16(),
            message: self.to_string(),
        })
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::InvalidTransition { .. } => StatusCode::CONFLICT,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::FetchFailed(_) | Error::TransitionRejected(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
