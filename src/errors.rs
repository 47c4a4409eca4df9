use actix_web::{HttpResponse, ResponseError};
use std::fmt;

use crate::models::report::ReportError;

#[derive(Debug)]
pub enum AppError {
    Report(ReportError),
    UnknownReport(String),
    Template(askama::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Report(e) => write!(f, "{e}"),
            AppError::UnknownReport(name) => write!(f, "unknown report {name:?}"),
            AppError::Template(e) => write!(f, "Template error: {e}"),
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::UnknownReport(_) => HttpResponse::NotFound()
                .content_type("text/plain; charset=utf-8")
                .body(self.to_string()),
            _ => {
                log::error!("{self}");
                HttpResponse::InternalServerError()
                    .content_type("text/plain; charset=utf-8")
                    .body(self.to_string())
            }
        }
    }
}

impl From<ReportError> for AppError {
    fn from(e: ReportError) -> Self {
        AppError::Report(e)
    }
}

impl From<askama::Error> for AppError {
    fn from(e: askama::Error) -> Self {
        AppError::Template(e)
    }
}
