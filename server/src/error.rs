use std::process::{ExitCode, Termination};

use axum::http::StatusCode;
use axum::response::IntoResponse;
use error_stack::{AttachmentKind, FrameKind, Report};
use kernel::{ErrorKind, KernelError};
use serde::Serialize;

#[derive(Debug)]
pub struct StackTrace(Report<KernelError>);

impl From<Report<KernelError>> for StackTrace {
    fn from(e: Report<KernelError>) -> Self {
        StackTrace(e)
    }
}

impl Termination for StackTrace {
    fn report(self) -> ExitCode {
        self.0.report()
    }
}

#[derive(Debug)]
pub struct ErrorStatus(Report<KernelError>);

impl From<Report<KernelError>> for ErrorStatus {
    fn from(e: Report<KernelError>) -> Self {
        ErrorStatus(e)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    kind: &'static str,
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    details: Vec<String>,
}

fn status_of(error: &KernelError) -> StatusCode {
    match error {
        KernelError::BookNotFound | KernelError::BorrowerNotFound => StatusCode::NOT_FOUND,
        KernelError::AlreadyBorrowed
        | KernelError::NoOpenBorrowRecord
        | KernelError::DuplicateEmail
        | KernelError::AmbiguousEmail
        | KernelError::Concurrency => StatusCode::CONFLICT,
        KernelError::Validation => StatusCode::BAD_REQUEST,
        KernelError::Timeout => StatusCode::REQUEST_TIMEOUT,
        KernelError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn kind_name(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::NotFound => "not_found",
        ErrorKind::Conflict => "conflict",
        ErrorKind::Validation => "validation",
        ErrorKind::StorageFailure => "storage_failure",
    }
}

fn printable_attachments(report: &Report<KernelError>) -> Vec<String> {
    report
        .frames()
        .filter_map(|frame| match frame.kind() {
            FrameKind::Attachment(AttachmentKind::Printable(attachment)) => {
                Some(attachment.to_string())
            }
            _ => None,
        })
        .collect()
}

impl IntoResponse for ErrorStatus {
    fn into_response(self) -> axum::response::Response {
        let context = self.0.current_context();
        let status = status_of(context);
        if status.is_server_error() {
            tracing::error!("{:?}", self.0);
        } else {
            tracing::debug!("{:?}", self.0);
        }
        // Storage internals stay in the log.
        let details = if status.is_server_error() {
            Vec::new()
        } else {
            printable_attachments(&self.0)
        };
        let body = ErrorBody {
            kind: kind_name(context.kind()),
            error: context.to_string(),
            details,
        };
        (status, axum::Json(body)).into_response()
    }
}
