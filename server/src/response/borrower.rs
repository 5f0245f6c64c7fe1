use application::transfer::BorrowerDto;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::controller::Exhaust;

#[derive(Debug, Serialize)]
pub struct CreatedBorrowerResponse {
    id: i64,
}

impl IntoResponse for CreatedBorrowerResponse {
    fn into_response(self) -> Response {
        (StatusCode::CREATED, axum::Json(self)).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct BorrowerResponse {
    id: i64,
    name: String,
    email: String,
}

impl From<BorrowerDto> for BorrowerResponse {
    fn from(BorrowerDto { id, name, email }: BorrowerDto) -> Self {
        Self { id, name, email }
    }
}

impl IntoResponse for BorrowerResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, axum::Json(self)).into_response()
    }
}

pub struct BorrowerPresenter;

impl Exhaust<i64> for BorrowerPresenter {
    type To = CreatedBorrowerResponse;
    fn emit(&self, input: i64) -> Self::To {
        CreatedBorrowerResponse { id: input }
    }
}

impl Exhaust<BorrowerDto> for BorrowerPresenter {
    type To = BorrowerResponse;
    fn emit(&self, input: BorrowerDto) -> Self::To {
        BorrowerResponse::from(input)
    }
}

impl Exhaust<Vec<BorrowerDto>> for BorrowerPresenter {
    type To = axum::Json<Vec<BorrowerResponse>>;
    fn emit(&self, input: Vec<BorrowerDto>) -> Self::To {
        axum::Json::from(
            input
                .into_iter()
                .map(BorrowerResponse::from)
                .collect::<Vec<_>>(),
        )
    }
}
