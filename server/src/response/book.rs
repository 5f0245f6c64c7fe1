use application::transfer::BookDto;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::prelude::entity::BookStatus;
use serde::Serialize;

use crate::controller::Exhaust;

#[derive(Debug, Serialize)]
pub struct CreatedBookResponse {
    id: i64,
}

impl IntoResponse for CreatedBookResponse {
    fn into_response(self) -> Response {
        (StatusCode::CREATED, axum::Json(self)).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct BookResponse {
    id: i64,
    title: String,
    author: String,
    genre: String,
    status: BookStatus,
}

impl From<BookDto> for BookResponse {
    fn from(
        BookDto {
            id,
            title,
            author,
            genre,
            status,
        }: BookDto,
    ) -> Self {
        Self {
            id,
            title,
            author,
            genre,
            status,
        }
    }
}

impl IntoResponse for BookResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, axum::Json(self)).into_response()
    }
}

pub struct BookPresenter;

impl Exhaust<()> for BookPresenter {
    type To = StatusCode;
    fn emit(&self, _: ()) -> Self::To {
        StatusCode::NO_CONTENT
    }
}

impl Exhaust<i64> for BookPresenter {
    type To = CreatedBookResponse;
    fn emit(&self, input: i64) -> Self::To {
        CreatedBookResponse { id: input }
    }
}

impl Exhaust<BookDto> for BookPresenter {
    type To = BookResponse;
    fn emit(&self, input: BookDto) -> Self::To {
        BookResponse::from(input)
    }
}

impl Exhaust<Vec<BookDto>> for BookPresenter {
    type To = axum::Json<Vec<BookResponse>>;
    fn emit(&self, input: Vec<BookDto>) -> Self::To {
        let result = input
            .into_iter()
            .map(BookResponse::from)
            .collect::<Vec<_>>();
        axum::Json::from(result)
    }
}

pub struct AuthorPresenter;

impl Exhaust<Vec<String>> for AuthorPresenter {
    type To = axum::Json<Vec<String>>;
    fn emit(&self, input: Vec<String>) -> Self::To {
        axum::Json::from(input)
    }
}
