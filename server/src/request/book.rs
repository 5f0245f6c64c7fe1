use application::transfer::{
    CreateBookDto, DeleteBookDto, GetAllBookDto, GetBookDto, GetBooksByAuthorDto,
    GetBooksByTitleDto, GetBorrowsFromBookDto, UpdateBookDto,
};
use kernel::prelude::entity::{SelectLimit, SelectOffset};
use serde::Deserialize;

use crate::controller::Intake;

#[derive(Debug, Deserialize)]
pub struct CreateBookRequest {
    title: String,
    author: String,
    genre: String,
}

/// Only the attributes present in the body are changed. Availability is not
/// editable here.
#[derive(Debug, Deserialize)]
pub struct UpdateBookRequest {
    title: Option<String>,
    author: Option<String>,
    genre: Option<String>,
}

#[derive(Debug)]
pub struct DeleteBookRequest {
    id: i64,
}

impl DeleteBookRequest {
    pub fn new(id: i64) -> Self {
        Self { id }
    }
}

// I want to use primitive type(i64) in these fields, but default attribute not supported for literals(https://github.com/serde-rs/serde/issues/368)
#[derive(Debug, Deserialize)]
pub struct GetAllBookRequest {
    #[serde(default)]
    limit: SelectLimit,
    #[serde(default)]
    offset: SelectOffset,
}

#[derive(Debug)]
pub struct GetBookRequest {
    id: i64,
}

impl GetBookRequest {
    pub fn new(id: i64) -> Self {
        Self { id }
    }
}

#[derive(Debug)]
pub struct GetBooksByAuthorRequest {
    author: String,
}

impl GetBooksByAuthorRequest {
    pub fn new(author: String) -> Self {
        Self { author }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchBookRequest {
    title: String,
}

#[derive(Debug)]
pub struct GetBookBorrowsRequest {
    id: i64,
}

impl GetBookBorrowsRequest {
    pub fn new(id: i64) -> Self {
        Self { id }
    }
}

pub struct BookTransformer;

impl Intake<CreateBookRequest> for BookTransformer {
    type To = CreateBookDto;
    fn emit(&self, input: CreateBookRequest) -> Self::To {
        CreateBookDto {
            title: input.title,
            author: input.author,
            genre: input.genre,
        }
    }
}

impl Intake<(i64, UpdateBookRequest)> for BookTransformer {
    type To = UpdateBookDto;
    fn emit(&self, (id, input): (i64, UpdateBookRequest)) -> Self::To {
        UpdateBookDto {
            id,
            title: input.title,
            author: input.author,
            genre: input.genre,
        }
    }
}

impl Intake<DeleteBookRequest> for BookTransformer {
    type To = DeleteBookDto;
    fn emit(&self, input: DeleteBookRequest) -> Self::To {
        DeleteBookDto { id: input.id }
    }
}

impl Intake<GetBookRequest> for BookTransformer {
    type To = GetBookDto;
    fn emit(&self, input: GetBookRequest) -> Self::To {
        GetBookDto { id: input.id }
    }
}

impl Intake<GetAllBookRequest> for BookTransformer {
    type To = GetAllBookDto;
    fn emit(&self, input: GetAllBookRequest) -> Self::To {
        GetAllBookDto {
            limit: input.limit,
            offset: input.offset,
        }
    }
}

impl Intake<GetBooksByAuthorRequest> for BookTransformer {
    type To = GetBooksByAuthorDto;
    fn emit(&self, input: GetBooksByAuthorRequest) -> Self::To {
        GetBooksByAuthorDto {
            author: input.author,
        }
    }
}

impl Intake<SearchBookRequest> for BookTransformer {
    type To = GetBooksByTitleDto;
    fn emit(&self, input: SearchBookRequest) -> Self::To {
        GetBooksByTitleDto { title: input.title }
    }
}

impl Intake<GetBookBorrowsRequest> for BookTransformer {
    type To = GetBorrowsFromBookDto;
    fn emit(&self, input: GetBookBorrowsRequest) -> Self::To {
        GetBorrowsFromBookDto { book_id: input.id }
    }
}
