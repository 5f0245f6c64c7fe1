use application::transfer::{
    GetAllBorrowerDto, GetBorrowerByEmailDto, GetBorrowerDto, GetBorrowsFromBorrowerDto,
    RegisterBorrowerDto,
};
use kernel::prelude::entity::{SelectLimit, SelectOffset};
use serde::Deserialize;

use crate::controller::Intake;

#[derive(Debug, Deserialize)]
pub struct RegisterBorrowerRequest {
    name: String,
    email: String,
}

#[derive(Debug, Deserialize)]
pub struct GetAllBorrowerRequest {
    #[serde(default)]
    limit: SelectLimit,
    #[serde(default)]
    offset: SelectOffset,
}

#[derive(Debug, Deserialize)]
pub struct SearchBorrowerRequest {
    email: String,
}

#[derive(Debug)]
pub struct GetBorrowerRequest {
    id: i64,
}

impl GetBorrowerRequest {
    pub fn new(id: i64) -> Self {
        Self { id }
    }
}

/// `?all=true` includes returned records.
#[derive(Debug, Deserialize)]
pub struct GetBorrowsRequest {
    #[serde(default)]
    all: bool,
}

pub enum BorrowsScope {
    Open(GetBorrowsFromBorrowerDto),
    History(GetBorrowsFromBorrowerDto),
}

pub struct BorrowerTransformer;

impl Intake<RegisterBorrowerRequest> for BorrowerTransformer {
    type To = RegisterBorrowerDto;
    fn emit(&self, RegisterBorrowerRequest { name, email }: RegisterBorrowerRequest) -> Self::To {
        RegisterBorrowerDto { name, email }
    }
}

impl Intake<GetAllBorrowerRequest> for BorrowerTransformer {
    type To = GetAllBorrowerDto;
    fn emit(&self, input: GetAllBorrowerRequest) -> Self::To {
        GetAllBorrowerDto {
            limit: input.limit,
            offset: input.offset,
        }
    }
}

impl Intake<SearchBorrowerRequest> for BorrowerTransformer {
    type To = GetBorrowerByEmailDto;
    fn emit(&self, input: SearchBorrowerRequest) -> Self::To {
        GetBorrowerByEmailDto { email: input.email }
    }
}

impl Intake<GetBorrowerRequest> for BorrowerTransformer {
    type To = GetBorrowerDto;
    fn emit(&self, input: GetBorrowerRequest) -> Self::To {
        GetBorrowerDto { id: input.id }
    }
}

impl Intake<(i64, GetBorrowsRequest)> for BorrowerTransformer {
    type To = BorrowsScope;
    fn emit(&self, (id, input): (i64, GetBorrowsRequest)) -> Self::To {
        let dto = GetBorrowsFromBorrowerDto { borrower_id: id };
        if input.all {
            BorrowsScope::History(dto)
        } else {
            BorrowsScope::Open(dto)
        }
    }
}
