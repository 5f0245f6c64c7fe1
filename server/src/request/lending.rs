use application::transfer::{CheckoutDto, ReturnDto};
use serde::Deserialize;
use time::{Date, OffsetDateTime};

use crate::controller::Intake;

/// `date` defaults to the current UTC day.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    book_id: i64,
    borrower_id: i64,
    #[serde(default)]
    date: Option<Date>,
}

#[derive(Debug, Deserialize)]
pub struct ReturnRequest {
    book_id: i64,
    borrower_id: i64,
    #[serde(default)]
    date: Option<Date>,
}

fn today() -> Date {
    OffsetDateTime::now_utc().date()
}

pub struct LendingTransformer;

impl Intake<CheckoutRequest> for LendingTransformer {
    type To = CheckoutDto;
    fn emit(
        &self,
        CheckoutRequest {
            book_id,
            borrower_id,
            date,
        }: CheckoutRequest,
    ) -> Self::To {
        CheckoutDto {
            book_id,
            borrower_id,
            date: date.unwrap_or_else(today),
        }
    }
}

impl Intake<ReturnRequest> for LendingTransformer {
    type To = ReturnDto;
    fn emit(
        &self,
        ReturnRequest {
            book_id,
            borrower_id,
            date,
        }: ReturnRequest,
    ) -> Self::To {
        ReturnDto {
            book_id,
            borrower_id,
            date: date.unwrap_or_else(today),
        }
    }
}
