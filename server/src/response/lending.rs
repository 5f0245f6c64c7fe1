use application::transfer::BorrowRecordDto;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use time::Date;

use crate::controller::Exhaust;

#[derive(Debug, Serialize)]
pub struct BorrowRecordResponse {
    id: i64,
    book_id: i64,
    borrower_id: i64,
    borrowed_at: Date,
    returned_at: Option<Date>,
}

impl From<BorrowRecordDto> for BorrowRecordResponse {
    fn from(
        BorrowRecordDto {
            id,
            book_id,
            borrower_id,
            borrowed_at,
            returned_at,
        }: BorrowRecordDto,
    ) -> Self {
        Self {
            id,
            book_id,
            borrower_id,
            borrowed_at,
            returned_at,
        }
    }
}

impl IntoResponse for BorrowRecordResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, axum::Json(self)).into_response()
    }
}

/// A checkout creates its record.
pub struct CheckedOutResponse(BorrowRecordResponse);

impl IntoResponse for CheckedOutResponse {
    fn into_response(self) -> Response {
        (StatusCode::CREATED, axum::Json(self.0)).into_response()
    }
}

pub struct LendingPresenter;

impl Exhaust<BorrowRecordDto> for LendingPresenter {
    type To = BorrowRecordResponse;
    fn emit(&self, input: BorrowRecordDto) -> Self::To {
        BorrowRecordResponse::from(input)
    }
}

impl Exhaust<Vec<BorrowRecordDto>> for LendingPresenter {
    type To = axum::Json<Vec<BorrowRecordResponse>>;
    fn emit(&self, input: Vec<BorrowRecordDto>) -> Self::To {
        let result = input
            .into_iter()
            .map(BorrowRecordResponse::from)
            .collect::<Vec<_>>();
        axum::Json::from(result)
    }
}

pub struct CheckoutPresenter;

impl Exhaust<BorrowRecordDto> for CheckoutPresenter {
    type To = CheckedOutResponse;
    fn emit(&self, input: BorrowRecordDto) -> Self::To {
        CheckedOutResponse(BorrowRecordResponse::from(input))
    }
}

#[cfg(test)]
mod test {
    use application::transfer::BorrowRecordDto;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use time::macros::date;

    use crate::controller::Exhaust;
    use crate::response::{CheckoutPresenter, LendingPresenter};

    fn record() -> BorrowRecordDto {
        BorrowRecordDto {
            id: 1,
            book_id: 2,
            borrower_id: 3,
            borrowed_at: date!(2024 - 05 - 01),
            returned_at: None,
        }
    }

    #[test]
    fn checkout_is_created() {
        let response = CheckoutPresenter.emit(record()).into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        let response = LendingPresenter.emit(record()).into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn dates_are_iso() {
        let json = serde_json::to_value(LendingPresenter.emit(record())).unwrap();
        assert_eq!(json["borrowed_at"], "2024-05-01");
        assert!(json["returned_at"].is_null());
    }
}
