use kernel::prelude::entity::{BorrowRecord, DestructBorrowRecord};
use time::Date;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BorrowRecordDto {
    pub id: i64,
    pub book_id: i64,
    pub borrower_id: i64,
    pub borrowed_at: Date,
    pub returned_at: Option<Date>,
}

impl From<BorrowRecord> for BorrowRecordDto {
    fn from(value: BorrowRecord) -> Self {
        let DestructBorrowRecord {
            id,
            book_id,
            borrower_id,
            borrowed_at,
            returned_at,
        } = value.into_destruct();
        Self {
            id: id.into(),
            book_id: book_id.into(),
            borrower_id: borrower_id.into(),
            borrowed_at: borrowed_at.into(),
            returned_at: returned_at.map(Date::from),
        }
    }
}

pub struct CheckoutDto {
    pub book_id: i64,
    pub borrower_id: i64,
    pub date: Date,
}

pub struct ReturnDto {
    pub book_id: i64,
    pub borrower_id: i64,
    pub date: Date,
}

pub struct GetBorrowsFromBorrowerDto {
    pub borrower_id: i64,
}

pub struct GetBorrowsFromBookDto {
    pub book_id: i64,
}
