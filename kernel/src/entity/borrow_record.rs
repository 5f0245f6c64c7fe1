mod borrowed_at;
mod id;
mod returned_at;

pub use self::{borrowed_at::*, id::*, returned_at::*};
use destructure::{Destructure, Mutation};
use serde::{Deserialize, Serialize};
use vodca::References;

use crate::entity::{BookId, BorrowerId};

/// One checkout of a book. Open while `returned_at` is `None`.
#[derive(
    Debug, Clone, Eq, PartialEq, Serialize, Deserialize, References, Destructure, Mutation,
)]
pub struct BorrowRecord {
    id: BorrowRecordId,
    book_id: BookId,
    borrower_id: BorrowerId,
    borrowed_at: BorrowedAt,
    returned_at: Option<ReturnedAt>,
}

impl BorrowRecord {
    pub fn new(
        id: BorrowRecordId,
        book_id: BookId,
        borrower_id: BorrowerId,
        borrowed_at: BorrowedAt,
        returned_at: Option<ReturnedAt>,
    ) -> Self {
        Self {
            id,
            book_id,
            borrower_id,
            borrowed_at,
            returned_at,
        }
    }

    pub fn is_open(&self) -> bool {
        self.returned_at.is_none()
    }
}
