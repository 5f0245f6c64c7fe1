use crate::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use crate::entity::{BookId, BorrowRecord, BorrowRecordId, BorrowerId};
use crate::KernelError;

#[async_trait::async_trait]
pub trait BorrowRecordQuery: 'static + Sync + Send {
    type Transaction: Transaction;
    async fn find_by_id(
        &self,
        con: &mut Self::Transaction,
        id: &BorrowRecordId,
    ) -> error_stack::Result<Option<BorrowRecord>, KernelError>;
    async fn find_open(
        &self,
        con: &mut Self::Transaction,
        book_id: &BookId,
        borrower_id: &BorrowerId,
    ) -> error_stack::Result<Option<BorrowRecord>, KernelError>;
    async fn find_open_by_book(
        &self,
        con: &mut Self::Transaction,
        book_id: &BookId,
    ) -> error_stack::Result<Option<BorrowRecord>, KernelError>;
    async fn find_open_by_borrower(
        &self,
        con: &mut Self::Transaction,
        borrower_id: &BorrowerId,
    ) -> error_stack::Result<Vec<BorrowRecord>, KernelError>;
    /// Open and closed records, oldest borrow first.
    async fn find_by_borrower(
        &self,
        con: &mut Self::Transaction,
        borrower_id: &BorrowerId,
    ) -> error_stack::Result<Vec<BorrowRecord>, KernelError>;
    async fn find_by_book(
        &self,
        con: &mut Self::Transaction,
        book_id: &BookId,
    ) -> error_stack::Result<Vec<BorrowRecord>, KernelError>;
}

pub trait DependOnBorrowRecordQuery: 'static + Sync + Send + DependOnDatabaseConnection {
    type BorrowRecordQuery: BorrowRecordQuery<
        Transaction = <Self::DatabaseConnection as DatabaseConnection>::Transaction,
    >;
    fn borrow_record_query(&self) -> &Self::BorrowRecordQuery;
}
