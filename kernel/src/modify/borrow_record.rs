use crate::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use crate::entity::{BookId, BorrowRecordId, BorrowedAt, BorrowerId, ReturnedAt};
use crate::KernelError;

#[async_trait::async_trait]
pub trait BorrowRecordModifier: 'static + Sync + Send {
    type Transaction: Transaction;
    /// Appends an open record and returns its generated id.
    async fn create(
        &self,
        con: &mut Self::Transaction,
        book_id: &BookId,
        borrower_id: &BorrowerId,
        borrowed_at: &BorrowedAt,
    ) -> error_stack::Result<BorrowRecordId, KernelError>;
    /// Sets the return date of a record that is still open.
    ///
    /// Returns `false` if the record is missing or was already closed.
    async fn close(
        &self,
        con: &mut Self::Transaction,
        id: &BorrowRecordId,
        returned_at: &ReturnedAt,
    ) -> error_stack::Result<bool, KernelError>;
    /// Returns how many records were removed.
    async fn delete_by_book_id(
        &self,
        con: &mut Self::Transaction,
        book_id: &BookId,
    ) -> error_stack::Result<u64, KernelError>;
}

pub trait DependOnBorrowRecordModifier: 'static + Sync + Send + DependOnDatabaseConnection {
    type BorrowRecordModifier: BorrowRecordModifier<
        Transaction = <Self::DatabaseConnection as DatabaseConnection>::Transaction,
    >;
    fn borrow_record_modifier(&self) -> &Self::BorrowRecordModifier;
}
