use crate::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use crate::entity::{Borrower, BorrowerEmail, BorrowerId, SelectLimit, SelectOffset};
use crate::KernelError;

#[async_trait::async_trait]
pub trait BorrowerQuery: 'static + Sync + Send {
    type Transaction: Transaction;
    async fn find_by_id(
        &self,
        con: &mut Self::Transaction,
        id: &BorrowerId,
    ) -> error_stack::Result<Option<Borrower>, KernelError>;
    /// Every borrower registered with `email`. More than one row only exists for
    /// data written before emails were unique.
    async fn find_by_email(
        &self,
        con: &mut Self::Transaction,
        email: &BorrowerEmail,
    ) -> error_stack::Result<Vec<Borrower>, KernelError>;
    async fn find_all(
        &self,
        con: &mut Self::Transaction,
        limit: &SelectLimit,
        offset: &SelectOffset,
    ) -> error_stack::Result<Vec<Borrower>, KernelError>;
}

pub trait DependOnBorrowerQuery: 'static + Sync + Send + DependOnDatabaseConnection {
    type BorrowerQuery: BorrowerQuery<
        Transaction = <Self::DatabaseConnection as DatabaseConnection>::Transaction,
    >;
    fn borrower_query(&self) -> &Self::BorrowerQuery;
}
