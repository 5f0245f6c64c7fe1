use crate::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use crate::entity::{Borrower, BorrowerEmail, BorrowerId, BorrowerName};
use crate::KernelError;

#[async_trait::async_trait]
pub trait BorrowerModifier: 'static + Sync + Send {
    type Transaction: Transaction;
    async fn create(
        &self,
        con: &mut Self::Transaction,
        name: &BorrowerName,
        email: &BorrowerEmail,
    ) -> error_stack::Result<BorrowerId, KernelError>;
    async fn update(
        &self,
        con: &mut Self::Transaction,
        borrower: &Borrower,
    ) -> error_stack::Result<(), KernelError>;
    async fn delete(
        &self,
        con: &mut Self::Transaction,
        borrower_id: &BorrowerId,
    ) -> error_stack::Result<(), KernelError>;
}

pub trait DependOnBorrowerModifier: 'static + Sync + Send + DependOnDatabaseConnection {
    type BorrowerModifier: BorrowerModifier<
        Transaction = <Self::DatabaseConnection as DatabaseConnection>::Transaction,
    >;
    fn borrower_modifier(&self) -> &Self::BorrowerModifier;
}
