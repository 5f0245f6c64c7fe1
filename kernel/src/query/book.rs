use crate::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use crate::entity::{Book, BookAuthor, BookId, BookTitle, SelectLimit, SelectOffset};
use crate::KernelError;

#[async_trait::async_trait]
pub trait BookQuery: 'static + Sync + Send {
    type Transaction: Transaction;
    async fn find_by_id(
        &self,
        con: &mut Self::Transaction,
        id: &BookId,
    ) -> error_stack::Result<Option<Book>, KernelError>;
    async fn find_all(
        &self,
        con: &mut Self::Transaction,
        limit: &SelectLimit,
        offset: &SelectOffset,
    ) -> error_stack::Result<Vec<Book>, KernelError>;
    async fn find_by_author(
        &self,
        con: &mut Self::Transaction,
        author: &BookAuthor,
    ) -> error_stack::Result<Vec<Book>, KernelError>;
    /// Books whose title equals `title`, ignoring case, in id order.
    async fn find_by_title(
        &self,
        con: &mut Self::Transaction,
        title: &BookTitle,
    ) -> error_stack::Result<Vec<Book>, KernelError>;
    /// Distinct authors in ascending order.
    async fn find_authors(
        &self,
        con: &mut Self::Transaction,
    ) -> error_stack::Result<Vec<BookAuthor>, KernelError>;
}

pub trait DependOnBookQuery: 'static + Sync + Send + DependOnDatabaseConnection {
    type BookQuery: BookQuery<
        Transaction = <Self::DatabaseConnection as DatabaseConnection>::Transaction,
    >;
    fn book_query(&self) -> &Self::BookQuery;
}
