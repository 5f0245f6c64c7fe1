use crate::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use crate::entity::{Book, BookAuthor, BookGenre, BookId, BookStatus, BookTitle};
use crate::KernelError;

#[async_trait::async_trait]
pub trait BookModifier: 'static + Sync + Send {
    type Transaction: Transaction;
    /// Inserts an `Available` book and returns its generated id.
    async fn create(
        &self,
        con: &mut Self::Transaction,
        title: &BookTitle,
        author: &BookAuthor,
        genre: &BookGenre,
    ) -> error_stack::Result<BookId, KernelError>;
    /// Takes the row lock of the book until the transaction ends and returns the
    /// latest committed state, or `None` if the book does not exist.
    ///
    /// Writers that lock the book first never interleave with one another.
    async fn lock(
        &self,
        con: &mut Self::Transaction,
        book_id: &BookId,
    ) -> error_stack::Result<Option<Book>, KernelError>;
    /// Writes title, author and genre. The status column is left untouched.
    ///
    /// Fails with [`KernelError::BookNotFound`] when no row matches.
    async fn update(
        &self,
        con: &mut Self::Transaction,
        book: &Book,
    ) -> error_stack::Result<(), KernelError>;
    /// Fails with [`KernelError::BookNotFound`] when no row matches.
    async fn delete(
        &self,
        con: &mut Self::Transaction,
        book_id: &BookId,
    ) -> error_stack::Result<(), KernelError>;
    /// Sets the status to `next` only if it currently equals `expected`.
    ///
    /// Returns `false` when the book is missing or in another state. Of several
    /// concurrent calls with the same `expected`, at most one returns `true`.
    async fn change_status(
        &self,
        con: &mut Self::Transaction,
        book_id: &BookId,
        expected: &BookStatus,
        next: &BookStatus,
    ) -> error_stack::Result<bool, KernelError>;
}

pub trait DependOnBookModifier: 'static + Sync + Send + DependOnDatabaseConnection {
    type BookModifier: BookModifier<
        Transaction = <Self::DatabaseConnection as DatabaseConnection>::Transaction,
    >;
    fn book_modifier(&self) -> &Self::BookModifier;
}
