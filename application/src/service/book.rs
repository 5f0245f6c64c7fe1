use error_stack::Report;

use kernel::interface::database::{
    DatabaseConnection, DependOnDatabaseConnection, Transaction,
};
use kernel::interface::query::{BookQuery, DependOnBookQuery};
use kernel::interface::update::{
    BookModifier, BorrowRecordModifier, DependOnBookModifier, DependOnBorrowRecordModifier,
};
use kernel::prelude::entity::{BookAuthor, BookGenre, BookId, BookTitle};
use kernel::KernelError;

use crate::service::abort;
use crate::transfer::{
    BookDto, CreateBookDto, DeleteBookDto, GetAllBookDto, GetBookDto, GetBooksByAuthorDto,
    GetBooksByTitleDto, UpdateBookDto,
};
use crate::validate;

#[async_trait::async_trait]
pub trait GetBookService: 'static + Sync + Send + DependOnBookQuery {
    async fn get_book(&self, dto: GetBookDto) -> error_stack::Result<BookDto, KernelError> {
        let id = BookId::new(validate::positive_id(dto.id, "book id")?);
        let mut connection = self.database_connection().transact().await?;

        let book = self.book_query().find_by_id(&mut connection, &id).await?;
        book.map(BookDto::from).ok_or_else(|| {
            Report::new(KernelError::BookNotFound).attach_printable(format!("book id {}", dto.id))
        })
    }

    async fn get_all_books(
        &self,
        dto: GetAllBookDto,
    ) -> error_stack::Result<Vec<BookDto>, KernelError> {
        let (limit, offset) = validate::page(dto.limit, dto.offset)?;
        let mut connection = self.database_connection().transact().await?;

        let books = self
            .book_query()
            .find_all(&mut connection, &limit, &offset)
            .await?;
        Ok(books.into_iter().map(BookDto::from).collect())
    }

    /// Case-insensitive exact title match.
    async fn get_books_by_title(
        &self,
        dto: GetBooksByTitleDto,
    ) -> error_stack::Result<Vec<BookDto>, KernelError> {
        let title = BookTitle::new(validate::non_blank(dto.title, "title")?);
        let mut connection = self.database_connection().transact().await?;

        let books = self
            .book_query()
            .find_by_title(&mut connection, &title)
            .await?;
        Ok(books.into_iter().map(BookDto::from).collect())
    }

    async fn get_authors(&self) -> error_stack::Result<Vec<String>, KernelError> {
        let mut connection = self.database_connection().transact().await?;

        let authors = self.book_query().find_authors(&mut connection).await?;
        Ok(authors.into_iter().map(String::from).collect())
    }

    async fn get_books_by_author(
        &self,
        dto: GetBooksByAuthorDto,
    ) -> error_stack::Result<Vec<BookDto>, KernelError> {
        let author = BookAuthor::new(validate::non_blank(dto.author, "author")?);
        let mut connection = self.database_connection().transact().await?;

        let books = self
            .book_query()
            .find_by_author(&mut connection, &author)
            .await?;
        Ok(books.into_iter().map(BookDto::from).collect())
    }
}

impl<T> GetBookService for T where T: DependOnBookQuery {}

#[async_trait::async_trait]
pub trait CreateBookService: 'static + Sync + Send + DependOnBookModifier {
    async fn create_book(&self, dto: CreateBookDto) -> error_stack::Result<i64, KernelError> {
        let title = BookTitle::new(validate::non_blank(dto.title, "title")?);
        let author = BookAuthor::new(validate::non_blank(dto.author, "author")?);
        let genre = BookGenre::new(validate::non_blank(dto.genre, "genre")?);
        let mut connection = self.database_connection().transact().await?;

        let id = self
            .book_modifier()
            .create(&mut connection, &title, &author, &genre)
            .await?;
        connection.commit().await?;

        tracing::info!("book {} added to the catalog", id.as_ref());
        Ok(id.into())
    }
}

impl<T> CreateBookService for T where T: DependOnBookModifier {}

#[async_trait::async_trait]
pub trait UpdateBookService:
    'static + Sync + Send + DependOnBookQuery + DependOnBookModifier
{
    /// Edits catalog attributes. Availability is owned by checkout and return.
    async fn update_book(&self, dto: UpdateBookDto) -> error_stack::Result<BookDto, KernelError> {
        let id = BookId::new(validate::positive_id(dto.id, "book id")?);
        let title = dto
            .title
            .map(|title| validate::non_blank(title, "title"))
            .transpose()?;
        let author = dto
            .author
            .map(|author| validate::non_blank(author, "author"))
            .transpose()?;
        let genre = dto
            .genre
            .map(|genre| validate::non_blank(genre, "genre"))
            .transpose()?;
        let mut connection = self.database_connection().transact().await?;

        let Some(mut book) = self.book_query().find_by_id(&mut connection, &id).await? else {
            let report = Report::new(KernelError::BookNotFound)
                .attach_printable(format!("book id {}", dto.id));
            return abort(connection, report).await;
        };
        book.substitute(|book| {
            if let Some(title) = title {
                *book.title = BookTitle::new(title);
            }
            if let Some(author) = author {
                *book.author = BookAuthor::new(author);
            }
            if let Some(genre) = genre {
                *book.genre = BookGenre::new(genre);
            }
        });
        self.book_modifier().update(&mut connection, &book).await?;
        connection.commit().await?;

        Ok(BookDto::from(book))
    }
}

impl<T> UpdateBookService for T where T: DependOnBookQuery + DependOnBookModifier {}

#[async_trait::async_trait]
pub trait DeleteBookService:
    'static + Sync + Send + DependOnBookModifier + DependOnBorrowRecordModifier
{
    /// Removes the book together with its whole borrow history.
    ///
    /// The book row is locked first, so a checkout either commits before the
    /// history is removed or observes the book as gone.
    async fn delete_book(&self, dto: DeleteBookDto) -> error_stack::Result<(), KernelError> {
        let id = BookId::new(validate::positive_id(dto.id, "book id")?);
        let mut connection = self.database_connection().transact().await?;

        if self.book_modifier().lock(&mut connection, &id).await?.is_none() {
            let report = Report::new(KernelError::BookNotFound)
                .attach_printable(format!("book id {}", dto.id));
            return abort(connection, report).await;
        }
        let removed = self
            .borrow_record_modifier()
            .delete_by_book_id(&mut connection, &id)
            .await?;
        if let Err(report) = self.book_modifier().delete(&mut connection, &id).await {
            return abort(connection, report).await;
        }
        connection.commit().await?;

        tracing::info!(
            "book {} deleted with {} borrow record(s)",
            id.as_ref(),
            removed
        );
        Ok(())
    }
}

impl<T> DeleteBookService for T where T: DependOnBookModifier + DependOnBorrowRecordModifier {}
