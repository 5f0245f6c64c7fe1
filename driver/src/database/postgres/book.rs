use error_stack::Report;
use sqlx::PgConnection;

use kernel::interface::query::BookQuery;
use kernel::interface::update::BookModifier;
use kernel::prelude::entity::{
    Book, BookAuthor, BookGenre, BookId, BookStatus, BookTitle, SelectLimit, SelectOffset,
};
use kernel::KernelError;

use crate::database::postgres::PostgresTransaction;
use crate::error::ConvertError;

pub struct PostgresBookRepository;

#[async_trait::async_trait]
impl BookQuery for PostgresBookRepository {
    type Transaction = PostgresTransaction;

    async fn find_by_id(
        &self,
        con: &mut PostgresTransaction,
        id: &BookId,
    ) -> error_stack::Result<Option<Book>, KernelError> {
        PgBookInternal::find_by_id(con, id).await
    }

    async fn find_all(
        &self,
        con: &mut PostgresTransaction,
        limit: &SelectLimit,
        offset: &SelectOffset,
    ) -> error_stack::Result<Vec<Book>, KernelError> {
        PgBookInternal::find_all(con, limit, offset).await
    }

    async fn find_by_author(
        &self,
        con: &mut PostgresTransaction,
        author: &BookAuthor,
    ) -> error_stack::Result<Vec<Book>, KernelError> {
        PgBookInternal::find_by_author(con, author).await
    }

    async fn find_by_title(
        &self,
        con: &mut PostgresTransaction,
        title: &BookTitle,
    ) -> error_stack::Result<Vec<Book>, KernelError> {
        PgBookInternal::find_by_title(con, title).await
    }

    async fn find_authors(
        &self,
        con: &mut PostgresTransaction,
    ) -> error_stack::Result<Vec<BookAuthor>, KernelError> {
        PgBookInternal::find_authors(con).await
    }
}

#[async_trait::async_trait]
impl BookModifier for PostgresBookRepository {
    type Transaction = PostgresTransaction;

    async fn create(
        &self,
        con: &mut PostgresTransaction,
        title: &BookTitle,
        author: &BookAuthor,
        genre: &BookGenre,
    ) -> error_stack::Result<BookId, KernelError> {
        PgBookInternal::create(con, title, author, genre).await
    }

    async fn lock(
        &self,
        con: &mut PostgresTransaction,
        book_id: &BookId,
    ) -> error_stack::Result<Option<Book>, KernelError> {
        PgBookInternal::lock(con, book_id).await
    }

    async fn update(
        &self,
        con: &mut PostgresTransaction,
        book: &Book,
    ) -> error_stack::Result<(), KernelError> {
        PgBookInternal::update(con, book).await
    }

    async fn delete(
        &self,
        con: &mut PostgresTransaction,
        book_id: &BookId,
    ) -> error_stack::Result<(), KernelError> {
        PgBookInternal::delete(con, book_id).await
    }

    async fn change_status(
        &self,
        con: &mut PostgresTransaction,
        book_id: &BookId,
        expected: &BookStatus,
        next: &BookStatus,
    ) -> error_stack::Result<bool, KernelError> {
        PgBookInternal::change_status(con, book_id, expected, next).await
    }
}

#[derive(sqlx::FromRow)]
struct BookRow {
    id: i64,
    title: String,
    author: String,
    genre: String,
    is_borrowed: bool,
}

impl From<BookRow> for Book {
    fn from(value: BookRow) -> Self {
        Book::new(
            BookId::new(value.id),
            BookTitle::new(value.title),
            BookAuthor::new(value.author),
            BookGenre::new(value.genre),
            BookStatus::from(value.is_borrowed),
        )
    }
}

pub(in crate::database) struct PgBookInternal;

impl PgBookInternal {
    async fn find_by_id(
        con: &mut PgConnection,
        id: &BookId,
    ) -> error_stack::Result<Option<Book>, KernelError> {
        let row = sqlx::query_as::<_, BookRow>(
            // language=postgresql
            r#"
            SELECT id, title, author, genre, is_borrowed
            FROM books
            WHERE id = $1
            "#,
        )
        .bind(id.as_ref())
        .fetch_optional(con)
        .await
        .convert_error()?;
        Ok(row.map(Book::from))
    }

    async fn find_all(
        con: &mut PgConnection,
        limit: &SelectLimit,
        offset: &SelectOffset,
    ) -> error_stack::Result<Vec<Book>, KernelError> {
        let rows = sqlx::query_as::<_, BookRow>(
            // language=postgresql
            r#"
            SELECT id, title, author, genre, is_borrowed
            FROM books
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit.as_ref())
        .bind(offset.as_ref())
        .fetch_all(con)
        .await
        .convert_error()?;
        Ok(rows.into_iter().map(Book::from).collect())
    }

    async fn find_by_author(
        con: &mut PgConnection,
        author: &BookAuthor,
    ) -> error_stack::Result<Vec<Book>, KernelError> {
        let rows = sqlx::query_as::<_, BookRow>(
            // language=postgresql
            r#"
            SELECT id, title, author, genre, is_borrowed
            FROM books
            WHERE author = $1
            ORDER BY id
            "#,
        )
        .bind(author.as_ref())
        .fetch_all(con)
        .await
        .convert_error()?;
        Ok(rows.into_iter().map(Book::from).collect())
    }

    async fn find_by_title(
        con: &mut PgConnection,
        title: &BookTitle,
    ) -> error_stack::Result<Vec<Book>, KernelError> {
        let rows = sqlx::query_as::<_, BookRow>(
            // language=postgresql
            r#"
            SELECT id, title, author, genre, is_borrowed
            FROM books
            WHERE lower(title) = lower($1)
            ORDER BY id
            "#,
        )
        .bind(title.as_ref())
        .fetch_all(con)
        .await
        .convert_error()?;
        Ok(rows.into_iter().map(Book::from).collect())
    }

    async fn find_authors(con: &mut PgConnection) -> error_stack::Result<Vec<BookAuthor>, KernelError> {
        let authors = sqlx::query_scalar::<_, String>(
            // language=postgresql
            r#"
            SELECT DISTINCT author
            FROM books
            ORDER BY author
            "#,
        )
        .fetch_all(con)
        .await
        .convert_error()?;
        Ok(authors.into_iter().map(BookAuthor::new).collect())
    }

    async fn create(
        con: &mut PgConnection,
        title: &BookTitle,
        author: &BookAuthor,
        genre: &BookGenre,
    ) -> error_stack::Result<BookId, KernelError> {
        let id = sqlx::query_scalar::<_, i64>(
            // language=postgresql
            r#"
            INSERT INTO books (title, author, genre, is_borrowed)
            VALUES ($1, $2, $3, FALSE)
            RETURNING id
            "#,
        )
        .bind(title.as_ref())
        .bind(author.as_ref())
        .bind(genre.as_ref())
        .fetch_one(con)
        .await
        .convert_error()?;
        Ok(BookId::new(id))
    }

    async fn lock(
        con: &mut PgConnection,
        book_id: &BookId,
    ) -> error_stack::Result<Option<Book>, KernelError> {
        let row = sqlx::query_as::<_, BookRow>(
            // language=postgresql
            r#"
            SELECT id, title, author, genre, is_borrowed
            FROM books
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(book_id.as_ref())
        .fetch_optional(con)
        .await
        .convert_error()?;
        Ok(row.map(Book::from))
    }

    async fn update(con: &mut PgConnection, book: &Book) -> error_stack::Result<(), KernelError> {
        let result = sqlx::query(
            // language=postgresql
            r#"
            UPDATE books
            SET title = $2, author = $3, genre = $4
            WHERE id = $1
            "#,
        )
        .bind(book.id().as_ref())
        .bind(book.title().as_ref())
        .bind(book.author().as_ref())
        .bind(book.genre().as_ref())
        .execute(con)
        .await
        .convert_error()?;
        if result.rows_affected() == 0 {
            return Err(Report::new(KernelError::BookNotFound)
                .attach_printable(format!("book id {}", book.id().as_ref())));
        }
        Ok(())
    }

    async fn delete(con: &mut PgConnection, book_id: &BookId) -> error_stack::Result<(), KernelError> {
        let result = sqlx::query(
            // language=postgresql
            r#"
            DELETE FROM books
            WHERE id = $1
            "#,
        )
        .bind(book_id.as_ref())
        .execute(con)
        .await
        .convert_error()?;
        if result.rows_affected() == 0 {
            return Err(Report::new(KernelError::BookNotFound)
                .attach_printable(format!("book id {}", book_id.as_ref())));
        }
        Ok(())
    }

    async fn change_status(
        con: &mut PgConnection,
        book_id: &BookId,
        expected: &BookStatus,
        next: &BookStatus,
    ) -> error_stack::Result<bool, KernelError> {
        // Concurrent writers block on the row lock and re-check the predicate
        // once the first one commits.
        let result = sqlx::query(
            // language=postgresql
            r#"
            UPDATE books
            SET is_borrowed = $3
            WHERE id = $1 AND is_borrowed = $2
            "#,
        )
        .bind(book_id.as_ref())
        .bind(expected.is_borrowed())
        .bind(next.is_borrowed())
        .execute(con)
        .await
        .convert_error()?;
        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
mod test {
    use kernel::interface::database::DatabaseConnection;
    use kernel::interface::query::BookQuery;
    use kernel::interface::update::BookModifier;
    use kernel::prelude::entity::{
        BookAuthor, BookGenre, BookStatus, BookTitle, SelectLimit, SelectOffset,
    };
    use kernel::KernelError;

    use crate::database::postgres::book::PostgresBookRepository;
    use crate::database::postgres::test::connect;

    #[test_with::env(POSTGRES_TEST)]
    #[tokio::test]
    async fn test() -> error_stack::Result<(), KernelError> {
        let db = connect().await?;
        let mut con = db.transact().await?;

        let id = PostgresBookRepository
            .create(
                &mut con,
                &BookTitle::new("Roadside Picnic"),
                &BookAuthor::new("Strugatsky"),
                &BookGenre::new("Science Fiction"),
            )
            .await?;

        let found = PostgresBookRepository
            .find_by_id(&mut con, &id)
            .await?
            .expect("book was just created");
        assert_eq!(found.status(), &BookStatus::Available);
        let by_title = PostgresBookRepository
            .find_by_title(&mut con, &BookTitle::new("roadside PICNIC"))
            .await?;
        assert!(by_title.iter().any(|b| b.id() == &id));

        let book = found.reconstruct(|b| b.title = BookTitle::new("Пикник на обочине"));
        PostgresBookRepository.update(&mut con, &book).await?;
        let found = PostgresBookRepository.find_by_id(&mut con, &id).await?;
        assert_eq!(found, Some(book));

        let by_author = PostgresBookRepository
            .find_by_author(&mut con, &BookAuthor::new("Strugatsky"))
            .await?;
        assert!(by_author.iter().any(|b| b.id() == &id));
        let authors = PostgresBookRepository.find_authors(&mut con).await?;
        assert!(authors.contains(&BookAuthor::new("Strugatsky")));
        let page = PostgresBookRepository
            .find_all(&mut con, &SelectLimit::new(1000), &SelectOffset::default())
            .await?;
        assert!(page.iter().any(|b| b.id() == &id));

        PostgresBookRepository.delete(&mut con, &id).await?;
        let found = PostgresBookRepository.find_by_id(&mut con, &id).await?;
        assert!(found.is_none());

        let report = PostgresBookRepository.delete(&mut con, &id).await.unwrap_err();
        assert_eq!(report.current_context(), &KernelError::BookNotFound);

        Ok(())
    }

    #[test_with::env(POSTGRES_TEST)]
    #[tokio::test]
    async fn change_status_is_conditional() -> error_stack::Result<(), KernelError> {
        let db = connect().await?;
        let mut con = db.transact().await?;
        let id = PostgresBookRepository
            .create(
                &mut con,
                &BookTitle::new("Hard to Be a God"),
                &BookAuthor::new("Strugatsky"),
                &BookGenre::new("Science Fiction"),
            )
            .await?;

        let available = BookStatus::Available;
        let borrowed = BookStatus::Borrowed;
        assert!(PostgresBookRepository.change_status(&mut con, &id, &available, &borrowed).await?);
        assert!(!PostgresBookRepository.change_status(&mut con, &id, &available, &borrowed).await?);
        assert!(PostgresBookRepository.change_status(&mut con, &id, &borrowed, &available).await?);

        let found = PostgresBookRepository.find_by_id(&mut con, &id).await?;
        assert_eq!(found.map(|b| *b.status()), Some(BookStatus::Available));
        let locked = PostgresBookRepository.lock(&mut con, &id).await?;
        assert_eq!(locked.map(|b| *b.id()), Some(id));
        Ok(())
    }
}
