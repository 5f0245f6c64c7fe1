use sqlx::PgConnection;
use time::Date;

use kernel::interface::query::BorrowRecordQuery;
use kernel::interface::update::BorrowRecordModifier;
use kernel::prelude::entity::{
    BookId, BorrowRecord, BorrowRecordId, BorrowedAt, BorrowerId, ReturnedAt,
};
use kernel::KernelError;

use crate::database::postgres::PostgresTransaction;
use crate::error::ConvertError;

pub struct PostgresBorrowRecordRepository;

#[async_trait::async_trait]
impl BorrowRecordQuery for PostgresBorrowRecordRepository {
    type Transaction = PostgresTransaction;

    async fn find_by_id(
        &self,
        con: &mut PostgresTransaction,
        id: &BorrowRecordId,
    ) -> error_stack::Result<Option<BorrowRecord>, KernelError> {
        PgBorrowRecordInternal::find_by_id(con, id).await
    }

    async fn find_open(
        &self,
        con: &mut PostgresTransaction,
        book_id: &BookId,
        borrower_id: &BorrowerId,
    ) -> error_stack::Result<Option<BorrowRecord>, KernelError> {
        PgBorrowRecordInternal::find_open(con, book_id, borrower_id).await
    }

    async fn find_open_by_book(
        &self,
        con: &mut PostgresTransaction,
        book_id: &BookId,
    ) -> error_stack::Result<Option<BorrowRecord>, KernelError> {
        PgBorrowRecordInternal::find_open_by_book(con, book_id).await
    }

    async fn find_open_by_borrower(
        &self,
        con: &mut PostgresTransaction,
        borrower_id: &BorrowerId,
    ) -> error_stack::Result<Vec<BorrowRecord>, KernelError> {
        PgBorrowRecordInternal::find_by_borrower(con, borrower_id, true).await
    }

    async fn find_by_borrower(
        &self,
        con: &mut PostgresTransaction,
        borrower_id: &BorrowerId,
    ) -> error_stack::Result<Vec<BorrowRecord>, KernelError> {
        PgBorrowRecordInternal::find_by_borrower(con, borrower_id, false).await
    }

    async fn find_by_book(
        &self,
        con: &mut PostgresTransaction,
        book_id: &BookId,
    ) -> error_stack::Result<Vec<BorrowRecord>, KernelError> {
        PgBorrowRecordInternal::find_by_book(con, book_id).await
    }
}

#[async_trait::async_trait]
impl BorrowRecordModifier for PostgresBorrowRecordRepository {
    type Transaction = PostgresTransaction;

    async fn create(
        &self,
        con: &mut PostgresTransaction,
        book_id: &BookId,
        borrower_id: &BorrowerId,
        borrowed_at: &BorrowedAt,
    ) -> error_stack::Result<BorrowRecordId, KernelError> {
        PgBorrowRecordInternal::create(con, book_id, borrower_id, borrowed_at).await
    }

    async fn close(
        &self,
        con: &mut PostgresTransaction,
        id: &BorrowRecordId,
        returned_at: &ReturnedAt,
    ) -> error_stack::Result<bool, KernelError> {
        PgBorrowRecordInternal::close(con, id, returned_at).await
    }

    async fn delete_by_book_id(
        &self,
        con: &mut PostgresTransaction,
        book_id: &BookId,
    ) -> error_stack::Result<u64, KernelError> {
        PgBorrowRecordInternal::delete_by_book_id(con, book_id).await
    }
}

#[derive(sqlx::FromRow)]
struct BorrowRecordRow {
    id: i64,
    book_id: i64,
    borrower_id: i64,
    borrow_date: Date,
    return_date: Option<Date>,
}

impl From<BorrowRecordRow> for BorrowRecord {
    fn from(value: BorrowRecordRow) -> Self {
        BorrowRecord::new(
            BorrowRecordId::new(value.id),
            BookId::new(value.book_id),
            BorrowerId::new(value.borrower_id),
            BorrowedAt::new(value.borrow_date),
            value.return_date.map(ReturnedAt::new),
        )
    }
}

pub(in crate::database) struct PgBorrowRecordInternal;

impl PgBorrowRecordInternal {
    async fn find_by_id(
        con: &mut PgConnection,
        id: &BorrowRecordId,
    ) -> error_stack::Result<Option<BorrowRecord>, KernelError> {
        let row = sqlx::query_as::<_, BorrowRecordRow>(
            // language=postgresql
            r#"
            SELECT id, book_id, borrower_id, borrow_date, return_date
            FROM borrow_records
            WHERE id = $1
            "#,
        )
        .bind(id.as_ref())
        .fetch_optional(con)
        .await
        .convert_error()?;
        Ok(row.map(BorrowRecord::from))
    }

    async fn find_open(
        con: &mut PgConnection,
        book_id: &BookId,
        borrower_id: &BorrowerId,
    ) -> error_stack::Result<Option<BorrowRecord>, KernelError> {
        let row = sqlx::query_as::<_, BorrowRecordRow>(
            // language=postgresql
            r#"
            SELECT id, book_id, borrower_id, borrow_date, return_date
            FROM borrow_records
            WHERE book_id = $1 AND borrower_id = $2 AND return_date IS NULL
            "#,
        )
        .bind(book_id.as_ref())
        .bind(borrower_id.as_ref())
        .fetch_optional(con)
        .await
        .convert_error()?;
        Ok(row.map(BorrowRecord::from))
    }

    async fn find_open_by_book(
        con: &mut PgConnection,
        book_id: &BookId,
    ) -> error_stack::Result<Option<BorrowRecord>, KernelError> {
        let row = sqlx::query_as::<_, BorrowRecordRow>(
            // language=postgresql
            r#"
            SELECT id, book_id, borrower_id, borrow_date, return_date
            FROM borrow_records
            WHERE book_id = $1 AND return_date IS NULL
            "#,
        )
        .bind(book_id.as_ref())
        .fetch_optional(con)
        .await
        .convert_error()?;
        Ok(row.map(BorrowRecord::from))
    }

    async fn find_by_borrower(
        con: &mut PgConnection,
        borrower_id: &BorrowerId,
        open_only: bool,
    ) -> error_stack::Result<Vec<BorrowRecord>, KernelError> {
        let rows = sqlx::query_as::<_, BorrowRecordRow>(
            // language=postgresql
            r#"
            SELECT id, book_id, borrower_id, borrow_date, return_date
            FROM borrow_records
            WHERE borrower_id = $1 AND (NOT $2 OR return_date IS NULL)
            ORDER BY borrow_date, id
            "#,
        )
        .bind(borrower_id.as_ref())
        .bind(open_only)
        .fetch_all(con)
        .await
        .convert_error()?;
        Ok(rows.into_iter().map(BorrowRecord::from).collect())
    }

    async fn find_by_book(
        con: &mut PgConnection,
        book_id: &BookId,
    ) -> error_stack::Result<Vec<BorrowRecord>, KernelError> {
        let rows = sqlx::query_as::<_, BorrowRecordRow>(
            // language=postgresql
            r#"
            SELECT id, book_id, borrower_id, borrow_date, return_date
            FROM borrow_records
            WHERE book_id = $1
            ORDER BY borrow_date, id
            "#,
        )
        .bind(book_id.as_ref())
        .fetch_all(con)
        .await
        .convert_error()?;
        Ok(rows.into_iter().map(BorrowRecord::from).collect())
    }

    async fn create(
        con: &mut PgConnection,
        book_id: &BookId,
        borrower_id: &BorrowerId,
        borrowed_at: &BorrowedAt,
    ) -> error_stack::Result<BorrowRecordId, KernelError> {
        let id = sqlx::query_scalar::<_, i64>(
            // language=postgresql
            r#"
            INSERT INTO borrow_records (book_id, borrower_id, borrow_date)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(book_id.as_ref())
        .bind(borrower_id.as_ref())
        .bind(borrowed_at.as_ref())
        .fetch_one(con)
        .await
        .convert_error()?;
        Ok(BorrowRecordId::new(id))
    }

    async fn close(
        con: &mut PgConnection,
        id: &BorrowRecordId,
        returned_at: &ReturnedAt,
    ) -> error_stack::Result<bool, KernelError> {
        let result = sqlx::query(
            // language=postgresql
            r#"
            UPDATE borrow_records
            SET return_date = $2
            WHERE id = $1 AND return_date IS NULL
            "#,
        )
        .bind(id.as_ref())
        .bind(returned_at.as_ref())
        .execute(con)
        .await
        .convert_error()?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete_by_book_id(
        con: &mut PgConnection,
        book_id: &BookId,
    ) -> error_stack::Result<u64, KernelError> {
        let result = sqlx::query(
            // language=postgresql
            r#"
            DELETE FROM borrow_records
            WHERE book_id = $1
            "#,
        )
        .bind(book_id.as_ref())
        .execute(con)
        .await
        .convert_error()?;
        Ok(result.rows_affected())
    }
}
