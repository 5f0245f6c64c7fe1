use error_stack::Report;
use sqlx::PgConnection;

use kernel::interface::query::BorrowerQuery;
use kernel::interface::update::BorrowerModifier;
use kernel::prelude::entity::{
    Borrower, BorrowerEmail, BorrowerId, BorrowerName, SelectLimit, SelectOffset,
};
use kernel::KernelError;

use crate::database::postgres::PostgresTransaction;
use crate::error::ConvertError;

pub struct PostgresBorrowerRepository;

#[async_trait::async_trait]
impl BorrowerQuery for PostgresBorrowerRepository {
    type Transaction = PostgresTransaction;

    async fn find_by_id(
        &self,
        con: &mut PostgresTransaction,
        id: &BorrowerId,
    ) -> error_stack::Result<Option<Borrower>, KernelError> {
        PgBorrowerInternal::find_by_id(con, id).await
    }

    async fn find_by_email(
        &self,
        con: &mut PostgresTransaction,
        email: &BorrowerEmail,
    ) -> error_stack::Result<Vec<Borrower>, KernelError> {
        PgBorrowerInternal::find_by_email(con, email).await
    }

    async fn find_all(
        &self,
        con: &mut PostgresTransaction,
        limit: &SelectLimit,
        offset: &SelectOffset,
    ) -> error_stack::Result<Vec<Borrower>, KernelError> {
        PgBorrowerInternal::find_all(con, limit, offset).await
    }
}

#[async_trait::async_trait]
impl BorrowerModifier for PostgresBorrowerRepository {
    type Transaction = PostgresTransaction;

    async fn create(
        &self,
        con: &mut PostgresTransaction,
        name: &BorrowerName,
        email: &BorrowerEmail,
    ) -> error_stack::Result<BorrowerId, KernelError> {
        PgBorrowerInternal::create(con, name, email).await
    }

    async fn update(
        &self,
        con: &mut PostgresTransaction,
        borrower: &Borrower,
    ) -> error_stack::Result<(), KernelError> {
        PgBorrowerInternal::update(con, borrower).await
    }

    async fn delete(
        &self,
        con: &mut PostgresTransaction,
        borrower_id: &BorrowerId,
    ) -> error_stack::Result<(), KernelError> {
        PgBorrowerInternal::delete(con, borrower_id).await
    }
}

#[derive(sqlx::FromRow)]
struct BorrowerRow {
    id: i64,
    name: String,
    email: String,
}

impl From<BorrowerRow> for Borrower {
    fn from(value: BorrowerRow) -> Self {
        Borrower::new(
            BorrowerId::new(value.id),
            BorrowerName::new(value.name),
            BorrowerEmail::new(value.email),
        )
    }
}

pub(in crate::database) struct PgBorrowerInternal;

impl PgBorrowerInternal {
    async fn find_by_id(
        con: &mut PgConnection,
        id: &BorrowerId,
    ) -> error_stack::Result<Option<Borrower>, KernelError> {
        let row = sqlx::query_as::<_, BorrowerRow>(
            // language=postgresql
            r#"
            SELECT id, name, email
            FROM borrowers
            WHERE id = $1
            "#,
        )
        .bind(id.as_ref())
        .fetch_optional(con)
        .await
        .convert_error()?;
        Ok(row.map(Borrower::from))
    }

    async fn find_by_email(
        con: &mut PgConnection,
        email: &BorrowerEmail,
    ) -> error_stack::Result<Vec<Borrower>, KernelError> {
        let rows = sqlx::query_as::<_, BorrowerRow>(
            // language=postgresql
            r#"
            SELECT id, name, email
            FROM borrowers
            WHERE email = $1
            ORDER BY id
            "#,
        )
        .bind(email.as_ref())
        .fetch_all(con)
        .await
        .convert_error()?;
        Ok(rows.into_iter().map(Borrower::from).collect())
    }

    async fn find_all(
        con: &mut PgConnection,
        limit: &SelectLimit,
        offset: &SelectOffset,
    ) -> error_stack::Result<Vec<Borrower>, KernelError> {
        let rows = sqlx::query_as::<_, BorrowerRow>(
            // language=postgresql
            r#"
            SELECT id, name, email
            FROM borrowers
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit.as_ref())
        .bind(offset.as_ref())
        .fetch_all(con)
        .await
        .convert_error()?;
        Ok(rows.into_iter().map(Borrower::from).collect())
    }

    async fn create(
        con: &mut PgConnection,
        name: &BorrowerName,
        email: &BorrowerEmail,
    ) -> error_stack::Result<BorrowerId, KernelError> {
        let id = sqlx::query_scalar::<_, i64>(
            // language=postgresql
            r#"
            INSERT INTO borrowers (name, email)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(name.as_ref())
        .bind(email.as_ref())
        .fetch_one(con)
        .await
        .convert_error()?;
        Ok(BorrowerId::new(id))
    }

    async fn update(
        con: &mut PgConnection,
        borrower: &Borrower,
    ) -> error_stack::Result<(), KernelError> {
        let result = sqlx::query(
            // language=postgresql
            r#"
            UPDATE borrowers
            SET name = $2, email = $3
            WHERE id = $1
            "#,
        )
        .bind(borrower.id().as_ref())
        .bind(borrower.name().as_ref())
        .bind(borrower.email().as_ref())
        .execute(con)
        .await
        .convert_error()?;
        if result.rows_affected() == 0 {
            return Err(Report::new(KernelError::BorrowerNotFound)
                .attach_printable(format!("borrower id {}", borrower.id().as_ref())));
        }
        Ok(())
    }

    async fn delete(
        con: &mut PgConnection,
        borrower_id: &BorrowerId,
    ) -> error_stack::Result<(), KernelError> {
        let result = sqlx::query(
            // language=postgresql
            r#"
            DELETE FROM borrowers
            WHERE id = $1
            "#,
        )
        .bind(borrower_id.as_ref())
        .execute(con)
        .await
        .convert_error()?;
        if result.rows_affected() == 0 {
            return Err(Report::new(KernelError::BorrowerNotFound)
                .attach_printable(format!("borrower id {}", borrower_id.as_ref())));
        }
        Ok(())
    }
}
