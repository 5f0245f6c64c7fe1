use std::ops::{Deref, DerefMut};

use error_stack::{Report, ResultExt};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Error, PgConnection, Pool, Postgres};

use kernel::interface::database::{DatabaseConnection, Transaction};
use kernel::interface::query::{DependOnBookQuery, DependOnBorrowRecordQuery, DependOnBorrowerQuery};
use kernel::interface::update::{
    DependOnBookModifier, DependOnBorrowRecordModifier, DependOnBorrowerModifier,
};
use kernel::KernelError;

use crate::env;
use crate::error::ConvertError;

pub use self::{book::*, borrow_record::*, borrower::*};

mod book;
mod borrow_record;
mod borrower;

static POSTGRES_URL: &str = "POSTGRES_URL";
static POSTGRES_MAX_CONNECTIONS: &str = "POSTGRES_MAX_CONNECTIONS";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";
const BORROWER_EMAIL_KEY: &str = "borrowers_email_key";

#[derive(Clone)]
pub struct PostgresDatabase {
    pool: Pool<Postgres>,
}

impl PostgresDatabase {
    pub async fn new() -> error_stack::Result<Self, KernelError> {
        let url = env(POSTGRES_URL)?;
        let max_connections = match dotenvy::var(POSTGRES_MAX_CONNECTIONS) {
            Ok(raw) => raw
                .parse::<u32>()
                .change_context_lazy(|| KernelError::Internal)
                .attach_printable_lazy(|| {
                    format!("{} must be a number, got {}", POSTGRES_MAX_CONNECTIONS, raw)
                })?,
            Err(_) => DEFAULT_MAX_CONNECTIONS,
        };
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(&url)
            .await
            .convert_error()?;
        tracing::debug!("postgres pool ready ({} connections)", max_connections);
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> error_stack::Result<(), KernelError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .change_context_lazy(|| KernelError::Internal)
            .attach_printable("Failed to apply migrations")
    }
}

#[async_trait::async_trait]
impl DatabaseConnection for PostgresDatabase {
    type Transaction = PostgresTransaction;
    async fn transact(&self) -> error_stack::Result<Self::Transaction, KernelError> {
        let transaction = self.pool.begin().await.convert_error()?;
        Ok(PostgresTransaction(transaction))
    }
}

/// A pooled connection inside `BEGIN`. Dropped without commit it rolls back.
pub struct PostgresTransaction(sqlx::Transaction<'static, Postgres>);

#[async_trait::async_trait]
impl Transaction for PostgresTransaction {
    async fn commit(self) -> error_stack::Result<(), KernelError> {
        self.0.commit().await.convert_error()
    }

    async fn roll_back(self) -> error_stack::Result<(), KernelError> {
        self.0.rollback().await.convert_error()
    }
}

impl Deref for PostgresTransaction {
    type Target = PgConnection;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for PostgresTransaction {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl DependOnBookQuery for PostgresDatabase {
    type BookQuery = PostgresBookRepository;
    fn book_query(&self) -> &Self::BookQuery {
        &PostgresBookRepository
    }
}

impl DependOnBookModifier for PostgresDatabase {
    type BookModifier = PostgresBookRepository;
    fn book_modifier(&self) -> &Self::BookModifier {
        &PostgresBookRepository
    }
}

impl DependOnBorrowerQuery for PostgresDatabase {
    type BorrowerQuery = PostgresBorrowerRepository;
    fn borrower_query(&self) -> &Self::BorrowerQuery {
        &PostgresBorrowerRepository
    }
}

impl DependOnBorrowerModifier for PostgresDatabase {
    type BorrowerModifier = PostgresBorrowerRepository;
    fn borrower_modifier(&self) -> &Self::BorrowerModifier {
        &PostgresBorrowerRepository
    }
}

impl DependOnBorrowRecordQuery for PostgresDatabase {
    type BorrowRecordQuery = PostgresBorrowRecordRepository;
    fn borrow_record_query(&self) -> &Self::BorrowRecordQuery {
        &PostgresBorrowRecordRepository
    }
}

impl DependOnBorrowRecordModifier for PostgresDatabase {
    type BorrowRecordModifier = PostgresBorrowRecordRepository;
    fn borrow_record_modifier(&self) -> &Self::BorrowRecordModifier {
        &PostgresBorrowRecordRepository
    }
}

impl<T> ConvertError for Result<T, Error> {
    type Ok = T;
    fn convert_error(self) -> error_stack::Result<T, KernelError> {
        self.map_err(|error| {
            let context = match &error {
                Error::PoolTimedOut => KernelError::Timeout,
                Error::Database(database) => match database.code().as_deref() {
                    Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED) => {
                        KernelError::Concurrency
                    }
                    _ if database.is_unique_violation()
                        && database.constraint() == Some(BORROWER_EMAIL_KEY) =>
                    {
                        KernelError::DuplicateEmail
                    }
                    _ => KernelError::Internal,
                },
                _ => KernelError::Internal,
            };
            Report::from(error).change_context(context)
        })
    }
}

#[cfg(test)]
pub(in crate::database) mod test {
    use std::sync::Arc;
    use std::time::Duration;

    use rand::distributions::Alphanumeric;
    use rand::Rng;
    use time::macros::date;

    use application::service::{
        CheckoutService, CreateBookService, DeleteBookService, RegisterBorrowerService,
        ReturnService,
    };
    use application::transfer::{CheckoutDto, CreateBookDto, DeleteBookDto, RegisterBorrowerDto, ReturnDto};
    use kernel::interface::database::{DatabaseConnection, Transaction};
    use kernel::interface::update::{
        BookModifier, BorrowRecordModifier, DependOnBookModifier, DependOnBorrowRecordModifier,
    };
    use kernel::prelude::entity::{BookId, BookStatus, BorrowedAt, BorrowerId};
    use kernel::KernelError;

    use crate::database::postgres::PostgresDatabase;

    pub(in crate::database) async fn connect() -> error_stack::Result<PostgresDatabase, KernelError> {
        let db = PostgresDatabase::new().await?;
        db.migrate().await?;
        Ok(db)
    }

    pub(in crate::database) fn unique_email() -> String {
        let local: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(12)
            .map(char::from)
            .collect();
        format!("{}@test.example", local.to_lowercase())
    }

    #[test_with::env(POSTGRES_TEST)]
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_checkouts_have_one_winner() -> error_stack::Result<(), KernelError> {
        const CALLERS: usize = 6;
        let db = Arc::new(connect().await?);

        let book = db
            .create_book(CreateBookDto {
                title: "Solaris".to_string(),
                author: "Stanislaw Lem".to_string(),
                genre: "Science Fiction".to_string(),
            })
            .await?;
        let mut borrowers = Vec::with_capacity(CALLERS);
        for n in 0..CALLERS {
            let id = db
                .register_borrower(RegisterBorrowerDto {
                    name: format!("Kelvin {n}"),
                    email: unique_email(),
                })
                .await?;
            borrowers.push(id);
        }

        let handles = borrowers
            .iter()
            .map(|&borrower_id| {
                let db = Arc::clone(&db);
                tokio::spawn(async move {
                    db.checkout(CheckoutDto {
                        book_id: book,
                        borrower_id,
                        date: date!(2024 - 04 - 01),
                    })
                    .await
                    .map(|record| record.borrower_id)
                    .map_err(|report| *report.current_context())
                })
            })
            .collect::<Vec<_>>();

        let mut winners = Vec::new();
        for handle in handles {
            match handle.await.expect("checkout task panicked") {
                Ok(borrower_id) => winners.push(borrower_id),
                Err(error) => assert_eq!(error, KernelError::AlreadyBorrowed),
            }
        }
        assert_eq!(winners.len(), 1);

        db.return_book(ReturnDto {
            book_id: book,
            borrower_id: winners[0],
            date: date!(2024 - 04 - 02),
        })
        .await?;
        db.delete_book(DeleteBookDto { id: book }).await?;
        Ok(())
    }

    #[test_with::env(POSTGRES_TEST)]
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn delete_waits_for_an_uncommitted_checkout() -> error_stack::Result<(), KernelError> {
        let db = Arc::new(connect().await?);
        let book = db
            .create_book(CreateBookDto {
                title: "The Invincible".to_string(),
                author: "Stanislaw Lem".to_string(),
                genre: "Science Fiction".to_string(),
            })
            .await?;
        let borrower = db
            .register_borrower(RegisterBorrowerDto {
                name: "Rohan".to_string(),
                email: unique_email(),
            })
            .await?;

        let mut pending = db.transact().await?;
        let claimed = db
            .book_modifier()
            .change_status(
                &mut pending,
                &BookId::new(book),
                &BookStatus::Available,
                &BookStatus::Borrowed,
            )
            .await?;
        assert!(claimed);
        db.borrow_record_modifier()
            .create(
                &mut pending,
                &BookId::new(book),
                &BorrowerId::new(borrower),
                &BorrowedAt::new(date!(2024 - 04 - 01)),
            )
            .await?;

        let deleting = {
            let db = Arc::clone(&db);
            tokio::spawn(async move {
                db.delete_book(DeleteBookDto { id: book })
                    .await
                    .map_err(|report| *report.current_context())
            })
        };
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!deleting.is_finished());

        pending.commit().await?;
        assert_eq!(deleting.await.expect("delete task panicked"), Ok(()));
        Ok(())
    }

    #[test_with::env(POSTGRES_TEST)]
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_returns_have_one_winner() -> error_stack::Result<(), KernelError> {
        let db = Arc::new(connect().await?);
        let book = db
            .create_book(CreateBookDto {
                title: "Fiasco".to_string(),
                author: "Stanislaw Lem".to_string(),
                genre: "Science Fiction".to_string(),
            })
            .await?;
        let borrower = db
            .register_borrower(RegisterBorrowerDto {
                name: "Tempe".to_string(),
                email: unique_email(),
            })
            .await?;
        db.checkout(CheckoutDto {
            book_id: book,
            borrower_id: borrower,
            date: date!(2024 - 04 - 01),
        })
        .await?;

        let handles = (0..2)
            .map(|_| {
                let db = Arc::clone(&db);
                tokio::spawn(async move {
                    db.return_book(ReturnDto {
                        book_id: book,
                        borrower_id: borrower,
                        date: date!(2024 - 04 - 02),
                    })
                    .await
                    .map(|_| ())
                    .map_err(|report| *report.current_context())
                })
            })
            .collect::<Vec<_>>();

        let mut returned = 0;
        for handle in handles {
            match handle.await.expect("return task panicked") {
                Ok(()) => returned += 1,
                Err(error) => assert_eq!(error, KernelError::NoOpenBorrowRecord),
            }
        }
        assert_eq!(returned, 1);

        db.delete_book(DeleteBookDto { id: book }).await?;
        Ok(())
    }
}
