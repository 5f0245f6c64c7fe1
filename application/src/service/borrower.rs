use error_stack::Report;

use kernel::interface::database::{
    DatabaseConnection, DependOnDatabaseConnection, Transaction,
};
use kernel::interface::query::{BorrowerQuery, DependOnBorrowerQuery};
use kernel::interface::update::{BorrowerModifier, DependOnBorrowerModifier};
use kernel::prelude::entity::{BorrowerEmail, BorrowerId, BorrowerName};
use kernel::KernelError;

use crate::service::abort;
use crate::transfer::{
    BorrowerDto, GetAllBorrowerDto, GetBorrowerByEmailDto, GetBorrowerDto, RegisterBorrowerDto,
};
use crate::validate;

#[async_trait::async_trait]
pub trait RegisterBorrowerService:
    'static + Sync + Send + DependOnBorrowerQuery + DependOnBorrowerModifier
{
    async fn register_borrower(
        &self,
        dto: RegisterBorrowerDto,
    ) -> error_stack::Result<i64, KernelError> {
        let name = BorrowerName::new(validate::non_blank(dto.name, "name")?);
        let email = BorrowerEmail::new(validate::email(dto.email)?);
        let mut connection = self.database_connection().transact().await?;

        let existing = self
            .borrower_query()
            .find_by_email(&mut connection, &email)
            .await?;
        if !existing.is_empty() {
            tracing::debug!("rejected registration for taken email {}", email.as_ref());
            let report = Report::new(KernelError::DuplicateEmail)
                .attach_printable(format!("email {}", email.as_ref()));
            return abort(connection, report).await;
        }

        let id = self
            .borrower_modifier()
            .create(&mut connection, &name, &email)
            .await?;
        connection.commit().await?;

        tracing::info!("borrower {} registered", id.as_ref());
        Ok(id.into())
    }
}

impl<T> RegisterBorrowerService for T where T: DependOnBorrowerQuery + DependOnBorrowerModifier {}

#[async_trait::async_trait]
pub trait GetBorrowerService: 'static + Sync + Send + DependOnBorrowerQuery {
    async fn get_borrower(
        &self,
        dto: GetBorrowerDto,
    ) -> error_stack::Result<BorrowerDto, KernelError> {
        let id = BorrowerId::new(validate::positive_id(dto.id, "borrower id")?);
        let mut connection = self.database_connection().transact().await?;

        let borrower = self.borrower_query().find_by_id(&mut connection, &id).await?;
        borrower.map(BorrowerDto::from).ok_or_else(|| {
            Report::new(KernelError::BorrowerNotFound)
                .attach_printable(format!("borrower id {}", dto.id))
        })
    }

    /// Resolves an email to exactly one borrower.
    ///
    /// Several matches are reported as [`KernelError::AmbiguousEmail`] instead of
    /// picking one of them.
    async fn get_borrower_by_email(
        &self,
        dto: GetBorrowerByEmailDto,
    ) -> error_stack::Result<BorrowerDto, KernelError> {
        let email = BorrowerEmail::new(validate::email(dto.email)?);
        let mut connection = self.database_connection().transact().await?;

        let mut found = self
            .borrower_query()
            .find_by_email(&mut connection, &email)
            .await?;
        match found.len() {
            0 => Err(Report::new(KernelError::BorrowerNotFound)
                .attach_printable(format!("email {}", email.as_ref()))),
            1 => Ok(BorrowerDto::from(found.remove(0))),
            matches => Err(Report::new(KernelError::AmbiguousEmail)
                .attach_printable(format!("email {} matches {matches} borrowers", email.as_ref()))),
        }
    }

    async fn get_all_borrowers(
        &self,
        dto: GetAllBorrowerDto,
    ) -> error_stack::Result<Vec<BorrowerDto>, KernelError> {
        let (limit, offset) = validate::page(dto.limit, dto.offset)?;
        let mut connection = self.database_connection().transact().await?;

        let borrowers = self
            .borrower_query()
            .find_all(&mut connection, &limit, &offset)
            .await?;
        Ok(borrowers.into_iter().map(BorrowerDto::from).collect())
    }
}

impl<T> GetBorrowerService for T where T: DependOnBorrowerQuery {}
