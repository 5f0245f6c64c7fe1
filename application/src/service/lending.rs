use error_stack::Report;

use kernel::interface::database::{
    DatabaseConnection, DependOnDatabaseConnection, Transaction,
};
use kernel::interface::query::{
    BookQuery, BorrowRecordQuery, BorrowerQuery, DependOnBookQuery, DependOnBorrowRecordQuery,
    DependOnBorrowerQuery,
};
use kernel::interface::update::{
    BookModifier, BorrowRecordModifier, DependOnBookModifier, DependOnBorrowRecordModifier,
};
use kernel::prelude::entity::{
    BookId, BookStatus, BorrowRecord, BorrowedAt, BorrowerId, ReturnedAt,
};
use kernel::KernelError;

use crate::service::abort;
use crate::transfer::{
    BorrowRecordDto, CheckoutDto, GetBorrowsFromBookDto, GetBorrowsFromBorrowerDto, ReturnDto,
};
use crate::validate;

#[async_trait::async_trait]
pub trait CheckoutService:
    'static
    + Sync
    + Send
    + DependOnBookModifier
    + DependOnBorrowerQuery
    + DependOnBorrowRecordQuery
    + DependOnBorrowRecordModifier
{
    /// Marks the book borrowed and opens a borrow record in one transaction.
    ///
    /// Checks run in order: book exists, borrower exists, book is available.
    async fn checkout(&self, dto: CheckoutDto) -> error_stack::Result<BorrowRecordDto, KernelError> {
        let book_id = BookId::new(validate::positive_id(dto.book_id, "book id")?);
        let borrower_id = BorrowerId::new(validate::positive_id(dto.borrower_id, "borrower id")?);
        let borrowed_at = BorrowedAt::new(dto.date);
        let mut connection = self.database_connection().transact().await?;

        if self.book_modifier().lock(&mut connection, &book_id).await?.is_none() {
            let report = Report::new(KernelError::BookNotFound)
                .attach_printable(format!("book id {}", dto.book_id));
            return abort(connection, report).await;
        }

        let borrower = self
            .borrower_query()
            .find_by_id(&mut connection, &borrower_id)
            .await?;
        if borrower.is_none() {
            let report = Report::new(KernelError::BorrowerNotFound)
                .attach_printable(format!("borrower id {}", dto.borrower_id));
            return abort(connection, report).await;
        }

        let claimed = self
            .book_modifier()
            .change_status(
                &mut connection,
                &book_id,
                &BookStatus::Available,
                &BookStatus::Borrowed,
            )
            .await?;
        if !claimed {
            let holder = self
                .borrow_record_query()
                .find_open_by_book(&mut connection, &book_id)
                .await?;
            let report = Report::new(KernelError::AlreadyBorrowed)
                .attach_printable(format!("book id {}", dto.book_id));
            let report = match holder {
                Some(record) => report.attach_printable(format!(
                    "held by borrower {} since {}",
                    record.borrower_id().as_ref(),
                    record.borrowed_at().as_ref()
                )),
                None => report,
            };
            tracing::debug!("checkout of book {} rejected: {}", dto.book_id, report.current_context());
            return abort(connection, report).await;
        }

        let id = self
            .borrow_record_modifier()
            .create(&mut connection, &book_id, &borrower_id, &borrowed_at)
            .await?;
        connection.commit().await?;

        tracing::info!(
            "book {} checked out by borrower {} (record {})",
            dto.book_id,
            dto.borrower_id,
            id.as_ref()
        );
        Ok(BorrowRecordDto::from(BorrowRecord::new(
            id,
            book_id,
            borrower_id,
            borrowed_at,
            None,
        )))
    }
}

impl<T> CheckoutService for T where
    T: DependOnBookModifier
        + DependOnBorrowerQuery
        + DependOnBorrowRecordQuery
        + DependOnBorrowRecordModifier
{
}

#[async_trait::async_trait]
pub trait ReturnService:
    'static + Sync + Send + DependOnBookModifier + DependOnBorrowRecordQuery + DependOnBorrowRecordModifier
{
    /// Closes the open record of `(book, borrower)` and makes the book available again.
    async fn return_book(&self, dto: ReturnDto) -> error_stack::Result<BorrowRecordDto, KernelError> {
        let book_id = BookId::new(validate::positive_id(dto.book_id, "book id")?);
        let borrower_id = BorrowerId::new(validate::positive_id(dto.borrower_id, "borrower id")?);
        let returned_at = ReturnedAt::new(dto.date);
        let mut connection = self.database_connection().transact().await?;

        // Same lock order as checkout and delete: book row before records.
        self.book_modifier().lock(&mut connection, &book_id).await?;
        let open = self
            .borrow_record_query()
            .find_open(&mut connection, &book_id, &borrower_id)
            .await?;
        let Some(record) = open else {
            tracing::debug!(
                "return of book {} by borrower {} rejected: nothing open",
                dto.book_id,
                dto.borrower_id
            );
            let report = Report::new(KernelError::NoOpenBorrowRecord).attach_printable(format!(
                "book id {} borrower id {}",
                dto.book_id, dto.borrower_id
            ));
            return abort(connection, report).await;
        };

        if returned_at.as_ref() < record.borrowed_at().as_ref() {
            let report = Report::new(KernelError::Validation).attach_printable(format!(
                "return date {} precedes borrow date {}",
                dto.date,
                record.borrowed_at().as_ref()
            ));
            return abort(connection, report).await;
        }

        let closed = self
            .borrow_record_modifier()
            .close(&mut connection, record.id(), &returned_at)
            .await?;
        if !closed {
            let report = Report::new(KernelError::NoOpenBorrowRecord)
                .attach_printable(format!("record {} closed concurrently", record.id().as_ref()));
            return abort(connection, report).await;
        }

        let released = self
            .book_modifier()
            .change_status(
                &mut connection,
                &book_id,
                &BookStatus::Borrowed,
                &BookStatus::Available,
            )
            .await?;
        if !released {
            let report = Report::new(KernelError::Internal).attach_printable(format!(
                "book {} has an open record but is not marked borrowed",
                dto.book_id
            ));
            return abort(connection, report).await;
        }
        connection.commit().await?;

        tracing::info!(
            "book {} returned by borrower {} (record {})",
            dto.book_id,
            dto.borrower_id,
            record.id().as_ref()
        );
        let closed = record.reconstruct(|r| r.returned_at = Some(returned_at));
        Ok(BorrowRecordDto::from(closed))
    }
}

impl<T> ReturnService for T where
    T: DependOnBookModifier + DependOnBorrowRecordQuery + DependOnBorrowRecordModifier
{
}

#[async_trait::async_trait]
pub trait GetBorrowRecordService:
    'static + Sync + Send + DependOnBookQuery + DependOnBorrowerQuery + DependOnBorrowRecordQuery
{
    async fn get_open_borrows(
        &self,
        dto: GetBorrowsFromBorrowerDto,
    ) -> error_stack::Result<Vec<BorrowRecordDto>, KernelError> {
        let borrower_id = BorrowerId::new(validate::positive_id(dto.borrower_id, "borrower id")?);
        let mut connection = self.database_connection().transact().await?;

        ensure_borrower(self, &mut connection, &borrower_id).await?;
        let records = self
            .borrow_record_query()
            .find_open_by_borrower(&mut connection, &borrower_id)
            .await?;
        Ok(records.into_iter().map(BorrowRecordDto::from).collect())
    }

    async fn get_borrow_history(
        &self,
        dto: GetBorrowsFromBorrowerDto,
    ) -> error_stack::Result<Vec<BorrowRecordDto>, KernelError> {
        let borrower_id = BorrowerId::new(validate::positive_id(dto.borrower_id, "borrower id")?);
        let mut connection = self.database_connection().transact().await?;

        ensure_borrower(self, &mut connection, &borrower_id).await?;
        let records = self
            .borrow_record_query()
            .find_by_borrower(&mut connection, &borrower_id)
            .await?;
        Ok(records.into_iter().map(BorrowRecordDto::from).collect())
    }

    async fn get_book_history(
        &self,
        dto: GetBorrowsFromBookDto,
    ) -> error_stack::Result<Vec<BorrowRecordDto>, KernelError> {
        let book_id = BookId::new(validate::positive_id(dto.book_id, "book id")?);
        let mut connection = self.database_connection().transact().await?;

        if self.book_query().find_by_id(&mut connection, &book_id).await?.is_none() {
            return Err(Report::new(KernelError::BookNotFound)
                .attach_printable(format!("book id {}", dto.book_id)));
        }
        let records = self
            .borrow_record_query()
            .find_by_book(&mut connection, &book_id)
            .await?;
        Ok(records.into_iter().map(BorrowRecordDto::from).collect())
    }
}

impl<T> GetBorrowRecordService for T where
    T: DependOnBookQuery + DependOnBorrowerQuery + DependOnBorrowRecordQuery
{
}

async fn ensure_borrower<T>(
    module: &T,
    connection: &mut <T::DatabaseConnection as DatabaseConnection>::Transaction,
    borrower_id: &BorrowerId,
) -> error_stack::Result<(), KernelError>
where
    T: DependOnBorrowerQuery + ?Sized,
{
    match module.borrower_query().find_by_id(connection, borrower_id).await? {
        Some(_) => Ok(()),
        None => Err(Report::new(KernelError::BorrowerNotFound)
            .attach_printable(format!("borrower id {}", borrower_id.as_ref()))),
    }
}
