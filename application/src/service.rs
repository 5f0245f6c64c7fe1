mod book;
mod borrower;
mod lending;

pub use self::{book::*, borrower::*, lending::*};

use error_stack::Report;
use kernel::interface::database::Transaction;
use kernel::KernelError;

/// Rolls the transaction back and returns `report` as the operation's error.
///
/// A failing rollback is only logged so the caller still sees why the
/// operation was rejected.
pub(crate) async fn abort<T, C>(
    connection: C,
    report: Report<KernelError>,
) -> error_stack::Result<T, KernelError>
where
    C: Transaction,
{
    if let Err(rollback) = connection.roll_back().await {
        tracing::warn!("rollback after {} failed: {:?}", report.current_context(), rollback);
    }
    Err(report)
}
