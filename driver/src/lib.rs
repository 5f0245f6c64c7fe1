use error_stack::Report;
use kernel::KernelError;

pub mod database;
pub mod error;

pub(crate) fn env(key: &str) -> error_stack::Result<String, KernelError> {
    dotenvy::var(key).map_err(|error| {
        Report::new(error)
            .change_context(KernelError::Internal)
            .attach_printable(format!("Env {} not specified", key))
    })
}
