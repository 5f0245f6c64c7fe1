use std::fmt::Display;

use error_stack::Context;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KernelError {
    BookNotFound,
    BorrowerNotFound,
    AlreadyBorrowed,
    NoOpenBorrowRecord,
    DuplicateEmail,
    AmbiguousEmail,
    Validation,
    Concurrency,
    Timeout,
    Internal,
}

/// Coarse classification callers can branch on without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Validation,
    StorageFailure,
}

impl KernelError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            KernelError::BookNotFound | KernelError::BorrowerNotFound => ErrorKind::NotFound,
            KernelError::AlreadyBorrowed
            | KernelError::NoOpenBorrowRecord
            | KernelError::DuplicateEmail
            | KernelError::AmbiguousEmail => ErrorKind::Conflict,
            KernelError::Validation => ErrorKind::Validation,
            KernelError::Concurrency | KernelError::Timeout | KernelError::Internal => {
                ErrorKind::StorageFailure
            }
        }
    }
}

impl Display for KernelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KernelError::BookNotFound => write!(f, "Book not found"),
            KernelError::BorrowerNotFound => write!(f, "Borrower not found"),
            KernelError::AlreadyBorrowed => write!(f, "Book is already borrowed"),
            KernelError::NoOpenBorrowRecord => write!(f, "No open borrow record"),
            KernelError::DuplicateEmail => write!(f, "Email is already registered"),
            KernelError::AmbiguousEmail => write!(f, "Email matches several borrowers"),
            KernelError::Validation => write!(f, "Invalid input"),
            KernelError::Concurrency => write!(f, "Concurrency error"),
            KernelError::Timeout => write!(f, "Process timed out"),
            KernelError::Internal => write!(f, "Internal kernel error"),
        }
    }
}

impl Context for KernelError {}
