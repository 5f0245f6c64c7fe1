mod book;
mod borrow_record;
mod borrower;

pub use self::{book::*, borrow_record::*, borrower::*};
