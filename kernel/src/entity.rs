mod book;
mod borrow_record;
mod borrower;
mod common;

pub use self::{book::*, borrow_record::*, borrower::*, common::*};
