mod book;
mod borrower;
mod lending;

pub use self::{book::*, borrower::*, lending::*};
