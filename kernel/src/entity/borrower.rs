mod email;
mod id;
mod name;

pub use self::{email::*, id::*, name::*};
use destructure::{Destructure, Mutation};
use serde::{Deserialize, Serialize};
use vodca::References;

#[derive(
    Debug, Clone, Eq, PartialEq, Serialize, Deserialize, References, Destructure, Mutation,
)]
pub struct Borrower {
    id: BorrowerId,
    name: BorrowerName,
    email: BorrowerEmail,
}

impl Borrower {
    pub fn new(id: BorrowerId, name: BorrowerName, email: BorrowerEmail) -> Self {
        Self { id, name, email }
    }
}
