use kernel::prelude::entity::{Borrower, DestructBorrower, SelectLimit, SelectOffset};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BorrowerDto {
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl From<Borrower> for BorrowerDto {
    fn from(value: Borrower) -> Self {
        let DestructBorrower { id, name, email } = value.into_destruct();
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
        }
    }
}

pub struct RegisterBorrowerDto {
    pub name: String,
    pub email: String,
}

pub struct GetBorrowerDto {
    pub id: i64,
}

pub struct GetBorrowerByEmailDto {
    pub email: String,
}

#[derive(Debug, Default)]
pub struct GetAllBorrowerDto {
    pub limit: SelectLimit,
    pub offset: SelectOffset,
}
