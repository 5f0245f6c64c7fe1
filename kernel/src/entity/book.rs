mod author;
mod genre;
mod id;
mod status;
mod title;

pub use self::{author::*, genre::*, id::*, status::*, title::*};
use destructure::{Destructure, Mutation};
use serde::{Deserialize, Serialize};
use vodca::References;

#[derive(
    Debug, Clone, Eq, PartialEq, Serialize, Deserialize, References, Destructure, Mutation,
)]
pub struct Book {
    id: BookId,
    title: BookTitle,
    author: BookAuthor,
    genre: BookGenre,
    status: BookStatus,
}

impl Book {
    pub fn new(
        id: BookId,
        title: BookTitle,
        author: BookAuthor,
        genre: BookGenre,
        status: BookStatus,
    ) -> Self {
        Self {
            id,
            title,
            author,
            genre,
            status,
        }
    }
}
