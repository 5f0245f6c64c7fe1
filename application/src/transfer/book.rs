use kernel::prelude::entity::{Book, BookStatus, DestructBook, SelectLimit, SelectOffset};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookDto {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub status: BookStatus,
}

impl From<Book> for BookDto {
    fn from(value: Book) -> Self {
        let DestructBook {
            id,
            title,
            author,
            genre,
            status,
        } = value.into_destruct();
        Self {
            id: id.into(),
            title: title.into(),
            author: author.into(),
            genre: genre.into(),
            status,
        }
    }
}

pub struct GetBookDto {
    pub id: i64,
}

#[derive(Debug, Default)]
pub struct GetAllBookDto {
    pub limit: SelectLimit,
    pub offset: SelectOffset,
}

pub struct GetBooksByAuthorDto {
    pub author: String,
}

pub struct GetBooksByTitleDto {
    pub title: String,
}

pub struct CreateBookDto {
    pub title: String,
    pub author: String,
    pub genre: String,
}

pub struct UpdateBookDto {
    pub id: i64,
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
}

pub struct DeleteBookDto {
    pub id: i64,
}
