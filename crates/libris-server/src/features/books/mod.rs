pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::{
    CreateBookCommand, CreateBookError, DeleteBookCommand, DeleteBookError, DeleteBookResponse,
    UpdateBookCommand, UpdateBookError,
};

pub use queries::{GetBookError, GetBookQuery, ListBooksError, ListBooksQuery, ListBooksResponse};

pub use routes::books_routes;
