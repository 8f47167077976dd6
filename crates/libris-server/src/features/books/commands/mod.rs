pub mod create;
pub mod delete;
pub mod update;

pub use create::{CreateBookCommand, CreateBookError};
pub use delete::{DeleteBookCommand, DeleteBookError, DeleteBookResponse};
pub use update::{UpdateBookCommand, UpdateBookError};
