pub mod get;
pub mod list;

pub use get::{GetBookError, GetBookQuery};
pub use list::{ListBooksError, ListBooksQuery, ListBooksResponse};
