pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::{CreateBookFileCommand, CreateBookFileError};
pub use queries::{GetBookFileError, GetBookFileQuery};
pub use routes::book_files_routes;
