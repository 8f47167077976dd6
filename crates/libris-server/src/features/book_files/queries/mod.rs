pub mod get;

pub use get::{GetBookFileError, GetBookFileQuery};
