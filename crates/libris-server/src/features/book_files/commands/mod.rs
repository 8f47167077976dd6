pub mod create;

pub use create::{CreateBookFileCommand, CreateBookFileError};
