pub mod create;
pub mod delete;
pub mod update;

pub use create::{CreatePublishingHouseCommand, CreatePublishingHouseError};
pub use delete::{
    DeletePublishingHouseCommand, DeletePublishingHouseError, DeletePublishingHouseResponse,
};
pub use update::{UpdatePublishingHouseCommand, UpdatePublishingHouseError};
