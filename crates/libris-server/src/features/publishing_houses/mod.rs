pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::{
    CreatePublishingHouseCommand, CreatePublishingHouseError, DeletePublishingHouseCommand,
    DeletePublishingHouseError, DeletePublishingHouseResponse, UpdatePublishingHouseCommand,
    UpdatePublishingHouseError,
};

pub use queries::{
    GetPublishingHouseError, GetPublishingHouseQuery, ListPublishingHousesError,
    ListPublishingHousesQuery, ListPublishingHousesResponse,
};

pub use routes::publishing_houses_routes;
