pub mod get;
pub mod list;

pub use get::{GetPublishingHouseError, GetPublishingHouseQuery};
pub use list::{
    ListPublishingHousesError, ListPublishingHousesQuery, ListPublishingHousesResponse,
};
