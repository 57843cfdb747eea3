pub mod catalog;
pub mod identity;
pub mod incidents;

pub use catalog::CatalogService;
pub use identity::{IdentityService, UserInfo};
pub use incidents::IncidentService;
