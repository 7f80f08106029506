pub mod filter;
pub mod model;
pub mod store;
pub mod transition;

pub use filter::{filter, in_progress_vehicles, DeliveryFilter};
pub use model::{DeliveryRecord, Status, Stop};
pub use store::RouteDataStore;
pub use transition::StatusTransitionManager;
