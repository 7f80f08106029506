pub mod aggregation;
pub mod feed;

pub use aggregation::{dashboard, Dashboard};
pub use feed::{DashboardFeed, Slot};
