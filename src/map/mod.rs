pub mod image;
pub mod projection;

pub use projection::{project, MapView, RouteColor};
