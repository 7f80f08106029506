pub mod dashboard;
pub mod deliveries;
pub mod export;
pub mod manifests;
pub mod map;
