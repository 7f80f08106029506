pub mod client;
pub mod model;

pub use client::BackendClient;

use crate::delivery::{DeliveryRecord, Status};
use crate::{Error, Result};
use async_trait::async_trait;

/// Subset of the routing backend the snapshot pipeline depends on.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn fetch_deliveries(&self) -> Result<Vec<DeliveryRecord>>;

    /// Returns `false` when the backend declined the update.
    async fn update_delivery_status(&self, vehicle_id: i64, status: Status) -> Result<bool>;

    /// Hands a CSV manifest to the route optimizer, returns its message.
    async fn upload_manifest(&self, file_name: &str, bytes: Vec<u8>) -> Result<String>;

    async fn fetch_routed_deliveries(&self) -> Result<Vec<DeliveryRecord>>;
}

/// Manifests are checked locally before anything is sent.
pub fn validate_manifest(file_name: &str, bytes: &[u8]) -> Result<()> {
    if !file_name.to_lowercase().ends_with(".csv") {
        Err(Error::InvalidInput(format!(
            "Manifest must be a .csv file, got {file_name}"
        )))?
    }
    if bytes.is_empty() {
        Err(Error::InvalidInput("Manifest is empty".into()))?
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::validate_manifest;
    use crate::Error;

    #[test]
    fn manifest_must_be_non_empty_csv() {
        assert!(validate_manifest("routes.csv", b"a,b").is_ok());
        assert!(validate_manifest("ROUTES.CSV", b"a,b").is_ok());
        assert!(matches!(
            validate_manifest("routes.xlsx", b"a,b"),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            validate_manifest("routes.csv", b""),
            Err(Error::InvalidInput(_))
        ));
    }
}
