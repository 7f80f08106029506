use crate::backend::{Backend, BackendClient};
use crate::conf::Conf;
use crate::delivery::in_progress_vehicles;
use crate::{Error, Result};
use std::path::Path;
use tracing::info;

pub async fn run(conf: &Conf, args: &[String]) -> Result<()> {
    let Some(path) = args.first() else {
        return Err(Error::Cli("Usage: upload <file.csv>".into()));
    };
    let path = Path::new(path);
    let file_name = path
        .file_name()
        .and_then(|it| it.to_str())
        .ok_or_else(|| Error::InvalidInput(format!("Invalid file: {}", path.display())))?;
    let bytes = std::fs::read(path)?;
    let client = BackendClient::new(conf)?;
    let message = client.upload_manifest(file_name, bytes).await?;
    info!(file_name, message, "Manifest uploaded");
    let routed = client.fetch_routed_deliveries().await?;
    for record in &routed {
        info!(
            vehicle_id = record.vehicle_id,
            date = %record.date,
            status = %record.status,
            stops = record.delivery_stops().count(),
            "Routed vehicle"
        );
    }
    info!(
        routes = routed.len(),
        in_progress_vehicles = ?in_progress_vehicles(&routed),
        "Route optimization finished"
    );
    Ok(())
}
