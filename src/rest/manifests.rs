use crate::backend::Backend;
use crate::delivery::{in_progress_vehicles, RouteDataStore};
use crate::Result;
use actix_web::post;
use actix_web::web::{Bytes, Data, Json, Query};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Deserialize)]
pub struct PostArgs {
    pub file_name: String,
}

#[derive(Serialize, Deserialize)]
pub struct PostResponse {
    pub message: String,
    pub records: usize,
    pub routed_vehicles: Vec<i64>,
}

/// Request body is the raw CSV manifest.
#[post("")]
pub async fn post(
    args: Query<PostArgs>,
    body: Bytes,
    backend: Data<dyn Backend>,
    store: Data<RouteDataStore>,
) -> Result<Json<PostResponse>> {
    let message = backend.upload_manifest(&args.file_name, body.to_vec()).await?;
    let records = store.refresh().await?;
    let routed_vehicles = in_progress_vehicles(store.current().iter());
    info!(
        file_name = %args.file_name,
        records,
        routed_vehicles = routed_vehicles.len(),
        "Manifest processed"
    );
    Ok(Json(PostResponse {
        message,
        records,
        routed_vehicles,
    }))
}
