use crate::dashboard::{dashboard, Dashboard};
use crate::delivery::model::picker_to_backend;
use crate::delivery::RouteDataStore;
use crate::Result;
use actix_web::get;
use actix_web::web::{Data, Json, Query};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct GetArgs {
    /// Date picker value, `YYYY-MM-DD`.
    pub date: Option<String>,
}

#[get("")]
pub async fn get(args: Query<GetArgs>, store: Data<RouteDataStore>) -> Result<Json<Dashboard>> {
    let date = match args.date.as_deref().map(str::trim) {
        Some(date) if !date.is_empty() => Some(picker_to_backend(date)?),
        _ => None,
    };
    let snapshot = store.current();
    Ok(Json(dashboard(snapshot.iter(), date.as_deref())))
}
