use crate::delivery::{filter, DeliveryFilter, RouteDataStore};
use crate::log::RequestExtension;
use crate::map::{image, project};
use crate::Result;
use actix_web::web::{Data, Query};
use actix_web::{get, HttpMessage, HttpRequest, HttpResponse};

#[get("")]
pub async fn get(
    req: HttpRequest,
    args: Query<DeliveryFilter>,
    store: Data<RouteDataStore>,
) -> Result<HttpResponse> {
    let snapshot = store.current();
    let view = project(filter(snapshot.iter(), &args));
    req.extensions_mut()
        .insert(RequestExtension::new(view.routes.len()));
    Ok(HttpResponse::Ok()
        .content_type("application/geo+json")
        .body(serde_json::to_string(&view.to_geojson())?))
}

#[get("preview.png")]
pub async fn get_preview(
    args: Query<DeliveryFilter>,
    store: Data<RouteDataStore>,
) -> Result<HttpResponse> {
    let snapshot = store.current();
    let view = project(filter(snapshot.iter(), &args));
    Ok(HttpResponse::Ok()
        .content_type("image/png")
        .body(image::preview_png(view).await?))
}
