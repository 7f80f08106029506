use crate::backend::{Backend, BackendClient};
use crate::conf::Conf;
use crate::delivery::{RouteDataStore, StatusTransitionManager};
use crate::{error, log, rest, Result};
use actix_web::middleware::from_fn;
use actix_web::web::{scope, PayloadConfig, QueryConfig};
use actix_web::{
    middleware::{Compress, NormalizePath},
    web::Data,
    App, HttpServer,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

const MAX_MANIFEST_BYTES: usize = 16 * 1024 * 1024;

pub async fn run(conf: Conf) -> Result<()> {
    let backend: Arc<dyn Backend> = Arc::new(BackendClient::new(&conf)?);
    // All the worker threads are sharing a single snapshot
    let store = Arc::new(RouteDataStore::new(backend.clone()));
    if let Err(e) = store.load().await {
        warn!(error = e.to_string(), "Starting with an empty snapshot");
    }
    let mut snapshots = store.subscribe();
    actix_web::rt::spawn(async move {
        while snapshots.changed().await.is_ok() {
            let records = snapshots.borrow_and_update().len();
            debug!(records, "Snapshot committed");
        }
    });
    let transitions = Arc::new(StatusTransitionManager::new(
        store.clone(),
        backend.clone(),
        conf.request_timeout,
    ));

    info!(
        bind = conf.bind,
        port = conf.port,
        backend_url = conf.backend_url.as_str(),
        "Starting server"
    );

    HttpServer::new(move || {
        App::new()
            .wrap(from_fn(log::handle_request))
            .wrap(NormalizePath::trim())
            .wrap(Compress::default())
            .app_data(Data::from(backend.clone()))
            .app_data(Data::from(store.clone()))
            .app_data(Data::from(transitions.clone()))
            .app_data(QueryConfig::default().error_handler(error::query_error_handler))
            .app_data(PayloadConfig::new(MAX_MANIFEST_BYTES))
            .service(
                scope("deliveries")
                    .service(rest::deliveries::get)
                    .service(rest::deliveries::post_refresh)
                    .service(rest::deliveries::get_dates)
                    .service(rest::deliveries::get_in_progress_vehicles)
                    .service(rest::deliveries::get_vehicles)
                    .service(rest::deliveries::post_status),
            )
            .service(scope("dashboard").service(rest::dashboard::get))
            .service(
                scope("map")
                    .service(rest::map::get)
                    .service(rest::map::get_preview),
            )
            .service(scope("export").service(rest::export::get))
            .service(scope("manifests").service(rest::manifests::post))
    })
    .bind((conf.bind.clone(), conf.port))?
    .run()
    .await?;

    Ok(())
}
